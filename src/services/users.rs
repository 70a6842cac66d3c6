//! User registration and lookup service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::UsersConfig,
    error::{AppError, AppResult},
    models::user::{RegisterUser, Role, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: UsersConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: UsersConfig) -> Self {
        Self { repository, config }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Self-registration of a student or staff member
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;
        request.check_institution_domain(&self.config.institution_domain)?;

        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password = hash_password(&request.password)?;
        let user = self.repository.users.create(&request, &password, Role::User).await?;

        tracing::info!("Registered user id={} ({})", user.id, user.email);
        Ok(user)
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
