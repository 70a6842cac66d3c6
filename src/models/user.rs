//! User model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    /// Student enrollment number
    pub matricula: Option<String>,
    pub career: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Short user representation embedded in loans and entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub matricula: Option<String>,
    pub career: Option<String>,
}

/// Self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub matricula: Option<String>,
    #[serde(alias = "carrera")]
    pub career: Option<String>,
}

impl RegisterUser {
    /// Only institutional addresses may register
    pub fn check_institution_domain(&self, domain: &str) -> Result<(), AppError> {
        let suffix = format!("@{}", domain.to_lowercase());
        if self.email.to_lowercase().ends_with(&suffix) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "An institutional email address (@{}) is required",
                domain
            )))
        }
    }
}

/// JWT claims issued by the credentials provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    /// User email
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user_id: i32, email: &str, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: email.to_string(),
            user_id,
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow access to a user's own resources, or to any resource for admins
    pub fn require_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Not allowed to access another user's records".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> RegisterUser {
        RegisterUser {
            name: "Ana García".to_string(),
            email: email.to_string(),
            password: "secreto123".to_string(),
            matricula: Some("19211235".to_string()),
            career: Some("Ingeniería en Sistemas".to_string()),
        }
    }

    #[test]
    fn test_institution_domain() {
        let domain = "tectijuana.edu.mx";
        assert!(registration("l19211235@tectijuana.edu.mx")
            .check_institution_domain(domain)
            .is_ok());
        assert!(registration("L19211235@TecTijuana.edu.mx")
            .check_institution_domain(domain)
            .is_ok());
        assert!(registration("ana@gmail.com").check_institution_domain(domain).is_err());
        assert!(registration("ana@tectijuana.edu.mx.evil.com")
            .check_institution_domain(domain)
            .is_err());
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let request: RegisterUser = serde_json::from_str(r#"{"email": "a@tectijuana.edu.mx"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_any_non_empty_password_accepted() {
        let mut request = registration("l19211235@tectijuana.edu.mx");
        request.password = "abc".to_string();
        assert!(request.validate().is_ok());

        request.password = String::new();
        assert!(request.validate().unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn test_claims_token() {
        let claims = UserClaims::new(7, "l19211235@tectijuana.edu.mx", Role::User, Duration::hours(1));
        let token = claims.create_token("secret").unwrap();

        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.role, Role::User);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = UserClaims::new(7, "a@tectijuana.edu.mx", Role::User, Duration::hours(-2));
        let token = claims.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_self_or_admin() {
        let user = UserClaims::new(7, "a@tectijuana.edu.mx", Role::User, Duration::hours(1));
        let admin = UserClaims::new(1, "b@tectijuana.edu.mx", Role::Admin, Duration::hours(1));

        assert!(user.require_self_or_admin(7).is_ok());
        assert!(matches!(user.require_self_or_admin(8), Err(AppError::Authorization(_))));
        assert!(admin.require_self_or_admin(8).is_ok());
        assert!(user.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    }
}
