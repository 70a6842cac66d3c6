//! Entry/exit logging service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        entry::{CreateEntry, Entry, EntryDetails, EntryQuery},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EntriesService {
    repository: Repository,
}

impl EntriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register the caller entering the library
    pub async fn record_entry(&self, claims: &UserClaims, data: CreateEntry) -> AppResult<Entry> {
        data.validate()?;

        let entry = self.repository.entries.create(claims.user_id, &data).await?;
        tracing::info!("Entry id={} opened for user id={}", entry.id, entry.user_id);
        Ok(entry)
    }

    /// List entries visible to the caller.
    ///
    /// Admins see everybody's visits unless `userId` narrows the list;
    /// other users only ever see their own.
    pub async fn list(&self, claims: &UserClaims, query: &EntryQuery) -> AppResult<Vec<EntryDetails>> {
        let user_id = match query.user_id {
            Some(user_id) => {
                claims.require_self_or_admin(user_id)?;
                Some(user_id)
            }
            None if claims.is_admin() => None,
            None => Some(claims.user_id),
        };

        self.repository.entries.list(user_id).await
    }

    /// Register the exit of a visit. The exit time can only be set once.
    pub async fn record_exit(&self, claims: &UserClaims, entry_id: i32) -> AppResult<Entry> {
        let entry = self.repository.entries.get_by_id(entry_id).await?;
        entry.check_exit(claims)?;

        let updated = self
            .repository
            .entries
            .record_exit(entry_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::BadRequest("Exit already recorded".to_string()))?;

        tracing::info!("Entry id={} closed for user id={}", updated.id, updated.user_id);
        Ok(updated)
    }
}
