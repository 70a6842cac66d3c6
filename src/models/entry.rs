//! Entry/exit log of physical library visits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::{UserClaims, UserSummary};
use crate::error::AppError;

/// Entry record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i32,
    pub user_id: i32,
    pub entry_time: DateTime<Utc>,
    /// Set once when the visitor leaves
    pub exit_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
    pub comments: Option<String>,
}

impl Entry {
    /// Check that `claims` may close this visit
    pub fn check_exit(&self, claims: &UserClaims) -> Result<(), AppError> {
        if self.user_id != claims.user_id && !claims.is_admin() {
            return Err(AppError::Authorization(
                "Not allowed to modify this entry".to_string(),
            ));
        }

        if self.exit_time.is_some() {
            return Err(AppError::BadRequest("Exit already recorded".to_string()));
        }

        Ok(())
    }
}

/// Entry with visitor details, for listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetails {
    pub id: i32,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub purpose: Option<String>,
    pub comments: Option<String>,
    pub user: UserSummary,
}

/// Create entry request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateEntry {
    #[validate(length(max = 200, message = "Purpose is too long"))]
    pub purpose: Option<String>,
    #[validate(length(max = 1000, message = "Comments are too long"))]
    pub comments: Option<String>,
}

/// Query parameters for entry listings
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EntryQuery {
    /// Restrict to one visitor
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
}
