//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    /// Library catalog code
    pub catalog_code: String,
    pub title: String,
    pub author: String,
    pub classification: String,
    /// Campus unit where the book is shelved
    pub unit: i32,
    /// False while the book is lent out
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

/// Short book representation embedded in loans
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i32,
    pub catalog_code: String,
    pub title: String,
    pub author: String,
    pub classification: String,
}

/// Catalog filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive search in title and author
    pub search: Option<String>,
    /// Case-insensitive substring of the classification
    pub classification: Option<String>,
    /// Exact unit number
    pub unit: Option<i32>,
    /// Only available (true) or only lent out (false) books
    pub available: Option<bool>,
    /// Page number, starting at 1. Without it every match is returned.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Catalog code is required"))]
    pub catalog_code: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub classification: String,
    #[validate(range(min = 1, message = "Unit must be a positive number"))]
    pub unit: i32,
}
