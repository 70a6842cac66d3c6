//! Dashboard counters

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_books: i64,
    pub available_books: i64,
    /// Loans not yet returned
    pub active_loans: i64,
    /// Loans not yet returned and past their due date
    pub overdue_loans: i64,
    /// Visitors currently inside
    pub open_entries: i64,
    pub entries_today: i64,
}
