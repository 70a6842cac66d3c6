//! Dashboard statistics service

use crate::{error::AppResult, models::stats::StatsResponse, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Collect dashboard counters
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let repo = &self.repository;

        let (
            total_users,
            total_books,
            available_books,
            active_loans,
            overdue_loans,
            open_entries,
            entries_today,
        ) = tokio::try_join!(
            repo.users.count(),
            repo.books.count(),
            repo.books.count_available(),
            repo.loans.count_open(),
            repo.loans.count_overdue(),
            repo.entries.count_open(),
            repo.entries.count_today(),
        )?;

        Ok(StatsResponse {
            total_users,
            total_books,
            available_books,
            active_loans,
            overdue_loans,
            open_entries,
            entries_today,
        })
    }
}
