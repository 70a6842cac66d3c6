//! Business logic services

pub mod catalog;
pub mod entries;
pub mod loans;
pub mod stats;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub entries: entries::EntriesService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.clone()),
            loans: loans::LoansService::new(repository.clone(), config.loans.clone()),
            entries: entries::EntriesService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), config.users.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
