//! Catalog management service

use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query, self.config.page_size).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;

        if self.repository.books.catalog_code_exists(&book.catalog_code).await? {
            return Err(AppError::Conflict("Catalog code already exists".to_string()));
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Catalog: added book id={} code={}", created.id, created.catalog_code);
        Ok(created)
    }
}
