//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
};

/// Upper bound for `per_page`
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books matching the catalog filters, ordered by title
    pub async fn search(&self, query: &BookQuery, default_page_size: i64) -> AppResult<Vec<Book>> {
        let mut builder = search_query(query, default_page_size);
        let books = builder.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    /// Check if a catalog code is already used
    pub async fn catalog_code_exists(&self, catalog_code: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE catalog_code = $1)")
                .bind(catalog_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a new book, initially available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (catalog_code, title, author, classification, unit, available)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(&book.catalog_code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.classification)
        .bind(book.unit)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Catalog code already exists".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(created)
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books on the shelf
    pub async fn count_available(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE available")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Build the catalog SELECT for `query`
fn search_query(query: &BookQuery, default_page_size: i64) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM books WHERE TRUE");

    if let Some(search) = non_empty(&query.search) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(classification) = non_empty(&query.classification) {
        builder
            .push(" AND classification ILIKE ")
            .push_bind(format!("%{}%", escape_like(classification)));
    }

    if let Some(unit) = query.unit {
        builder.push(" AND unit = ").push_bind(unit);
    }

    if let Some(available) = query.available {
        builder.push(" AND available = ").push_bind(available);
    }

    builder.push(" ORDER BY title, id");

    if let Some(page) = query.page {
        let (per_page, offset) = page_window(page, query.per_page, default_page_size);
        builder
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
    }

    builder
}

/// LIMIT and OFFSET for a 1-based page. Pages past the end of the
/// addressable range saturate instead of overflowing.
fn page_window(page: i64, per_page: Option<i64>, default_page_size: i64) -> (i64, i64) {
    let per_page = per_page.unwrap_or(default_page_size).clamp(1, MAX_PAGE_SIZE);
    let offset = (page.max(1) - 1).saturating_mul(per_page);
    (per_page, offset)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
