//! Loans repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        loan::{FineAssessment, Loan, LoanDetails, LoanStatus},
        user::UserSummary,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.loan_date, l.due_date, l.returned_at, l.status, l.fine,
           b.id AS book_id, b.catalog_code, b.title, b.author, b.classification,
           u.id AS user_id, u.name AS user_name, u.email AS user_email,
           u.matricula, u.career
    FROM loans l
    JOIN books b ON l.book_id = b.id
    JOIN users u ON l.user_id = u.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// All loans, newest first
    pub async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!("{} ORDER BY l.loan_date DESC, l.id DESC", DETAILS_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| loan_details(row, true)).collect())
    }

    /// Loans of one user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.user_id = $1 ORDER BY l.loan_date DESC, l.id DESC",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| loan_details(row, false)).collect())
    }

    /// Loans of one user that are not returned yet
    pub async fn list_open_for_user(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE user_id = $1 AND returned_at IS NULL",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Create a loan and take the book off the shelf.
    ///
    /// The book row is locked for the duration of the transaction so two
    /// concurrent requests cannot both see it available.
    pub async fn create(
        &self,
        book_id: i32,
        user_id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let available: bool =
            sqlx::query_scalar("SELECT available FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if !available {
            return Err(AppError::NotAvailable(
                "The book is not available for loan".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, user_id, loan_date, due_date, status, fine)
            VALUES ($1, $2, NOW(), $3, $4, 0)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(due_date)
        .bind(LoanStatus::Active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // open-loan-per-book index
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::NotAvailable("The book is not available for loan".to_string())
            }
            other => AppError::Database(other),
        })?;

        sqlx::query("UPDATE books SET available = FALSE WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Persist a fine assessment. Returned loans are left untouched; returns
    /// false in that case.
    pub async fn update_assessment(&self, id: i32, assessment: &FineAssessment) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE loans SET fine = $2, status = $3 WHERE id = $1 AND status <> $4",
        )
        .bind(id)
        .bind(assessment.fine)
        .bind(assessment.status)
        .bind(LoanStatus::Returned)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Close a loan: freeze its fine and put the book back on the shelf
    pub async fn return_loan(
        &self,
        id: i32,
        now: DateTime<Utc>,
        daily_fine: Decimal,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;

        let closed = loan.close(now, daily_fine)?;

        let returned = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = $2, fine = $3, returned_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(closed.status)
        .bind(closed.fine)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(returned)
    }

    /// Count loans not yet returned
    pub async fn count_open(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count open loans past their due date, whatever their stored status
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE returned_at IS NULL AND due_date < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn loan_details(row: &PgRow, include_user: bool) -> LoanDetails {
    LoanDetails {
        id: row.get("id"),
        loan_date: row.get("loan_date"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        status: row.get("status"),
        fine: row.get("fine"),
        book: BookSummary {
            id: row.get("book_id"),
            catalog_code: row.get("catalog_code"),
            title: row.get("title"),
            author: row.get("author"),
            classification: row.get("classification"),
        },
        user: include_user.then(|| UserSummary {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
            matricula: row.get("matricula"),
            career: row.get("career"),
        }),
    }
}
