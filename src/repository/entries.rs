//! Entries repository

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        entry::{CreateEntry, Entry, EntryDetails},
        user::UserSummary,
    },
};

#[derive(Clone)]
pub struct EntriesRepository {
    pool: Pool<Postgres>,
}

impl EntriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get entry by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Entry> {
        sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Entry with id {} not found", id)))
    }

    /// List entries with visitor details, newest first, optionally for one user
    pub async fn list(&self, user_id: Option<i32>) -> AppResult<Vec<EntryDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.entry_time, e.exit_time, e.purpose, e.comments,
                   u.id AS user_id, u.name, u.email, u.matricula, u.career
            FROM entries e
            JOIN users u ON e.user_id = u.id
            WHERE $1::INTEGER IS NULL OR e.user_id = $1
            ORDER BY e.entry_time DESC, e.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_details).collect())
    }

    /// Open a visit; the entry time is the database clock
    pub async fn create(&self, user_id: i32, data: &CreateEntry) -> AppResult<Entry> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (user_id, purpose, comments)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.purpose)
        .bind(&data.comments)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Set the exit time unless it is already set.
    ///
    /// Returns `None` when another request recorded the exit first.
    pub async fn record_exit(&self, id: i32, exit_time: DateTime<Utc>) -> AppResult<Option<Entry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE entries SET exit_time = $2
            WHERE id = $1 AND exit_time IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(exit_time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Count visitors with no exit recorded
    pub async fn count_open(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE exit_time IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count visits started today (database time zone)
    pub async fn count_today(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE entry_time >= CURRENT_DATE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

fn entry_details(row: &PgRow) -> EntryDetails {
    EntryDetails {
        id: row.get("id"),
        entry_time: row.get("entry_time"),
        exit_time: row.get("exit_time"),
        purpose: row.get("purpose"),
        comments: row.get("comments"),
        user: UserSummary {
            id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            matricula: row.get("matricula"),
            career: row.get("career"),
        },
    }
}
