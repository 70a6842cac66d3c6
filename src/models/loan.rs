//! Loan model, status lifecycle and fine assessment

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use super::{book::BookSummary, user::UserSummary};
use crate::error::AppError;

/// Loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    /// Lent out, not yet past the due date
    #[serde(rename = "ACTIVO")]
    Active,
    /// Book is back; the fine is frozen
    #[serde(rename = "DEVUELTO")]
    Returned,
    /// Lent out and past the due date
    #[serde(rename = "VENCIDO")]
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVO",
            LoanStatus::Returned => "DEVUELTO",
            LoanStatus::Overdue => "VENCIDO",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVO" => Ok(LoanStatus::Active),
            "DEVUELTO" => Ok(LoanStatus::Returned),
            "VENCIDO" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub fine: Decimal,
}

/// Result of evaluating a loan against the clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineAssessment {
    pub days_late: i64,
    pub fine: Decimal,
    pub status: LoanStatus,
}

/// Whole days elapsed past `due_date`, never negative
pub fn days_late(due_date: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at - due_date).num_days().max(0)
}

impl Loan {
    /// Evaluate the fine owed at `now`. Returned loans keep their stored fine.
    pub fn assess_fine(&self, now: DateTime<Utc>, daily_fine: Decimal) -> FineAssessment {
        if self.status == LoanStatus::Returned {
            return FineAssessment {
                days_late: self
                    .returned_at
                    .map(|at| days_late(self.due_date, at))
                    .unwrap_or(0),
                fine: self.fine,
                status: LoanStatus::Returned,
            };
        }

        let days_late = days_late(self.due_date, now);
        FineAssessment {
            days_late,
            fine: Decimal::from(days_late) * daily_fine,
            status: if days_late > 0 {
                LoanStatus::Overdue
            } else {
                LoanStatus::Active
            },
        }
    }

    /// Assessment to persist when the book comes back at `now`
    pub fn close(&self, now: DateTime<Utc>, daily_fine: Decimal) -> Result<FineAssessment, AppError> {
        if self.status == LoanStatus::Returned {
            return Err(AppError::BadRequest("Loan already returned".to_string()));
        }

        let assessment = self.assess_fine(now, daily_fine);
        Ok(FineAssessment {
            status: LoanStatus::Returned,
            ..assessment
        })
    }

    /// Whether the stored fine/status lag behind `assessment`
    pub fn is_stale(&self, assessment: &FineAssessment) -> bool {
        self.fine != assessment.fine || self.status != assessment.status
    }
}

/// Loan with book and borrower details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub fine: Decimal,
    pub book: BookSummary,
    pub user: Option<UserSummary>,
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    pub book_id: i32,
    pub user_id: i32,
    /// Due date: RFC 3339 timestamp or `YYYY-MM-DD`
    #[serde(rename = "fechaDevolucion", alias = "dueDate")]
    pub due_date: Option<String>,
}

/// Parse a due date given either as a timestamp or as a calendar day
/// (midnight UTC)
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Invalid due date: {}", value)))
}

/// Fine calculation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFine {
    pub loan_id: i32,
}

/// Fine calculation result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FineResponse {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub fine: Decimal,
    pub days_late: i64,
    pub status: LoanStatus,
}
