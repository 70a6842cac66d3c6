//! Loan management service

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::loan::{parse_due_date, CreateLoan, FineResponse, Loan, LoanDetails, LoanStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Get a loan by ID
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<Loan> {
        self.repository.loans.get_by_id(loan_id).await
    }

    /// All loans (admin listing)
    pub async fn list_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_all().await
    }

    /// Get loans for a user, with fines brought up to date
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;

        self.refresh_user_fines(user_id).await?;
        self.repository.loans.list_for_user(user_id).await
    }

    /// Create a new loan (borrow a book)
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<Loan> {
        let user = self.repository.users.get_by_id(request.user_id).await?;
        if !user.is_active {
            return Err(AppError::Authorization("User account is inactive".to_string()));
        }

        let due_date = match request.due_date.as_deref() {
            Some(value) => parse_due_date(value)?,
            None => Utc::now() + Duration::days(self.config.default_duration_days),
        };

        let loan = self
            .repository
            .loans
            .create(request.book_id, request.user_id, due_date)
            .await
            .map_err(|e| {
                if let AppError::NotAvailable(_) = e {
                    tracing::warn!(
                        "Loan refused: book id={} is not available (user id={})",
                        request.book_id,
                        request.user_id
                    );
                }
                e
            })?;

        tracing::info!(
            "Loan id={} created: book id={} to user id={}, due {}",
            loan.id,
            loan.book_id,
            loan.user_id,
            loan.due_date
        );

        Ok(loan)
    }

    /// Recompute and persist the fine of a loan
    pub async fn calculate_fine(&self, loan: &Loan) -> AppResult<FineResponse> {
        let now = Utc::now();
        let assessment = loan.assess_fine(now, self.config.daily_fine);

        if loan.status == LoanStatus::Returned {
            return Ok(returned_response(loan, now, self.config.daily_fine));
        }

        if loan.is_stale(&assessment)
            && !self.repository.loans.update_assessment(loan.id, &assessment).await?
        {
            // returned while we were computing; report the frozen state
            let current = self.repository.loans.get_by_id(loan.id).await?;
            return Ok(returned_response(&current, now, self.config.daily_fine));
        }

        if assessment.status != loan.status {
            tracing::info!(
                "Loan id={} is now {} ({} days late, fine {})",
                loan.id,
                assessment.status,
                assessment.days_late,
                assessment.fine
            );
        }

        Ok(FineResponse {
            message: "Fine calculated".to_string(),
            fine: assessment.fine,
            days_late: assessment.days_late,
            status: assessment.status,
        })
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<Loan> {
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, Utc::now(), self.config.daily_fine)
            .await?;

        tracing::info!(
            "Loan id={} returned: book id={} back on the shelf, fine {}",
            loan.id,
            loan.book_id,
            loan.fine
        );

        Ok(loan)
    }

    /// Bring stored fines and statuses of a user's open loans up to date
    async fn refresh_user_fines(&self, user_id: i32) -> AppResult<()> {
        let now = Utc::now();

        for loan in self.repository.loans.list_open_for_user(user_id).await? {
            let assessment = loan.assess_fine(now, self.config.daily_fine);
            if loan.is_stale(&assessment) {
                tracing::debug!(
                    "Refreshing loan id={}: {} -> {}, fine {}",
                    loan.id,
                    loan.status,
                    assessment.status,
                    assessment.fine
                );
                self.repository.loans.update_assessment(loan.id, &assessment).await?;
            }
        }

        Ok(())
    }
}

fn returned_response(loan: &Loan, now: DateTime<Utc>, daily_fine: Decimal) -> FineResponse {
    let assessment = loan.assess_fine(now, daily_fine);
    FineResponse {
        message: "Loan already returned".to_string(),
        fine: assessment.fine,
        days_late: assessment.days_late,
        status: assessment.status,
    }
}
