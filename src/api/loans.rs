//! Loan management endpoints

use axum::{extract::State, http::StatusCode};

use crate::{
    error::AppResult,
    models::loan::{CalculateFine, CreateLoan, FineResponse, Loan, LoanDetails},
};

use super::{
    extract::{Json, Path},
    AuthenticatedUser,
};

/// Create a new loan (borrow a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Book not available or invalid due date"),
        (status = 403, description = "Cannot borrow on behalf of another user"),
        (status = 404, description = "User or book not found")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_self_or_admin(request.user_id)?;

    let loan = state.services.loans.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// List every loan
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans, newest first", body = Vec<LoanDetails>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_admin()?;

    let loans = state.services.loans.list_loans().await?;
    Ok(Json(loans))
}

/// Get the caller's loans
#[utoipa::path(
    get,
    path = "/loans/user",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's loans with up to date fines", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.get_user_loans(claims.user_id).await?;
    Ok(Json(loans))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans with up to date fines", body = Vec<LoanDetails>),
        (status = 403, description = "Not the user and not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_self_or_admin(user_id)?;

    let loans = state.services.loans.get_user_loans(user_id).await?;
    Ok(Json(loans))
}

/// Recompute the fine of a loan
#[utoipa::path(
    post,
    path = "/loans/calculate-fine",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CalculateFine,
    responses(
        (status = 200, description = "Current fine", body = FineResponse),
        (status = 403, description = "Not the borrower and not an admin"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn calculate_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CalculateFine>,
) -> AppResult<Json<FineResponse>> {
    let loan = state.services.loans.get_loan(request.loan_id).await?;
    claims.require_self_or_admin(loan.user_id)?;

    let fine = state.services.loans.calculate_fine(&loan).await?;
    Ok(Json(fine))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine frozen", body = Loan),
        (status = 400, description = "Already returned"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    claims.require_admin()?;

    let loan = state.services.loans.return_loan(loan_id).await?;
    Ok(Json(loan))
}
