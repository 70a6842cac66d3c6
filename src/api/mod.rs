//! API handlers for Biblioteca REST endpoints

pub mod books;
pub mod entries;
mod extract;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, patch, post},
    Router,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token.
///
/// The token is read from a `Bearer` authorization header, falling back to
/// the session cookie when no such header is sent.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(rejection) if rejection.is_missing() => CookieJar::from_headers(&parts.headers)
                .get(&state.config.auth.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| AppError::Authentication("Missing authorization token".to_string()))?,
            Err(_) => {
                return Err(AppError::Authentication(
                    "Invalid authorization header format".to_string(),
                ))
            }
        };

        let claims = UserClaims::from_token(&token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/user", get(loans::get_my_loans))
        .route("/loans/calculate-fine", post(loans::calculate_fine))
        .route("/loans/:id/return", post(loans::return_loan))
        // Users
        .route("/users/register", post(users::register))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/loans", get(loans::get_user_loans))
        // Entries
        .route("/entries", get(entries::list_entries).post(entries::create_entry))
        .route("/entries/:id/exit", patch(entries::record_exit))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
