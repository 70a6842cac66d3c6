//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, entries, health, loans, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblioteca API",
        version = "1.0.0",
        description = "University library REST API: catalog, loans, fines and visit log"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        books::list_books,
        books::get_book,
        books::create_book,
        // Loans
        loans::create_loan,
        loans::list_loans,
        loans::get_my_loans,
        loans::get_user_loans,
        loans::calculate_fine,
        loans::return_loan,
        // Users
        users::register,
        users::get_user,
        // Entries
        entries::create_entry,
        entries::list_entries,
        entries::record_exit,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Catalog
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::RegisterUser,
            crate::models::user::Role,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::CalculateFine,
            crate::models::loan::FineResponse,
            // Entries
            crate::models::entry::Entry,
            crate::models::entry::EntryDetails,
            crate::models::entry::CreateEntry,
            // Stats
            crate::models::stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog search and management"),
        (name = "loans", description = "Loans and fines"),
        (name = "users", description = "User registration and profiles"),
        (name = "entries", description = "Library entry and exit log"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
