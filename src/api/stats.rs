//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::StatsResponse};

use super::AuthenticatedUser;

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = StatsResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_admin()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
