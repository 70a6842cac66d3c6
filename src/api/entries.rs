//! Entry/exit log endpoints

use axum::{extract::State, http::StatusCode};

use crate::{
    error::AppResult,
    models::entry::{CreateEntry, Entry, EntryDetails, EntryQuery},
};

use super::{
    extract::{Json, Path, Query},
    AuthenticatedUser,
};

/// Register entering the library
#[utoipa::path(
    post,
    path = "/entries",
    tag = "entries",
    security(("bearer_auth" = [])),
    request_body = CreateEntry,
    responses(
        (status = 201, description = "Entry recorded", body = Entry),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_entry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEntry>,
) -> AppResult<(StatusCode, Json<Entry>)> {
    let entry = state.services.entries.record_entry(&claims, data).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List entries
#[utoipa::path(
    get,
    path = "/entries",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(EntryQuery),
    responses(
        (status = 200, description = "Entries, newest first", body = Vec<EntryDetails>),
        (status = 403, description = "Not allowed to list another user's entries")
    )
)]
pub async fn list_entries(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EntryQuery>,
) -> AppResult<Json<Vec<EntryDetails>>> {
    let entries = state.services.entries.list(&claims, &query).await?;
    Ok(Json(entries))
}

/// Register leaving the library
#[utoipa::path(
    patch,
    path = "/entries/{id}/exit",
    tag = "entries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Exit recorded", body = Entry),
        (status = 400, description = "Exit already recorded"),
        (status = 403, description = "Not the visitor and not an admin"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn record_exit(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Entry>> {
    let entry = state.services.entries.record_exit(&claims, id).await?;
    Ok(Json(entry))
}
