//! Selection HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use pdfsvc_core::{CreateSelection, Selection, SelectionPatch};

use super::{ErrorResponse, SelectionCreated};
use crate::{ApiError, AppState};

#[utoipa::path(
    post,
    path = "/api/v1/selections",
    tag = "Selections",
    request_body = CreateSelection,
    responses(
        (status = 201, description = "Selection stored", body = SelectionCreated),
        (status = 400, description = "Invalid selection or unknown document", body = ErrorResponse)
    )
)]
pub async fn add_selection(
    State(state): State<AppState>,
    Json(body): Json<CreateSelection>,
) -> Result<(StatusCode, Json<SelectionCreated>), ApiError> {
    let selection_id = state.selections.add(body).await?;
    Ok((StatusCode::CREATED, Json(SelectionCreated { selection_id })))
}

#[utoipa::path(
    get,
    path = "/api/v1/selections/{id}",
    tag = "Selections",
    params(("id" = Uuid, Path, description = "Selection ID")),
    responses(
        (status = 200, description = "Selection", body = Selection),
        (status = 404, description = "Selection not found", body = ErrorResponse)
    )
)]
pub async fn get_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Selection>, ApiError> {
    Ok(Json(state.selections.get(id).await?))
}

/// Merge-patch a selection. The selection keeps its ID.
///
/// `selectionBounds: null` removes the geometry; `selectionBounds: {}` keeps
/// an empty index.
#[utoipa::path(
    patch,
    path = "/api/v1/selections/{id}",
    tag = "Selections",
    params(("id" = Uuid, Path, description = "Selection ID")),
    responses(
        (status = 204, description = "Selection updated"),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "Selection not found", body = ErrorResponse)
    )
)]
pub async fn update_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SelectionPatch>,
) -> Result<StatusCode, ApiError> {
    state.selections.update(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a selection. Succeeds when it does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/selections/{id}",
    tag = "Selections",
    params(("id" = Uuid, Path, description = "Selection ID")),
    responses((status = 204, description = "Selection deleted"))
)]
pub async fn delete_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.selections.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
