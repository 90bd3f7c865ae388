//! Document metadata HTTP handlers.
//!
//! Metadata is addressed by its document's ID.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use pdfsvc_core::{CreateMetaData, MetaData, MetaDataPatch};

use super::{ErrorResponse, MetaDataCreated};
use crate::{ApiError, AppState};

#[utoipa::path(
    post,
    path = "/api/v1/meta",
    tag = "MetaData",
    request_body = CreateMetaData,
    responses(
        (status = 201, description = "Metadata stored", body = MetaDataCreated),
        (status = 400, description = "Invalid attributes or unknown document", body = ErrorResponse),
        (status = 409, description = "Document already has metadata", body = ErrorResponse)
    )
)]
pub async fn add_meta_data(
    State(state): State<AppState>,
    Json(body): Json<CreateMetaData>,
) -> Result<(StatusCode, Json<MetaDataCreated>), ApiError> {
    let meta_id = state.meta_data.add(body).await?;
    Ok((StatusCode::CREATED, Json(MetaDataCreated { meta_id })))
}

#[utoipa::path(
    get,
    path = "/api/v1/meta/{id}",
    tag = "MetaData",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Metadata", body = MetaData),
        (status = 404, description = "No metadata for this document", body = ErrorResponse)
    )
)]
pub async fn get_meta_data(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MetaData>, ApiError> {
    Ok(Json(state.meta_data.get(id).await?))
}

/// Merge-patch metadata. Omitted attributes are kept, `null` clears one.
#[utoipa::path(
    patch,
    path = "/api/v1/meta/{id}",
    tag = "MetaData",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Metadata updated"),
        (status = 400, description = "Invalid attributes", body = ErrorResponse),
        (status = 404, description = "No metadata for this document", body = ErrorResponse)
    )
)]
pub async fn update_meta_data(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MetaDataPatch>,
) -> Result<StatusCode, ApiError> {
    state.meta_data.update(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete metadata. Succeeds when none exists.
#[utoipa::path(
    delete,
    path = "/api/v1/meta/{id}",
    tag = "MetaData",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses((status = 204, description = "Metadata deleted"))
)]
pub async fn delete_meta_data(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.meta_data.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
