//! Document HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use pdfsvc_core::{Document, DocumentSummary, Selection, UploadDocument};

use super::{DeleteResponse, DocumentCreated, ErrorResponse};
use crate::{ApiError, AppState};

/// Upload a base64-encoded PDF.
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    tag = "Documents",
    request_body = UploadDocument,
    responses(
        (status = 201, description = "Document stored", body = DocumentCreated),
        (status = 400, description = "Payload is not valid base64 or is empty", body = ErrorResponse)
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    Json(body): Json<UploadDocument>,
) -> Result<(StatusCode, Json<DocumentCreated>), ApiError> {
    let document_id = state.documents.upload(&body.document_base64_string).await?;
    Ok((StatusCode::CREATED, Json(DocumentCreated { document_id })))
}

/// List documents, newest first, without their payloads.
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    tag = "Documents",
    responses((status = 200, description = "Document summaries", body = Vec<DocumentSummary>))
)]
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
    Ok(Json(state.documents.list().await?))
}

/// Get a document with its metadata and selections.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.documents.get(id).await?))
}

/// Delete a document together with its metadata and selections.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted", body = DeleteResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.documents.delete(id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Selections of a document in creation order.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/selections",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Selections", body = Vec<Selection>),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn list_document_selections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Selection>>, ApiError> {
    Ok(Json(state.selections.list_for_document(id).await?))
}
