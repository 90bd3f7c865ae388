//! HTTP handlers, grouped by resource.
//!
//! System endpoints and shared response bodies live here.

pub mod documents;
pub mod meta_data;
pub mod selections;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppState;

/// Body returned after a document upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentCreated {
    #[serde(rename = "documentUUID")]
    pub document_id: Uuid,
}

/// Body returned after metadata creation. The key is the document ID.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetaDataCreated {
    #[serde(rename = "metaUUID")]
    pub meta_id: Uuid,
}

/// Body returned after selection creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectionCreated {
    #[serde(rename = "selectionUUID")]
    pub selection_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    pub version: String,
}

/// Error body for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Liveness check. With PostgreSQL behind the service, also pings the database.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Storage unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => {
                pdfsvc_db::log_pool_metrics(db.pool());
                true
            }
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "health",
                    error = %e,
                    "Database ping failed"
                );
                false
            }
        },
        None => true,
    };

    let (status, label) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tag = "System",
    responses((status = 200, description = "Pong", body = PingResponse))
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}
