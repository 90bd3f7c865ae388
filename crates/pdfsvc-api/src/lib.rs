//! pdfsvc-api - HTTP transport for the PDF selection service.
//!
//! The router is built from an [`AppState`] holding the three aggregate
//! services, so the same routes run over PostgreSQL in production and over
//! the in-memory store in tests.

pub mod config;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use pdfsvc_core::{DocumentService, InMemoryStore, MetaDataService, SelectionService};
use pdfsvc_db::Database;

pub use config::{LogConfig, LogFormat, ServerConfig};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub meta_data: MetaDataService,
    pub selections: SelectionService,
    /// Present when backed by PostgreSQL; used by the health check.
    pub db: Option<Database>,
}

impl AppState {
    /// State backed by PostgreSQL repositories.
    pub fn from_database(db: Database) -> Self {
        let (documents, meta_data, selections) = db.services();
        Self {
            documents,
            meta_data,
            selections,
            db: Some(db),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            documents: DocumentService::new(store.clone(), store.clone(), store.clone()),
            meta_data: MetaDataService::new(store.clone(), store.clone()),
            selections: SelectionService::new(store.clone(), store),
            db: None,
        }
    }
}

// =============================================================================
// OPENAPI
// =============================================================================

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PDF Selection Service API",
        description = "Upload PDF documents, attach metadata, and manage region-of-interest selections"
    ),
    paths(
        handlers::health_check,
        handlers::ping,
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::delete_document,
        handlers::documents::list_document_selections,
        handlers::meta_data::add_meta_data,
        handlers::meta_data::get_meta_data,
        handlers::meta_data::update_meta_data,
        handlers::meta_data::delete_meta_data,
        handlers::selections::add_selection,
        handlers::selections::get_selection,
        handlers::selections::update_selection,
        handlers::selections::delete_selection,
    ),
    components(schemas(
        pdfsvc_core::Document,
        pdfsvc_core::DocumentSummary,
        pdfsvc_core::UploadDocument,
        pdfsvc_core::MetaData,
        pdfsvc_core::CreateMetaData,
        pdfsvc_core::Selection,
        pdfsvc_core::CreateSelection,
        pdfsvc_core::SelectionBound,
        pdfsvc_core::BoundsIndex,
        handlers::DocumentCreated,
        handlers::MetaDataCreated,
        handlers::SelectionCreated,
        handlers::DeleteResponse,
        handlers::PingResponse,
        handlers::HealthResponse,
        handlers::ErrorResponse,
    )),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Documents", description = "Document upload and retrieval"),
        (name = "MetaData", description = "Document metadata"),
        (name = "Selections", description = "Regions of interest on a document")
    )
)]
pub struct ApiDoc;

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router.
pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    use handlers::{documents, meta_data, selections};

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/ping", get(handlers::ping))
        // Documents
        .route(
            "/api/v1/documents",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route(
            "/api/v1/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route(
            "/api/v1/documents/:id/selections",
            get(documents::list_document_selections),
        )
        // Metadata
        .route("/api/v1/meta", axum::routing::post(meta_data::add_meta_data))
        .route(
            "/api/v1/meta/:id",
            get(meta_data::get_meta_data)
                .patch(meta_data::update_meta_data)
                .delete(meta_data::delete_meta_data),
        )
        // Selections
        .route(
            "/api/v1/selections",
            axum::routing::post(selections::add_selection),
        )
        .route(
            "/api/v1/selections/:id",
            get(selections::get_selection)
                .patch(selections::update_selection)
                .delete(selections::delete_selection),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins(
                    &config.allowed_origins,
                )))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        // Size limit is enforced by the tower layer, not by axum's 2 MB extractor default.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}

/// Parse configured CORS origins, dropping entries that are not valid header values.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "cors",
                    origin = %origin,
                    error = %e,
                    "Ignoring invalid CORS origin"
                );
                None
            }
        })
        .collect()
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(pdfsvc_core::Error),
}

impl From<pdfsvc_core::Error> for ApiError {
    fn from(err: pdfsvc_core::Error) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else if matches!(err, pdfsvc_core::Error::Conflict(_)) {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::Internal(err)
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if let ApiError::Internal(ref err) = self {
            error!(
                subsystem = "api",
                component = "error",
                error = %err,
                "Request failed"
            );
        }

        let body = Json(handlers::ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
