//! HTTP surface for the choretender sync server.
//!
//! Every data route resolves its sync identifier from the `X-Sync-Id`
//! header via middleware; handlers receive it as a request extension and
//! never parse headers themselves.

mod routes;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ops::{InstanceService, OpError};

/// Header carrying the sync identifier.
pub const SYNC_ID_HEADER: &str = "x-sync-id";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InstanceService>,
}

/// The resolved sync identifier, added to request extensions by middleware.
#[derive(Debug, Clone)]
pub struct SyncId(pub String);

/// Machine-readable error body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for OpError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            OpError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            OpError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            OpError::Storage(e) => {
                tracing::error!("storage failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_failure")
            }
        };
        let message = match &self {
            // Don't leak backend detail to clients.
            OpError::Storage(_) => "the backing store failed".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Resolves the sync identifier or rejects the request.
async fn sync_id_middleware(mut request: Request, next: Next) -> Response {
    let sync_id = request
        .headers()
        .get(SYNC_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    match sync_id {
        Some(sync_id) => {
            request.extensions_mut().insert(SyncId(sync_id));
            next.run(request).await
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "missing_sync_id",
                message: format!("the {} header is required", SYNC_ID_HEADER),
            }),
        )
            .into_response(),
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no sync id required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let data_routes = routes::router().layer(middleware::from_fn(sync_id_middleware));

    Router::new()
        .merge(public_routes)
        .merge(data_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
