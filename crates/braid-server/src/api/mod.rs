//! REST API module
//!
//! TigerStyle: Thin handlers over the pipeline; the error envelope is the
//! only way failures leave the process.

pub mod branches;
pub mod drift;

use crate::models::{ApiFailure, EmbeddingProbe, HealthResponse};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use braid_core::Error;
use braid_embed::EmbeddingService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // routing endpoint and its legacy alias
        .route("/messages", post(drift::route_message))
        .route("/drift/route", post(drift::route_message))
        // inspection surface
        .route(
            "/conversations/{conversation_id}/branches",
            get(branches::list_branches),
        )
        .route("/branches/{branch_id}/facts", get(branches::list_facts))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint, including an embedding sidecar probe
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let embedding = match state.embeddings().health().await {
        Ok(health) => EmbeddingProbe {
            reachable: true,
            model: Some(health.model),
            dimension: Some(health.dimension),
            error: None,
        },
        Err(err) => EmbeddingProbe {
            reachable: false,
            model: None,
            dimension: None,
            error: Some(err.to_string()),
        },
    };

    Json(HealthResponse {
        status: if embedding.reachable {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        embedding,
    })
}

/// API error type that converts to the `{success: false, error}` envelope
pub struct ApiError {
    status: StatusCode,
    body: ApiFailure,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiFailure::new(message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.body.error.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidInput { .. }
            | Error::NotFound { .. }
            | Error::InvalidConfiguration { .. } => StatusCode::BAD_REQUEST,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unavailable { .. }
            | Error::Timeout { .. }
            | Error::DimensionMismatch { .. }
            | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let err = ApiError::from(Error::invalid_input("content is required"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(Error::not_found("branch", "b-1"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(Error::unavailable("/embed", "refused"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(Error::timeout("drift_pipeline", 10_000));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = ApiError::bad_request("content is required");
        assert!(!err.body.success);
        assert_eq!(err.body.error.message, "content is required");
    }
}
