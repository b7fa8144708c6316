//! API route definitions.
//!
//! Endpoints:
//! - POST /api/v1/advisory — complete travel advisory
//! - GET  /api/v1/status   — loaded model metadata
//! - GET  /health          — process liveness (root level)

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Create all API routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/advisory", post(handlers::post_advisory))
        .route("/status", get(handlers::get_status))
        .with_state(state)
}

/// Root-level health endpoint.
pub fn legacy_routes() -> Router {
    Router::new().route("/health", get(handlers::health_check))
}
