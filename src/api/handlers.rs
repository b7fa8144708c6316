//! API route handlers.
//!
//! Request handling is stateless beyond the shared, read-only advisory
//! composer: each advisory is a pure function of (request, loaded
//! artifacts), so handlers are safe under any concurrency.

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::error;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::advisor::AdvisoryComposer;
use crate::error::AdvisorError;
use crate::types::JourneyRequest;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub composer: AdvisoryComposer,
}

impl ApiState {
    pub fn new(composer: AdvisoryComposer) -> Self {
        Self { composer }
    }
}

// ============================================================================
// Advisory Endpoint
// ============================================================================

/// POST /api/v1/advisory — complete travel advisory for one journey.
pub async fn post_advisory(
    State(state): State<ApiState>,
    Json(request): Json<JourneyRequest>,
) -> Response {
    match state.composer.advise(&request) {
        Ok(advisory) => ApiResponse::ok(advisory),
        Err(err) => {
            if matches!(err, AdvisorError::Inference(_) | AdvisorError::Configuration(_)) {
                error!(error = %err, "advisory computation failed");
            }
            ApiErrorResponse::from_error(&err)
        }
    }
}

// ============================================================================
// Status & Health Endpoints
// ============================================================================

/// Model metadata surfaced to the dashboard.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub rush_features: Vec<String>,
    pub confirm_features: Vec<String>,
    pub booking_features: Vec<String>,
    /// (feature, weight) importance table of the rush classifier
    pub rush_feature_importance: Vec<(String, f64)>,
    /// Evaluation metrics of the producing training run, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_report: Option<crate::training::TrainingReport>,
}

/// GET /api/v1/status — loaded model metadata.
pub async fn get_status(State(state): State<ApiState>) -> Response {
    let ctx = state.composer.context();
    ApiResponse::ok(StatusResponse {
        rush_features: ctx.rush_features.clone(),
        confirm_features: ctx.confirm_features.clone(),
        booking_features: ctx.booking_features.clone(),
        rush_feature_importance: ctx.rush_feature_importance.clone(),
        training_report: ctx.report.clone(),
    })
}

/// GET /health — process liveness.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
