//! Composed advisory output types.
//!
//! The `Advisory` is the complete output of one request's pipeline run.
//! It is built fresh per request and never stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::journey::{Festival, Quota, RushLevel, TrainClass, TrainType};

/// Echo of the requested route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
}

/// Echo of the requested train details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainDetails {
    pub class: TrainClass,
    #[serde(rename = "type")]
    pub train_type: TrainType,
    pub quota: Quota,
}

/// Rush classifier output block.
///
/// `top_factors` is the fixed-at-training-time importance ranking of the
/// rush model, not per-example attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RushAnalysis {
    pub rush_level: RushLevel,
    /// Max class probability, rounded to 3 decimals
    pub confidence: f64,
    /// Human-readable names of the 4 most important model features
    pub top_factors: Vec<String>,
    /// Per-class probability, rounded to 3 decimals (sums to ~1)
    pub probabilities: BTreeMap<String, f64>,
}

/// Recommended booking window in days before the festival.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookingWindow {
    pub optimal_min: i64,
    pub optimal_max: i64,
    pub recommended: i64,
}

/// Complete travel advisory for one journey request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    pub route: RouteInfo,
    pub festival: Festival,
    pub days_before_festival: u32,
    pub rush_analysis: RushAnalysis,
    /// Absent (not zero) when the traveler is not waitlisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_probability: Option<f64>,
    pub optimal_booking_window: BookingWindow,
    /// Ordered advice strings; the first entry is always rush-level advice
    pub recommendations: Vec<String>,
    pub train_details: TrainDetails,
}
