//! Advisory composer: orchestrates the model trio into one combined
//! recommendation for a journey request.
//!
//! Per-request steps, strictly ordered, none skipped silently:
//! 1. derive `historical_rush_index` when not supplied (serve-time
//!    heuristic — NOT the generator's label formula; see below)
//! 2. approximate `peak_day_proximity` when not supplied
//! 3. rush classifier → rush analysis block
//! 4. confirmation regressor, only when waitlisted
//! 5. booking-window regressor → symmetric ±5 day band
//! 6. rule-based recommendation strings in fixed order
//! 7. assemble the Advisory
//!
//! The computation is a pure function of (request, loaded context); no
//! shared mutable state exists across requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::artifacts::InferenceContext;
use crate::encoding::{self, RawValue};
use crate::error::AdvisorError;
use crate::model::{Classifier, Regressor};
use crate::types::{
    Advisory, BookingWindow, Festival, JourneyRequest, RouteInfo, RushAnalysis, RushLevel,
    TrainClass, TrainDetails,
};

// ============================================================================
// Advice Thresholds
// ============================================================================

/// Below this confirmation probability, advise looking at alternatives.
pub const LOW_CONFIRMATION_THRESHOLD: f64 = 0.3;
/// Below this, advise keeping backup plans.
pub const MODERATE_CONFIRMATION_THRESHOLD: f64 = 0.7;
/// Number of top importance factors surfaced per rush analysis.
const TOP_FACTOR_COUNT: usize = 4;

// ============================================================================
// Serve-Time Rush Heuristic
// ============================================================================

/// Fallback demand-pressure estimate used when the request carries no
/// `historical_rush_index`.
///
/// This is a different heuristic from the generator's label formula —
/// different weights (0.5 festival / 0.3 class, distance capped at 20,
/// tier term ×3) and no time component. The two are deliberately kept as
/// two named functions; unifying them would shift output distributions.
/// Values outside the tables default to 70.
pub fn estimate_historical_rush(
    festival: Festival,
    distance_km: f64,
    source_tier: u8,
    destination_tier: u8,
    train_class: TrainClass,
) -> f64 {
    let festival_weight = match festival {
        Festival::Diwali => 95.0,
        Festival::ChhathPuja => 90.0,
        Festival::DurgaPuja => 85.0,
        Festival::EidUlFitr => 80.0,
        Festival::Holi => 75.0,
        Festival::Christmas => 70.0,
        Festival::Pongal => 72.0,
    };
    let class_weight = match train_class {
        TrainClass::General => 85.0,
        TrainClass::Sleeper => 80.0,
        TrainClass::ThreeAc => 70.0,
        TrainClass::TwoAc => 60.0,
        TrainClass::FirstAc => 50.0,
    };

    let distance_factor = (distance_km / 100.0).min(20.0);
    let tier_factor =
        f64::from(4 - source_tier.min(3) + 4 - destination_tier.min(3)) * 3.0;

    (festival_weight * 0.5 + class_weight * 0.3 + distance_factor + tier_factor).min(100.0)
}

/// Proximity approximation when the request does not supply one:
/// `max(0, 5 - |days_before_festival - 3|)`.
pub fn approximate_peak_day_proximity(days_before_festival: u32) -> f64 {
    (5.0 - (f64::from(days_before_festival) - 3.0).abs()).max(0.0)
}

// ============================================================================
// Composer
// ============================================================================

/// Composes the model trio into complete advisories.
///
/// Holds a shared, immutable [`InferenceContext`]; safe for concurrent
/// use from any number of request handlers.
#[derive(Clone)]
pub struct AdvisoryComposer {
    context: Arc<InferenceContext>,
}

impl AdvisoryComposer {
    pub fn new(context: Arc<InferenceContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &InferenceContext {
        &self.context
    }

    /// Full advisory for one validated request.
    pub fn advise(&self, request: &JourneyRequest) -> Result<Advisory, AdvisorError> {
        request.validate()?;

        // Step 1: demand pressure, estimated when absent
        let rush_index = request.historical_rush_index.unwrap_or_else(|| {
            estimate_historical_rush(
                request.festival,
                request.route_distance_km,
                request.source_city_tier,
                request.destination_city_tier,
                request.train_class,
            )
        });

        // Step 2: peak proximity, approximated when absent
        let proximity = request
            .peak_day_proximity
            .unwrap_or_else(|| approximate_peak_day_proximity(request.days_before_festival));

        // Step 3: rush classification
        let rush_analysis = self.predict_rush_level(request, rush_index, proximity)?;

        // Step 4: confirmation probability, only meaningful when waitlisted.
        // Absence signals "not applicable", distinct from a 0% chance.
        let confirmation_probability = if request.current_waitlist_position > 0 {
            let raw = self.predict_confirmation_probability(request, rush_index)?;
            Some(round3(raw.clamp(0.0, 1.0)))
        } else {
            None
        };

        // Step 5: booking window
        let optimal_booking_window = self.predict_booking_window(request, rush_index)?;

        // Step 6: rule-based advice, fixed order
        let recommendations = build_recommendations(
            rush_analysis.rush_level,
            request.days_before_festival,
            &optimal_booking_window,
            confirmation_probability,
            request.train_class,
        );

        // Step 7: assemble
        Ok(Advisory {
            route: RouteInfo {
                from: request.source_city.clone(),
                to: request.destination_city.clone(),
                distance_km: request.route_distance_km,
            },
            festival: request.festival,
            days_before_festival: request.days_before_festival,
            rush_analysis,
            confirmation_probability,
            optimal_booking_window,
            recommendations,
            train_details: TrainDetails {
                class: request.train_class,
                train_type: request.train_type,
                quota: request.quota,
            },
        })
    }

    /// Rush classifier block: level, confidence, distribution, top factors.
    pub fn predict_rush_level(
        &self,
        request: &JourneyRequest,
        rush_index: f64,
        proximity: f64,
    ) -> Result<RushAnalysis, AdvisorError> {
        let ctx = &*self.context;

        let mut record: BTreeMap<&str, RawValue> = BTreeMap::new();
        record.insert("festival", RawValue::Categorical(request.festival.as_str()));
        record.insert(
            "days_before_festival",
            RawValue::Numeric(f64::from(request.days_before_festival)),
        );
        record.insert(
            "route_distance_km",
            RawValue::Numeric(request.route_distance_km),
        );
        record.insert(
            "source_city_tier",
            RawValue::Numeric(f64::from(request.source_city_tier)),
        );
        record.insert(
            "destination_city_tier",
            RawValue::Numeric(f64::from(request.destination_city_tier)),
        );
        record.insert("peak_day_proximity", RawValue::Numeric(proximity));
        record.insert(
            "train_class",
            RawValue::Categorical(request.train_class.as_str()),
        );
        record.insert(
            "train_type",
            RawValue::Categorical(request.train_type.as_str()),
        );
        record.insert("historical_rush_index", RawValue::Numeric(rush_index));

        let encoded = encoding::encode(
            &record,
            &ctx.rush_features,
            &ctx.label_encoders,
            &ctx.rush_scaler,
        )?;
        log_fallbacks("rush", &encoded.fallback_columns);

        let distribution = ctx.rush_model.predict_distribution(&encoded.values)?;
        let class = distribution
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(class, _)| class)
            .ok_or_else(|| AdvisorError::Inference("empty rush distribution".to_string()))?;

        let label = ctx.rush_target_encoder.inverse(class).ok_or_else(|| {
            AdvisorError::Inference(format!("rush class {class} has no label"))
        })?;
        let rush_level = RushLevel::from_label(label).ok_or_else(|| {
            AdvisorError::Inference(format!("unrecognized rush label '{label}'"))
        })?;

        let confidence = distribution
            .iter()
            .copied()
            .fold(f64::MIN, f64::max);

        let mut probabilities = BTreeMap::new();
        for (i, &p) in distribution.iter().enumerate() {
            if let Some(class_label) = ctx.rush_target_encoder.inverse(i) {
                probabilities.insert(class_label.to_string(), round3(p));
            }
        }

        Ok(RushAnalysis {
            rush_level,
            confidence: round3(confidence),
            top_factors: top_factors(&ctx.rush_feature_importance),
            probabilities,
        })
    }

    /// Raw confirmation-probability prediction (caller clamps and rounds).
    pub fn predict_confirmation_probability(
        &self,
        request: &JourneyRequest,
        rush_index: f64,
    ) -> Result<f64, AdvisorError> {
        let ctx = &*self.context;

        let mut record: BTreeMap<&str, RawValue> = BTreeMap::new();
        record.insert(
            "current_waitlist_position",
            RawValue::Numeric(f64::from(request.current_waitlist_position)),
        );
        // Journey assumed on festival day, mirroring the training corpus
        record.insert(
            "days_to_journey",
            RawValue::Numeric(f64::from(request.days_before_festival)),
        );
        record.insert(
            "train_type",
            RawValue::Categorical(request.train_type.as_str()),
        );
        record.insert("quota", RawValue::Categorical(request.quota.as_str()));
        record.insert(
            "train_class",
            RawValue::Categorical(request.train_class.as_str()),
        );
        record.insert("historical_rush_index", RawValue::Numeric(rush_index));
        record.insert(
            "ticket_status",
            RawValue::Categorical(request.ticket_status.as_str()),
        );

        let encoded = encoding::encode(
            &record,
            &ctx.confirm_features,
            &ctx.label_encoders,
            &ctx.confirm_scaler,
        )?;
        log_fallbacks("confirmation", &encoded.fallback_columns);

        ctx.confirm_model.predict_row(&encoded.values)
    }

    /// Booking window: rounded prediction ±5 days.
    pub fn predict_booking_window(
        &self,
        request: &JourneyRequest,
        rush_index: f64,
    ) -> Result<BookingWindow, AdvisorError> {
        let ctx = &*self.context;

        let mut record: BTreeMap<&str, RawValue> = BTreeMap::new();
        record.insert("festival", RawValue::Categorical(request.festival.as_str()));
        record.insert(
            "route_distance_km",
            RawValue::Numeric(request.route_distance_km),
        );
        record.insert(
            "source_city_tier",
            RawValue::Numeric(f64::from(request.source_city_tier)),
        );
        record.insert(
            "destination_city_tier",
            RawValue::Numeric(f64::from(request.destination_city_tier)),
        );
        record.insert(
            "train_class",
            RawValue::Categorical(request.train_class.as_str()),
        );
        record.insert("historical_rush_index", RawValue::Numeric(rush_index));

        let encoded = encoding::encode(
            &record,
            &ctx.booking_features,
            &ctx.label_encoders,
            &ctx.booking_scaler,
        )?;
        log_fallbacks("booking", &encoded.fallback_columns);

        let predicted_days = ctx.booking_model.predict_row(&encoded.values)?;
        if !predicted_days.is_finite() {
            return Err(AdvisorError::Inference(
                "booking window prediction is not finite".to_string(),
            ));
        }

        let recommended = predicted_days.round() as i64;
        Ok(BookingWindow {
            optimal_min: recommended - 5,
            optimal_max: recommended + 5,
            recommended,
        })
    }
}

// ============================================================================
// Recommendation Rules
// ============================================================================

/// Fixed-order advice strings: rush level first, then booking timing,
/// then confirmation (when computed), then class upgrade.
fn build_recommendations(
    rush_level: RushLevel,
    days_before_festival: u32,
    window: &BookingWindow,
    confirmation_probability: Option<f64>,
    train_class: TrainClass,
) -> Vec<String> {
    let mut recommendations = Vec::with_capacity(5);

    match rush_level {
        RushLevel::High => {
            recommendations
                .push("Very high rush expected. Book as early as possible.".to_string());
            recommendations.push(
                "Consider booking under the Tatkal quota if the regular quota is full."
                    .to_string(),
            );
        }
        RushLevel::Medium => {
            recommendations
                .push("Moderate rush expected. Book within the optimal window.".to_string());
        }
        RushLevel::Low => {
            recommendations.push("Low rush expected. Normal booking should work.".to_string());
        }
    }

    let days = i64::from(days_before_festival);
    if days > window.optimal_max {
        recommendations.push(format!(
            "Book within {}-{} days before the festival.",
            window.optimal_min, window.optimal_max
        ));
    } else if days < window.optimal_min {
        recommendations
            .push("You are booking late. Consider alternate options.".to_string());
    } else {
        recommendations.push("You are inside the optimal booking window.".to_string());
    }

    if let Some(probability) = confirmation_probability {
        if probability < LOW_CONFIRMATION_THRESHOLD {
            recommendations.push(
                "Low confirmation chances. Consider alternate trains or dates.".to_string(),
            );
        } else if probability < MODERATE_CONFIRMATION_THRESHOLD {
            recommendations
                .push("Moderate confirmation chances. Keep backup plans ready.".to_string());
        } else {
            recommendations.push("Good confirmation chances.".to_string());
        }
    }

    if train_class.is_non_ac() && rush_level == RushLevel::High {
        recommendations
            .push("Consider upgrading to an AC class for better availability.".to_string());
    }

    recommendations
}

// ============================================================================
// Helpers
// ============================================================================

/// Top model features by fixed training-time importance, humanized.
/// This is a property of the trained model, not per-example attribution.
fn top_factors(importance: &[(String, f64)]) -> Vec<String> {
    let mut ranked: Vec<&(String, f64)> = importance.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(TOP_FACTOR_COUNT)
        .map(|(name, _)| humanize(name))
        .collect()
}

/// "historical_rush_index" -> "Historical Rush Index"
fn humanize(feature: &str) -> String {
    feature
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn log_fallbacks(model: &str, columns: &[String]) {
    if !columns.is_empty() {
        warn!(
            model,
            columns = ?columns,
            "unseen categorical value encoded with fallback code 0"
        );
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
