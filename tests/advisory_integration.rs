//! End-to-end pipeline tests: generate → train → persist → load → advise.
//!
//! The trained context is built once (small ensembles, fixed seed) and
//! round-tripped through a real artifact store, so every scenario below
//! exercises the same artifact path production serving uses.

use std::sync::{Arc, OnceLock};

use railrush::advisor::AdvisoryComposer;
use railrush::artifacts::{keys, ArtifactStore, InferenceContext};
use railrush::generator;
use railrush::training::{self, TrainingConfig};
use railrush::types::{
    Festival, JourneyRequest, Quota, RushLevel, TicketStatus, TrainClass, TrainType,
};

fn shared_context() -> Arc<InferenceContext> {
    static CONTEXT: OnceLock<Arc<InferenceContext>> = OnceLock::new();
    CONTEXT
        .get_or_init(|| {
            let rows = generator::generate(600, 42).expect("generation");
            let artifacts = training::train(&rows, &TrainingConfig::fast(42)).expect("training");

            let store = ArtifactStore::open_temp().expect("store");
            store.save(&artifacts).expect("save");
            Arc::new(store.load_context().expect("load"))
        })
        .clone()
}

fn composer() -> AdvisoryComposer {
    AdvisoryComposer::new(shared_context())
}

fn base_request() -> JourneyRequest {
    JourneyRequest {
        festival: Festival::Diwali,
        days_before_festival: 30,
        source_city: "Delhi".to_string(),
        destination_city: "Patna".to_string(),
        route_distance_km: 1000.0,
        source_city_tier: 1,
        destination_city_tier: 2,
        train_class: TrainClass::Sleeper,
        train_type: TrainType::Superfast,
        quota: Quota::General,
        current_waitlist_position: 0,
        ticket_status: TicketStatus::Confirmed,
        historical_rush_index: None,
        peak_day_proximity: None,
    }
}

// ============================================================================
// Scenario A: rush prediction
// ============================================================================

#[test]
fn test_scenario_a_rush_prediction() {
    let advisory = composer().advise(&base_request()).unwrap();

    let rush = &advisory.rush_analysis;
    assert!(matches!(
        rush.rush_level,
        RushLevel::Low | RushLevel::Medium | RushLevel::High
    ));
    assert!(rush.confidence > 0.0 && rush.confidence <= 1.0);
    assert_eq!(rush.top_factors.len(), 4);

    // Values are rounded to 3 decimals, so allow rounding drift
    let total: f64 = rush.probabilities.values().sum();
    assert!((total - 1.0).abs() < 0.002, "distribution sums to ~1");

    let max_probability = rush
        .probabilities
        .values()
        .copied()
        .fold(f64::MIN, f64::max);
    assert!((rush.confidence - max_probability).abs() < 1e-9);
}

// ============================================================================
// Scenario B: confirmation probability
// ============================================================================

#[test]
fn test_scenario_b_confirmation_probability() {
    let mut request = base_request();
    request.days_before_festival = 15;
    request.current_waitlist_position = 25;
    request.ticket_status = TicketStatus::Waitlisted;
    request.historical_rush_index = Some(75.0);

    let advisory = composer().advise(&request).unwrap();
    let probability = advisory
        .confirmation_probability
        .expect("waitlisted request must carry a confirmation probability");
    assert!((0.0..=1.0).contains(&probability));
}

#[test]
fn test_confirmation_absent_when_not_waitlisted() {
    let advisory = composer().advise(&base_request()).unwrap();
    assert!(advisory.confirmation_probability.is_none());
}

// ============================================================================
// Scenario C: booking window
// ============================================================================

#[test]
fn test_scenario_c_booking_window() {
    let mut request = base_request();
    request.festival = Festival::Holi;
    request.route_distance_km = 500.0;
    request.train_class = TrainClass::ThreeAc;

    let advisory = composer().advise(&request).unwrap();
    let window = advisory.optimal_booking_window;

    assert!(window.optimal_min < window.optimal_max);
    assert_eq!(window.optimal_max - window.optimal_min, 10, "symmetric ±5 band");
    assert_eq!(window.recommended, window.optimal_min + 5);
}

// ============================================================================
// Scenario D: complete advisory
// ============================================================================

#[test]
fn test_scenario_d_complete_advisory() {
    let mut request = base_request();
    request.days_before_festival = 20;
    request.current_waitlist_position = 40;
    request.ticket_status = TicketStatus::Waitlisted;

    let advisory = composer().advise(&request).unwrap();

    assert!(!advisory.recommendations.is_empty());
    assert!(
        advisory.recommendations[0].contains("rush"),
        "first recommendation is rush-level advice: {:?}",
        advisory.recommendations[0]
    );
    assert!(advisory.confirmation_probability.is_some());
    assert_eq!(advisory.route.from, "Delhi");
    assert_eq!(advisory.route.to, "Patna");
    assert_eq!(advisory.train_details.class, TrainClass::Sleeper);
}

// ============================================================================
// Validation & degraded paths
// ============================================================================

#[test]
fn test_invalid_tier_is_rejected_before_prediction() {
    let mut request = base_request();
    request.source_city_tier = 7;
    let err = composer().advise(&request).unwrap_err();
    assert!(matches!(err, railrush::AdvisorError::Validation(_)));
}

#[test]
fn test_negative_distance_is_rejected() {
    let mut request = base_request();
    request.route_distance_km = -100.0;
    assert!(composer().advise(&request).is_err());
}

/// A festival absent from the training corpus must not crash the
/// pipeline: the encoder falls back to code 0 and a valid advisory is
/// still produced.
#[test]
fn test_unseen_festival_still_produces_advisory() {
    let rows: Vec<_> = generator::generate(600, 42)
        .unwrap()
        .into_iter()
        .filter(|row| row.festival != Festival::Pongal)
        .collect();
    let artifacts = training::train(&rows, &TrainingConfig::fast(42)).unwrap();
    let store = ArtifactStore::open_temp().unwrap();
    store.save(&artifacts).unwrap();
    let composer = AdvisoryComposer::new(Arc::new(store.load_context().unwrap()));

    let mut request = base_request();
    request.festival = Festival::Pongal;

    let advisory = composer.advise(&request).unwrap();
    assert!(advisory.rush_analysis.confidence > 0.0);
}

// ============================================================================
// Artifact store behavior
// ============================================================================

#[test]
fn test_missing_artifact_prevents_startup() {
    let rows = generator::generate(300, 42).unwrap();
    let artifacts = training::train(&rows, &TrainingConfig::fast(42)).unwrap();
    let store = ArtifactStore::open_temp().unwrap();
    store.save(&artifacts).unwrap();
    store.remove(keys::RUSH_FEATURE_IMPORTANCE).unwrap();

    assert!(store.load_context().is_err());
}

#[test]
fn test_artifacts_survive_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let rows = generator::generate(300, 42).unwrap();
    let artifacts = training::train(&rows, &TrainingConfig::fast(42)).unwrap();

    {
        let store = ArtifactStore::open(dir.path().join("models")).unwrap();
        store.save(&artifacts).unwrap();
    }

    // Fresh handle over the same directory, as a restarted process would open
    let store = ArtifactStore::open(dir.path().join("models")).unwrap();
    let context = store.load_context().unwrap();
    let composer = AdvisoryComposer::new(Arc::new(context));

    let advisory = composer.advise(&base_request()).unwrap();
    assert_eq!(advisory.rush_analysis.top_factors.len(), 4);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_context_gives_identical_advisories() {
    let composer = composer();
    let request = base_request();

    let a = composer.advise(&request).unwrap();
    let b = composer.advise(&request).unwrap();

    assert_eq!(a.rush_analysis.rush_level, b.rush_analysis.rush_level);
    assert_eq!(a.rush_analysis.confidence, b.rush_analysis.confidence);
    assert_eq!(
        a.optimal_booking_window.recommended,
        b.optimal_booking_window.recommended
    );
}
