//! Synthetic training-data generator.
//!
//! Encodes the domain heuristics from the catalog into labeled rows that
//! stand in for real historical booking behavior. Generation is pure and
//! deterministic given the seed; the same seed and sample count reproduce
//! byte-identical CSV output.
//!
//! Two variants exist:
//! - the enhanced generator (`generate`), which produces the full
//!   25-column corpus that feeds training, and
//! - the simple generator (`generate_simple`), an earlier coarse variant
//!   kept with its own thresholds and column set.
//!
//! The rush-index formula here is the label-generation heuristic. The
//! serve-time fallback estimate in `advisor` uses different weights; the
//! two are deliberately separate functions (see DESIGN.md).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::{
    class_rush_factor, days_to_journey_factor, festival_profile, quota_confirmation_factor,
    train_type_confirmation_factor, waitlist_position_factor, FestivalProfile, POPULAR_ROUTES,
};
use crate::error::AdvisorError;
use crate::types::{
    Festival, Quota, RushLevel, TicketStatus, TrainClass, TrainType, TrainingExample,
};

// ============================================================================
// Label Thresholds (Enhanced Generator)
// ============================================================================

/// Rush index at or above which a row is labeled High.
pub const HIGH_RUSH_THRESHOLD: f64 = 75.0;
/// Rush index at or above which a row is labeled Medium.
pub const MEDIUM_RUSH_THRESHOLD: f64 = 45.0;
/// Base probability before the four confirmation discount factors.
pub const BASE_CONFIRMATION_PROBABILITY: f64 = 0.8;
/// Clamp bounds for confirmation probability.
pub const CONFIRMATION_PROBABILITY_RANGE: (f64, f64) = (0.05, 0.98);
/// Clamp bounds for the enhanced rush index.
pub const RUSH_INDEX_RANGE: (f64, f64) = (10.0, 100.0);
/// Fraction of generated bookings that are waitlisted during festivals.
const WAITLIST_FRACTION: f64 = 0.6;

/// Threshold function for the enhanced corpus. Must be used everywhere a
/// rush level is re-derived from an index.
pub fn rush_level_for(index: f64) -> RushLevel {
    if index >= HIGH_RUSH_THRESHOLD {
        RushLevel::High
    } else if index >= MEDIUM_RUSH_THRESHOLD {
        RushLevel::Medium
    } else {
        RushLevel::Low
    }
}

/// Confirmation probability as a product of four independent discount
/// factors over a base probability, clamped to the documented range.
pub fn confirmation_probability(
    waitlist_position: u32,
    days_to_journey: u32,
    train_type: TrainType,
    quota: Quota,
) -> f64 {
    let prob = BASE_CONFIRMATION_PROBABILITY
        * waitlist_position_factor(waitlist_position)
        * days_to_journey_factor(days_to_journey)
        * train_type_confirmation_factor(train_type)
        * quota_confirmation_factor(quota);
    prob.clamp(
        CONFIRMATION_PROBABILITY_RANGE.0,
        CONFIRMATION_PROBABILITY_RANGE.1,
    )
}

/// Booking window band from the festival's rush-multiplier tier, in days
/// before the festival. Independent of the per-row index.
pub fn booking_window_for(profile: &FestivalProfile) -> (u32, u32) {
    if profile.rush_multiplier > 0.85 {
        (45, 60)
    } else if profile.rush_multiplier > 0.75 {
        (30, 45)
    } else {
        (20, 35)
    }
}

/// Smallest distance in days between the travel date and any peak day.
pub fn peak_day_proximity(days_before_festival: u32, profile: &FestivalProfile) -> u32 {
    profile
        .peak_days
        .iter()
        .map(|&pd| days_before_festival.abs_diff(pd))
        .min()
        .unwrap_or(0)
}

// ============================================================================
// Enhanced Generator
// ============================================================================

/// Generate `samples` labeled rows with a fixed seed.
pub fn generate(samples: usize, seed: u64) -> Result<Vec<TrainingExample>, AdvisorError> {
    if samples == 0 {
        return Err(AdvisorError::Validation(
            "sample count must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(samples);

    for _ in 0..samples {
        let festival = pick(&Festival::ALL, &mut rng);
        let profile = festival_profile(festival);
        let route = POPULAR_ROUTES[rng.gen_range(0..POPULAR_ROUTES.len())];

        let days_before_festival = rng.gen_range(0..=60u32);
        let days_to_journey = days_before_festival; // journey assumed on festival day
        let booking_hour = rng.gen_range(0..=23u32);

        let train_class = pick(&TrainClass::ALL, &mut rng);
        let train_type = pick(&TrainType::ALL, &mut rng);
        let quota = pick(&Quota::ALL, &mut rng);

        let is_waitlisted = rng.gen_bool(WAITLIST_FRACTION);
        let (current_waitlist_position, ticket_status) = if is_waitlisted {
            (rng.gen_range(1..=200u32), TicketStatus::Waitlisted)
        } else {
            let status = if rng.gen_bool(0.5) {
                TicketStatus::Confirmed
            } else {
                TicketStatus::Rac
            };
            (0, status)
        };

        let proximity = peak_day_proximity(days_before_festival, &profile);

        let noise = rng.gen_range(-5.0..5.0);
        let historical_rush_index = rush_index(
            &route.into(),
            &profile,
            days_before_festival,
            proximity,
            train_class,
            noise,
        );

        let rush_level = rush_level_for(historical_rush_index);
        let confirmation = confirmation_probability(
            current_waitlist_position,
            days_to_journey,
            train_type,
            quota,
        );
        let (window_min, window_max) = booking_window_for(&profile);

        rows.push(TrainingExample {
            festival,
            route: format!("{}-{}", route.from, route.to),
            source_city: route.from.to_string(),
            destination_city: route.to.to_string(),
            route_distance_km: route.distance_km,
            source_city_tier: route.tier_from,
            destination_city_tier: route.tier_to,
            days_before_festival,
            days_to_journey,
            peak_day_proximity: proximity,
            booking_hour,
            train_class,
            train_type,
            quota,
            ticket_status,
            current_waitlist_position,
            is_waitlisted,
            historical_rush_index: round_to(historical_rush_index, 2),
            rush_level,
            confirmation_probability: round_to(confirmation, 3),
            optimal_booking_window_min: window_min,
            optimal_booking_window_max: window_max,
            flight_price_ratio: round_to(route.distance_km / 400.0, 2),
            bus_available: route.distance_km < 1000.0,
            booking_risk_score: round_to(historical_rush_index / 100.0, 2),
        });
    }

    Ok(rows)
}

/// Route inputs to the rush-index formula, decoupled from the catalog so
/// tests can probe arbitrary routes.
#[derive(Debug, Clone, Copy)]
pub struct RouteInputs {
    pub base_rush: f64,
    pub distance_km: f64,
    pub tier_from: u8,
    pub tier_to: u8,
}

impl From<crate::catalog::RouteProfile> for RouteInputs {
    fn from(r: crate::catalog::RouteProfile) -> Self {
        Self {
            base_rush: r.base_rush,
            distance_km: r.distance_km,
            tier_from: r.tier_from,
            tier_to: r.tier_to,
        }
    }
}

/// Label-generation rush index: weighted combination of route baseline,
/// festival multiplier, time decay, peak proximity, distance, tier, and
/// class contention, plus noise, clamped to [`RUSH_INDEX_RANGE`].
pub fn rush_index(
    route: &RouteInputs,
    profile: &FestivalProfile,
    days_before_festival: u32,
    proximity: u32,
    train_class: TrainClass,
    noise: f64,
) -> f64 {
    let base_rush = route.base_rush * 100.0;
    let festival_rush = profile.rush_multiplier * 100.0;
    let time_rush = (60.0 - f64::from(days_before_festival)) * 1.5;
    let peak_rush = (30.0 - f64::from(proximity) * 3.0).max(0.0);
    let distance_factor = (route.distance_km / 2000.0) * 15.0;
    let tier_factor =
        f64::from(3 - route.tier_from.min(3) + 3 - route.tier_to.min(3)) * 4.0;
    let class_rush = class_rush_factor(train_class);

    let index = base_rush * 0.25
        + festival_rush * 0.25
        + time_rush * 0.2
        + peak_rush * 0.15
        + distance_factor
        + tier_factor
        + class_rush
        + noise;

    index.clamp(RUSH_INDEX_RANGE.0, RUSH_INDEX_RANGE.1)
}

/// Render rows as the fixed-column corpus CSV (header + one line per row).
pub fn to_csv(rows: &[TrainingExample]) -> String {
    let mut out = String::with_capacity(rows.len() * 128);
    out.push_str(&TrainingExample::csv_header());
    out.push('\n');
    for row in rows {
        out.push_str(&row.to_csv_row());
        out.push('\n');
    }
    out
}

// ============================================================================
// Simple Generator (earlier coarse variant)
// ============================================================================

/// Transport mode sampled by the simple generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Train,
    Bus,
    Flight,
}

impl TransportMode {
    pub const ALL: [Self; 3] = [Self::Train, Self::Bus, Self::Flight];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "Train",
            Self::Bus => "Bus",
            Self::Flight => "Flight",
        }
    }

    fn rush_weight(self) -> f64 {
        match self {
            Self::Train => 1.0,
            Self::Bus => 0.7,
            Self::Flight => 0.4,
        }
    }
}

/// One row of the simple corpus.
#[derive(Debug, Clone)]
pub struct SimpleObservation {
    pub festival: Festival,
    pub days_before_festival: u32,
    pub source_city_tier: u8,
    pub destination_city_tier: u8,
    pub route_distance_km: f64,
    pub transport_mode: TransportMode,
    pub historical_rush_index: f64,
    pub rush_level: RushLevel,
    pub booking_risk_score: f64,
}

/// Simple-generator threshold function: index < 40 Low, < 70 Medium,
/// else High. A different convention from [`rush_level_for`]; kept as-is.
pub fn simple_rush_level(index: f64) -> RushLevel {
    if index < 40.0 {
        RushLevel::Low
    } else if index < 70.0 {
        RushLevel::Medium
    } else {
        RushLevel::High
    }
}

/// Festivals covered by the simple corpus (the original five).
const SIMPLE_FESTIVALS: [Festival; 5] = [
    Festival::Diwali,
    Festival::Holi,
    Festival::DurgaPuja,
    Festival::ChhathPuja,
    Festival::EidUlFitr,
];

/// Generate the coarse corpus variant. Index clamps to [0, 100].
pub fn generate_simple(samples: usize, seed: u64) -> Result<Vec<SimpleObservation>, AdvisorError> {
    if samples == 0 {
        return Err(AdvisorError::Validation(
            "sample count must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(samples);

    for _ in 0..samples {
        let festival = SIMPLE_FESTIVALS[rng.gen_range(0..SIMPLE_FESTIVALS.len())];
        let days_before = rng.gen_range(0..=30u32);
        let src_tier = rng.gen_range(1..=3u8);
        let dst_tier = rng.gen_range(1..=3u8);
        let distance = f64::from(rng.gen_range(100..=1800u32));
        let mode = pick(&TransportMode::ALL, &mut rng);

        let base = festival_profile(festival).rush_multiplier * 100.0;
        let days_effect = f64::from(30 - days_before) * rng.gen_range(1.2..1.8);
        let distance_effect = (distance / 1800.0) * rng.gen_range(10.0..25.0);
        let tier_effect = f64::from(4 - src_tier + 4 - dst_tier) * 6.0;
        let mode_effect = mode.rush_weight() * rng.gen_range(10.0..25.0);

        let index = (base * 0.3 + days_effect + distance_effect + tier_effect + mode_effect)
            .clamp(0.0, 100.0);

        rows.push(SimpleObservation {
            festival,
            days_before_festival: days_before,
            source_city_tier: src_tier,
            destination_city_tier: dst_tier,
            route_distance_km: distance,
            transport_mode: mode,
            historical_rush_index: round_to(index, 2),
            rush_level: simple_rush_level(index),
            booking_risk_score: round_to((index / 100.0).min(1.0), 2),
        });
    }

    Ok(rows)
}

/// Render the simple corpus as CSV.
pub fn simple_to_csv(rows: &[SimpleObservation]) -> String {
    let mut out = String::from(
        "festival,days_before_festival,source_city_tier,destination_city_tier,\
         route_distance_km,transport_mode,historical_rush_index,rush_level,booking_risk_score\n",
    );
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{:.2},{},{:.2}\n",
            row.festival,
            row.days_before_festival,
            row.source_city_tier,
            row.destination_city_tier,
            row.route_distance_km,
            row.transport_mode.as_str(),
            row.historical_rush_index,
            row.rush_level,
            row.booking_risk_score,
        ));
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

fn pick<T: Copy>(options: &[T], rng: &mut StdRng) -> T {
    options[rng.gen_range(0..options.len())]
}

fn round_to(x: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_is_byte_identical() {
        let a = generate(200, 42).unwrap();
        let b = generate(200, 42).unwrap();
        assert_eq!(to_csv(&a), to_csv(&b));
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate(200, 42).unwrap();
        let b = generate(200, 43).unwrap();
        assert_ne!(to_csv(&a), to_csv(&b));
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(generate(0, 42).is_err());
        assert!(generate_simple(0, 42).is_err());
    }

    #[test]
    fn test_rush_level_threshold_boundaries() {
        // Enhanced convention: >= 75 High, >= 45 Medium
        assert_eq!(rush_level_for(75.0), RushLevel::High);
        assert_eq!(rush_level_for(74.999), RushLevel::Medium);
        assert_eq!(rush_level_for(45.0), RushLevel::Medium);
        assert_eq!(rush_level_for(44.999), RushLevel::Low);
    }

    #[test]
    fn test_simple_rush_level_boundaries() {
        // Simple convention: < 40 Low, < 70 Medium, else High
        assert_eq!(simple_rush_level(39.999), RushLevel::Low);
        assert_eq!(simple_rush_level(40.0), RushLevel::Medium);
        assert_eq!(simple_rush_level(69.999), RushLevel::Medium);
        assert_eq!(simple_rush_level(70.0), RushLevel::High);
    }

    #[test]
    fn test_generated_rows_satisfy_invariants() {
        let rows = generate(500, 42).unwrap();
        assert_eq!(rows.len(), 500);
        for row in &rows {
            assert!(
                (RUSH_INDEX_RANGE.0..=RUSH_INDEX_RANGE.1)
                    .contains(&row.historical_rush_index),
                "index {} out of range",
                row.historical_rush_index
            );
            assert!(
                (CONFIRMATION_PROBABILITY_RANGE.0..=CONFIRMATION_PROBABILITY_RANGE.1)
                    .contains(&row.confirmation_probability)
            );
            assert_eq!(row.rush_level, rush_level_for(row.historical_rush_index));
            assert_eq!(row.is_waitlisted, row.current_waitlist_position > 0);
            assert!(row.optimal_booking_window_min < row.optimal_booking_window_max);
            assert!(row.days_to_journey == row.days_before_festival);
        }
    }

    #[test]
    fn test_confirmation_probability_bounds_and_monotonicity() {
        // Best case clamps at the ceiling
        let best = confirmation_probability(1, 60, TrainType::Rajdhani, Quota::PremiumTatkal);
        assert!(best <= CONFIRMATION_PROBABILITY_RANGE.1);
        // Worst case clamps at the floor
        let worst = confirmation_probability(150, 2, TrainType::Mail, Quota::General);
        assert!(worst >= CONFIRMATION_PROBABILITY_RANGE.0);
        // Deeper waitlist never helps
        let shallow = confirmation_probability(5, 20, TrainType::Express, Quota::General);
        let deep = confirmation_probability(120, 20, TrainType::Express, Quota::General);
        assert!(deep < shallow);
    }

    #[test]
    fn test_booking_window_bands() {
        let diwali = festival_profile(Festival::Diwali); // 0.95
        assert_eq!(booking_window_for(&diwali), (45, 60));
        let durga = festival_profile(Festival::DurgaPuja); // 0.85 — not > 0.85
        assert_eq!(booking_window_for(&durga), (30, 45));
        let holi = festival_profile(Festival::Holi); // 0.75 — not > 0.75
        assert_eq!(booking_window_for(&holi), (20, 35));
        let christmas = festival_profile(Festival::Christmas); // 0.70
        assert_eq!(booking_window_for(&christmas), (20, 35));
    }

    #[test]
    fn test_peak_day_proximity() {
        let diwali = festival_profile(Festival::Diwali); // peaks [3,4,5]
        assert_eq!(peak_day_proximity(4, &diwali), 0);
        assert_eq!(peak_day_proximity(0, &diwali), 3);
        assert_eq!(peak_day_proximity(10, &diwali), 5);
    }

    #[test]
    fn test_simple_generator_deterministic_and_bounded() {
        let a = generate_simple(100, 7).unwrap();
        let b = generate_simple(100, 7).unwrap();
        assert_eq!(simple_to_csv(&a), simple_to_csv(&b));
        for row in &a {
            assert!((0.0..=100.0).contains(&row.historical_rush_index));
        }
    }
}
