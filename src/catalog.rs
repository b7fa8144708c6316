//! Hand-authored domain catalog: festival rush profiles, the popular-route
//! table, and the factor lookups used by the synthetic generator.
//!
//! These tables are the single source of truth for the heuristics encoded
//! into training labels. The serve-time fallback heuristic in `advisor`
//! uses its own, different weight tables; the two are intentionally kept
//! separate (see DESIGN.md).

use crate::types::{Festival, Quota, TrainClass, TrainType};

// ============================================================================
// Festival Profiles
// ============================================================================

/// Travel-pattern profile for one festival.
#[derive(Debug, Clone, Copy)]
pub struct FestivalProfile {
    /// Relative demand pressure (0-1 scale, multiplied to 0-100)
    pub rush_multiplier: f64,
    /// Days-before-festival on which departures peak
    pub peak_days: &'static [u32],
    /// Typical festival duration in days
    pub duration_days: u32,
}

/// Rush profile for a festival.
pub fn festival_profile(festival: Festival) -> FestivalProfile {
    match festival {
        Festival::Diwali => FestivalProfile {
            rush_multiplier: 0.95,
            peak_days: &[3, 4, 5],
            duration_days: 5,
        },
        Festival::Holi => FestivalProfile {
            rush_multiplier: 0.75,
            peak_days: &[1, 2],
            duration_days: 3,
        },
        Festival::DurgaPuja => FestivalProfile {
            rush_multiplier: 0.85,
            peak_days: &[5, 6, 7],
            duration_days: 10,
        },
        Festival::ChhathPuja => FestivalProfile {
            rush_multiplier: 0.90,
            peak_days: &[1, 2],
            duration_days: 4,
        },
        Festival::EidUlFitr => FestivalProfile {
            rush_multiplier: 0.80,
            peak_days: &[1],
            duration_days: 3,
        },
        Festival::Christmas => FestivalProfile {
            rush_multiplier: 0.70,
            peak_days: &[24, 25],
            duration_days: 3,
        },
        Festival::Pongal => FestivalProfile {
            rush_multiplier: 0.72,
            peak_days: &[1, 2],
            duration_days: 4,
        },
    }
}

// ============================================================================
// Route Catalog
// ============================================================================

/// A high-traffic route with its historical rush baseline.
#[derive(Debug, Clone, Copy)]
pub struct RouteProfile {
    pub from: &'static str,
    pub to: &'static str,
    /// City tier of origin (1 = metro)
    pub tier_from: u8,
    /// City tier of destination
    pub tier_to: u8,
    pub distance_km: f64,
    /// Baseline demand pressure for this route (0-1)
    pub base_rush: f64,
}

/// Popular routes sampled by the synthetic generator.
pub const POPULAR_ROUTES: [RouteProfile; 5] = [
    RouteProfile {
        from: "Delhi",
        to: "Patna",
        tier_from: 1,
        tier_to: 2,
        distance_km: 1000.0,
        base_rush: 0.85,
    },
    RouteProfile {
        from: "Mumbai",
        to: "Kolkata",
        tier_from: 1,
        tier_to: 1,
        distance_km: 2000.0,
        base_rush: 0.75,
    },
    RouteProfile {
        from: "Bangalore",
        to: "Chennai",
        tier_from: 1,
        tier_to: 1,
        distance_km: 350.0,
        base_rush: 0.65,
    },
    RouteProfile {
        from: "Delhi",
        to: "Lucknow",
        tier_from: 1,
        tier_to: 2,
        distance_km: 500.0,
        base_rush: 0.80,
    },
    RouteProfile {
        from: "Mumbai",
        to: "Ahmedabad",
        tier_from: 1,
        tier_to: 2,
        distance_km: 500.0,
        base_rush: 0.70,
    },
];

// ============================================================================
// Generator Factor Tables
// ============================================================================

/// Rush contribution of a train class (sleeper-type classes see the most
/// contention). Default for unlisted classes is 15.
pub fn class_rush_factor(class: TrainClass) -> f64 {
    match class {
        TrainClass::General => 25.0,
        TrainClass::Sleeper => 20.0,
        TrainClass::ThreeAc => 15.0,
        TrainClass::TwoAc => 10.0,
        TrainClass::FirstAc => 5.0,
    }
}

/// Confirmation discount factor for a train type. Premium services clear
/// waitlists faster. Documented default for unlisted types: 0.7.
pub fn train_type_confirmation_factor(train_type: TrainType) -> f64 {
    match train_type {
        TrainType::Rajdhani => 0.9,
        TrainType::Duronto => 0.85,
        TrainType::Shatabdi => 0.85,
        TrainType::Superfast => 0.75,
        TrainType::Express => 0.65,
        TrainType::Mail => 0.60,
    }
}

/// Confirmation discount factor for a quota. Documented default for
/// unlisted quotas: 0.75.
pub fn quota_confirmation_factor(quota: Quota) -> f64 {
    match quota {
        Quota::Tatkal => 0.95,
        Quota::PremiumTatkal => 0.98,
        Quota::General => 0.70,
        Quota::Ladies => 0.85,
        Quota::SeniorCitizen => 0.80,
    }
}

/// Waitlist-position bucket factor: exponential-style decay with position.
pub fn waitlist_position_factor(position: u32) -> f64 {
    match position {
        0..=10 => 0.9,
        11..=50 => 0.6,
        51..=100 => 0.3,
        _ => 0.1,
    }
}

/// Days-to-journey bucket factor: more runway, more cancellations.
pub fn days_to_journey_factor(days: u32) -> f64 {
    match days {
        d if d > 30 => 0.9,
        d if d > 15 => 0.7,
        d if d > 7 => 0.5,
        _ => 0.3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_festival_profiles_cover_all_variants() {
        for f in Festival::ALL {
            let p = festival_profile(f);
            assert!((0.0..=1.0).contains(&p.rush_multiplier));
            assert!(!p.peak_days.is_empty());
            assert!(p.duration_days > 0);
        }
    }

    #[test]
    fn test_route_catalog_invariants() {
        for r in POPULAR_ROUTES {
            assert!(r.distance_km > 0.0);
            assert!((1..=3).contains(&r.tier_from));
            assert!((1..=3).contains(&r.tier_to));
            assert!((0.0..=1.0).contains(&r.base_rush));
        }
    }

    #[test]
    fn test_waitlist_bucket_boundaries() {
        assert!((waitlist_position_factor(10) - 0.9).abs() < f64::EPSILON);
        assert!((waitlist_position_factor(11) - 0.6).abs() < f64::EPSILON);
        assert!((waitlist_position_factor(50) - 0.6).abs() < f64::EPSILON);
        assert!((waitlist_position_factor(51) - 0.3).abs() < f64::EPSILON);
        assert!((waitlist_position_factor(101) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_days_bucket_boundaries() {
        assert!((days_to_journey_factor(31) - 0.9).abs() < f64::EPSILON);
        assert!((days_to_journey_factor(30) - 0.7).abs() < f64::EPSILON);
        assert!((days_to_journey_factor(16) - 0.7).abs() < f64::EPSILON);
        assert!((days_to_journey_factor(8) - 0.5).abs() < f64::EPSILON);
        assert!((days_to_journey_factor(7) - 0.3).abs() < f64::EPSILON);
    }
}
