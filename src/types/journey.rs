//! Request-side types: JourneyRequest and its categorical enums.
//!
//! Every enum carries the exact label used in the training corpus via
//! `as_str()`; the feature encoder operates on those labels, so the
//! string representation is part of the model contract.

use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

// ============================================================================
// Categorical Enums
// ============================================================================

/// Named festivals covered by the rush catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Festival {
    Diwali,
    Holi,
    #[serde(rename = "Durga Puja")]
    DurgaPuja,
    #[serde(rename = "Chhath Puja")]
    ChhathPuja,
    #[serde(rename = "Eid-ul-Fitr")]
    EidUlFitr,
    Christmas,
    Pongal,
}

impl Festival {
    pub const ALL: [Self; 7] = [
        Self::Diwali,
        Self::Holi,
        Self::DurgaPuja,
        Self::ChhathPuja,
        Self::EidUlFitr,
        Self::Christmas,
        Self::Pongal,
    ];

    /// Corpus label for this festival.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diwali => "Diwali",
            Self::Holi => "Holi",
            Self::DurgaPuja => "Durga Puja",
            Self::ChhathPuja => "Chhath Puja",
            Self::EidUlFitr => "Eid-ul-Fitr",
            Self::Christmas => "Christmas",
            Self::Pongal => "Pongal",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == label)
    }
}

impl std::fmt::Display for Festival {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Train accommodation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainClass {
    Sleeper,
    #[serde(rename = "3AC")]
    ThreeAc,
    #[serde(rename = "2AC")]
    TwoAc,
    #[serde(rename = "1AC")]
    FirstAc,
    General,
}

impl TrainClass {
    pub const ALL: [Self; 5] = [
        Self::Sleeper,
        Self::ThreeAc,
        Self::TwoAc,
        Self::FirstAc,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sleeper => "Sleeper",
            Self::ThreeAc => "3AC",
            Self::TwoAc => "2AC",
            Self::FirstAc => "1AC",
            Self::General => "General",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Non-AC classes see the heaviest festival contention.
    pub fn is_non_ac(self) -> bool {
        matches!(self, Self::Sleeper | Self::General)
    }
}

impl std::fmt::Display for TrainClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Train service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainType {
    Express,
    Superfast,
    Rajdhani,
    Shatabdi,
    Duronto,
    Mail,
}

impl TrainType {
    pub const ALL: [Self; 6] = [
        Self::Express,
        Self::Superfast,
        Self::Rajdhani,
        Self::Shatabdi,
        Self::Duronto,
        Self::Mail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Express => "Express",
            Self::Superfast => "Superfast",
            Self::Rajdhani => "Rajdhani",
            Self::Shatabdi => "Shatabdi",
            Self::Duronto => "Duronto",
            Self::Mail => "Mail",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

impl std::fmt::Display for TrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ticket allocation quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quota {
    General,
    Tatkal,
    Ladies,
    #[serde(rename = "Senior Citizen")]
    SeniorCitizen,
    #[serde(rename = "Premium Tatkal")]
    PremiumTatkal,
}

impl Quota {
    pub const ALL: [Self; 5] = [
        Self::General,
        Self::Tatkal,
        Self::Ladies,
        Self::SeniorCitizen,
        Self::PremiumTatkal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Tatkal => "Tatkal",
            Self::Ladies => "Ladies",
            Self::SeniorCitizen => "Senior Citizen",
            Self::PremiumTatkal => "Premium Tatkal",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == label)
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::General
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Confirmed seat
    #[serde(rename = "CNF")]
    Confirmed,
    /// Waitlisted
    #[serde(rename = "WL")]
    Waitlisted,
    /// Reservation against cancellation
    #[serde(rename = "RAC")]
    Rac,
}

impl TicketStatus {
    pub const ALL: [Self; 3] = [Self::Confirmed, Self::Waitlisted, Self::Rac];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CNF",
            Self::Waitlisted => "WL",
            Self::Rac => "RAC",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        Self::Waitlisted
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse three-tier congestion forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RushLevel {
    Low,
    Medium,
    High,
}

impl RushLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RushLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Journey Request
// ============================================================================

/// User-supplied journey parameters for an advisory request.
///
/// `historical_rush_index` and `peak_day_proximity` are optional; when
/// absent the composer derives them (see `advisor`). A
/// `current_waitlist_position` of 0 means "not waitlisted".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyRequest {
    pub festival: Festival,
    pub days_before_festival: u32,
    pub source_city: String,
    pub destination_city: String,
    pub route_distance_km: f64,
    /// City tier: 1 = metro, 2 = mid-size, 3 = small
    pub source_city_tier: u8,
    pub destination_city_tier: u8,
    pub train_class: TrainClass,
    pub train_type: TrainType,
    #[serde(default)]
    pub quota: Quota,
    #[serde(default)]
    pub current_waitlist_position: u32,
    #[serde(default)]
    pub ticket_status: TicketStatus,
    /// Known demand-pressure index (0-100). Estimated when absent.
    #[serde(default)]
    pub historical_rush_index: Option<f64>,
    /// Distance in days from the festival's peak day(s). Approximated when absent.
    #[serde(default)]
    pub peak_day_proximity: Option<f64>,
}

impl JourneyRequest {
    /// Domain validation. Rejected requests never reach the models.
    pub fn validate(&self) -> Result<(), AdvisorError> {
        if !(1..=3).contains(&self.source_city_tier) {
            return Err(AdvisorError::Validation(format!(
                "source_city_tier must be 1, 2 or 3 (got {})",
                self.source_city_tier
            )));
        }
        if !(1..=3).contains(&self.destination_city_tier) {
            return Err(AdvisorError::Validation(format!(
                "destination_city_tier must be 1, 2 or 3 (got {})",
                self.destination_city_tier
            )));
        }
        if !self.route_distance_km.is_finite() || self.route_distance_km <= 0.0 {
            return Err(AdvisorError::Validation(format!(
                "route_distance_km must be a positive number (got {})",
                self.route_distance_km
            )));
        }
        if let Some(idx) = self.historical_rush_index {
            if !idx.is_finite() || !(0.0..=100.0).contains(&idx) {
                return Err(AdvisorError::Validation(format!(
                    "historical_rush_index must be within 0-100 (got {idx})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> JourneyRequest {
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

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_bad_tier_rejected() {
        let mut req = valid_request();
        req.source_city_tier = 0;
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.destination_city_tier = 4;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_nonpositive_distance_rejected() {
        let mut req = valid_request();
        req.route_distance_km = 0.0;
        assert!(req.validate().is_err());
        req.route_distance_km = -5.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_enum_labels_round_trip() {
        for f in Festival::ALL {
            assert_eq!(Festival::from_label(f.as_str()), Some(f));
        }
        for c in TrainClass::ALL {
            assert_eq!(TrainClass::from_label(c.as_str()), Some(c));
        }
        for t in TrainType::ALL {
            assert_eq!(TrainType::from_label(t.as_str()), Some(t));
        }
        for q in Quota::ALL {
            assert_eq!(Quota::from_label(q.as_str()), Some(q));
        }
        for s in TicketStatus::ALL {
            assert_eq!(TicketStatus::from_label(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_serde_labels_match_corpus() {
        let json = serde_json::to_string(&Festival::EidUlFitr).unwrap();
        assert_eq!(json, "\"Eid-ul-Fitr\"");
        let json = serde_json::to_string(&TrainClass::ThreeAc).unwrap();
        assert_eq!(json, "\"3AC\"");
        let json = serde_json::to_string(&TicketStatus::Waitlisted).unwrap();
        assert_eq!(json, "\"WL\"");
    }
}
