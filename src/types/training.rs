//! Synthetic training rows and the corpus CSV schema.
//!
//! A `TrainingExample` is immutable once generated; the column order of
//! the CSV rendering is fixed and is part of the external interface.

use serde::{Deserialize, Serialize};

use super::journey::{Festival, Quota, RushLevel, TicketStatus, TrainClass, TrainType};
use crate::encoding::RawValue;
use crate::error::AdvisorError;

/// Fixed column order of the training corpus CSV.
pub const CSV_COLUMNS: [&str; 25] = [
    "festival",
    "route",
    "source_city",
    "destination_city",
    "route_distance_km",
    "source_city_tier",
    "destination_city_tier",
    "days_before_festival",
    "days_to_journey",
    "peak_day_proximity",
    "booking_hour",
    "train_class",
    "train_type",
    "quota",
    "ticket_status",
    "current_waitlist_position",
    "is_waitlisted",
    "historical_rush_index",
    "rush_level",
    "confirmation_probability",
    "optimal_booking_window_min",
    "optimal_booking_window_max",
    "flight_price_ratio",
    "bus_available",
    "booking_risk_score",
];

/// One synthetic observation: journey parameters plus derived labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    // Festival & route
    pub festival: Festival,
    pub route: String,
    pub source_city: String,
    pub destination_city: String,
    pub route_distance_km: f64,
    pub source_city_tier: u8,
    pub destination_city_tier: u8,

    // Time features
    pub days_before_festival: u32,
    pub days_to_journey: u32,
    pub peak_day_proximity: u32,
    pub booking_hour: u32,

    // Train details
    pub train_class: TrainClass,
    pub train_type: TrainType,
    pub quota: Quota,

    // Current status
    pub ticket_status: TicketStatus,
    pub current_waitlist_position: u32,
    pub is_waitlisted: bool,

    // Targets
    pub historical_rush_index: f64,
    pub rush_level: RushLevel,
    pub confirmation_probability: f64,

    // Recommendation data
    pub optimal_booking_window_min: u32,
    pub optimal_booking_window_max: u32,
    pub flight_price_ratio: f64,
    pub bus_available: bool,

    // Risk
    pub booking_risk_score: f64,
}

impl TrainingExample {
    /// CSV header line matching [`CSV_COLUMNS`].
    pub fn csv_header() -> String {
        CSV_COLUMNS.join(",")
    }

    /// Render this row in the fixed column order.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{:.2},{},{:.3},{},{},{:.2},{},{:.2}",
            self.festival,
            self.route,
            self.source_city,
            self.destination_city,
            self.route_distance_km,
            self.source_city_tier,
            self.destination_city_tier,
            self.days_before_festival,
            self.days_to_journey,
            self.peak_day_proximity,
            self.booking_hour,
            self.train_class,
            self.train_type,
            self.quota,
            self.ticket_status,
            self.current_waitlist_position,
            self.is_waitlisted,
            self.historical_rush_index,
            self.rush_level,
            self.confirmation_probability,
            self.optimal_booking_window_min,
            self.optimal_booking_window_max,
            self.flight_price_ratio,
            self.bus_available,
            self.booking_risk_score,
        )
    }

    /// Parse one corpus CSV row (no quoting; none of the labels contain commas).
    pub fn parse_csv_row(line: &str) -> Result<Self, AdvisorError> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != CSV_COLUMNS.len() {
            return Err(AdvisorError::Validation(format!(
                "corpus row has {} fields, expected {}",
                fields.len(),
                CSV_COLUMNS.len()
            )));
        }

        fn cat<T>(label: &str, parse: impl Fn(&str) -> Option<T>, col: &str) -> Result<T, AdvisorError> {
            parse(label)
                .ok_or_else(|| AdvisorError::Validation(format!("unknown {col} label '{label}'")))
        }
        fn num<T: std::str::FromStr>(field: &str, col: &str) -> Result<T, AdvisorError> {
            field
                .trim()
                .parse()
                .map_err(|_| AdvisorError::Validation(format!("bad {col} value '{field}'")))
        }

        Ok(Self {
            festival: cat(fields[0], Festival::from_label, "festival")?,
            route: fields[1].to_string(),
            source_city: fields[2].to_string(),
            destination_city: fields[3].to_string(),
            route_distance_km: num(fields[4], "route_distance_km")?,
            source_city_tier: num(fields[5], "source_city_tier")?,
            destination_city_tier: num(fields[6], "destination_city_tier")?,
            days_before_festival: num(fields[7], "days_before_festival")?,
            days_to_journey: num(fields[8], "days_to_journey")?,
            peak_day_proximity: num(fields[9], "peak_day_proximity")?,
            booking_hour: num(fields[10], "booking_hour")?,
            train_class: cat(fields[11], TrainClass::from_label, "train_class")?,
            train_type: cat(fields[12], TrainType::from_label, "train_type")?,
            quota: cat(fields[13], Quota::from_label, "quota")?,
            ticket_status: cat(fields[14], TicketStatus::from_label, "ticket_status")?,
            current_waitlist_position: num(fields[15], "current_waitlist_position")?,
            is_waitlisted: num(fields[16], "is_waitlisted")?,
            historical_rush_index: num(fields[17], "historical_rush_index")?,
            rush_level: cat(fields[18], RushLevel::from_label, "rush_level")?,
            confirmation_probability: num(fields[19], "confirmation_probability")?,
            optimal_booking_window_min: num(fields[20], "optimal_booking_window_min")?,
            optimal_booking_window_max: num(fields[21], "optimal_booking_window_max")?,
            flight_price_ratio: num(fields[22], "flight_price_ratio")?,
            bus_available: num(fields[23], "bus_available")?,
            booking_risk_score: num(fields[24], "booking_risk_score")?,
        })
    }

    /// Raw feature access for the encoder, keyed by corpus column name.
    ///
    /// Categorical columns yield their corpus label; numeric columns yield
    /// their value as `f64`. Returns `None` for unknown column names so
    /// that feature-list skew fails loudly at the encode choke point.
    pub fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
        let v = match column {
            "festival" => RawValue::Categorical(self.festival.as_str()),
            "route" => RawValue::Categorical(&self.route),
            "source_city" => RawValue::Categorical(&self.source_city),
            "destination_city" => RawValue::Categorical(&self.destination_city),
            "train_class" => RawValue::Categorical(self.train_class.as_str()),
            "train_type" => RawValue::Categorical(self.train_type.as_str()),
            "quota" => RawValue::Categorical(self.quota.as_str()),
            "ticket_status" => RawValue::Categorical(self.ticket_status.as_str()),
            "route_distance_km" => RawValue::Numeric(self.route_distance_km),
            "source_city_tier" => RawValue::Numeric(f64::from(self.source_city_tier)),
            "destination_city_tier" => RawValue::Numeric(f64::from(self.destination_city_tier)),
            "days_before_festival" => RawValue::Numeric(f64::from(self.days_before_festival)),
            "days_to_journey" => RawValue::Numeric(f64::from(self.days_to_journey)),
            "peak_day_proximity" => RawValue::Numeric(f64::from(self.peak_day_proximity)),
            "booking_hour" => RawValue::Numeric(f64::from(self.booking_hour)),
            "current_waitlist_position" => {
                RawValue::Numeric(f64::from(self.current_waitlist_position))
            }
            "historical_rush_index" => RawValue::Numeric(self.historical_rush_index),
            _ => return None,
        };
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> TrainingExample {
        TrainingExample {
            festival: Festival::Diwali,
            route: "Delhi-Patna".to_string(),
            source_city: "Delhi".to_string(),
            destination_city: "Patna".to_string(),
            route_distance_km: 1000.0,
            source_city_tier: 1,
            destination_city_tier: 2,
            days_before_festival: 20,
            days_to_journey: 20,
            peak_day_proximity: 15,
            booking_hour: 10,
            train_class: TrainClass::Sleeper,
            train_type: TrainType::Superfast,
            quota: Quota::General,
            ticket_status: TicketStatus::Waitlisted,
            current_waitlist_position: 40,
            is_waitlisted: true,
            historical_rush_index: 82.51,
            rush_level: RushLevel::High,
            confirmation_probability: 0.252,
            optimal_booking_window_min: 45,
            optimal_booking_window_max: 60,
            flight_price_ratio: 2.5,
            bus_available: false,
            booking_risk_score: 0.83,
        }
    }

    #[test]
    fn test_csv_row_column_count_matches_header() {
        let row = sample_row().to_csv_row();
        assert_eq!(row.split(',').count(), CSV_COLUMNS.len());
        assert_eq!(
            TrainingExample::csv_header().split(',').count(),
            CSV_COLUMNS.len()
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let original = sample_row();
        let parsed = TrainingExample::parse_csv_row(&original.to_csv_row()).unwrap();
        assert_eq!(parsed.festival, original.festival);
        assert_eq!(parsed.route, original.route);
        assert_eq!(parsed.current_waitlist_position, 40);
        assert_eq!(parsed.rush_level, RushLevel::High);
        assert!((parsed.historical_rush_index - 82.51).abs() < 1e-9);
        assert!((parsed.confirmation_probability - 0.252).abs() < 1e-9);
        assert_eq!(parsed.bus_available, false);
    }

    #[test]
    fn test_raw_value_unknown_column_is_none() {
        assert!(sample_row().raw_value("no_such_column").is_none());
    }

    #[test]
    fn test_parse_rejects_short_row() {
        assert!(TrainingExample::parse_csv_row("Diwali,only,three").is_err());
    }
}
