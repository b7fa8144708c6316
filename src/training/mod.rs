//! Offline batch training of the model trio.
//!
//! Fits the shared label encoders, then for each model its own scaler and
//! estimator over its own feature subset. Evaluation metrics (accuracy,
//! MAE, R²) are logged for every run; a failure aborts the run with
//! diagnostics. Training is one-shot and never concurrent with serving.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::encoding::{self, LabelEncoder, LabelEncoders, StandardScaler};
use crate::error::AdvisorError;
use crate::model::{
    BoostingConfig, Classifier, ForestConfig, GradientBoostingRegressor, RandomForestClassifier,
    Regressor,
};
use crate::types::TrainingExample;

// ============================================================================
// Feature Subsets (the model contract; order is load-bearing)
// ============================================================================

/// Rush classifier features, in training order.
pub const RUSH_FEATURES: [&str; 9] = [
    "festival",
    "days_before_festival",
    "route_distance_km",
    "source_city_tier",
    "destination_city_tier",
    "peak_day_proximity",
    "train_class",
    "train_type",
    "historical_rush_index",
];

/// Confirmation regressor features, in training order.
pub const CONFIRM_FEATURES: [&str; 7] = [
    "current_waitlist_position",
    "days_to_journey",
    "train_type",
    "quota",
    "train_class",
    "historical_rush_index",
    "ticket_status",
];

/// Booking-window regressor features, in training order.
pub const BOOKING_FEATURES: [&str; 6] = [
    "festival",
    "route_distance_km",
    "source_city_tier",
    "destination_city_tier",
    "train_class",
    "historical_rush_index",
];

/// Columns with fitted label encoders.
pub const CATEGORICAL_COLUMNS: [&str; 7] = [
    "festival",
    "train_class",
    "train_type",
    "quota",
    "ticket_status",
    "source_city",
    "destination_city",
];

// ============================================================================
// Configuration & Report
// ============================================================================

/// Hyperparameters for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub seed: u64,
    /// Held-out fraction for evaluation metrics
    pub test_fraction: f64,
    pub rush: ForestConfig,
    pub confirm: BoostingConfig,
    pub booking: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            rush: ForestConfig {
                n_trees: 200,
                max_depth: 15,
                min_samples_split: 5,
                min_samples_leaf: 2,
                seed: 42,
            },
            confirm: BoostingConfig {
                n_estimators: 150,
                max_depth: 8,
                learning_rate: 0.1,
                min_samples_split: 5,
                min_samples_leaf: 1,
                seed: 42,
            },
            booking: BoostingConfig {
                n_estimators: 100,
                max_depth: 6,
                learning_rate: 0.1,
                min_samples_split: 2,
                min_samples_leaf: 1,
                seed: 42,
            },
        }
    }
}

impl TrainingConfig {
    /// Small ensembles for fast test runs; same pipeline, same contract.
    pub fn fast(seed: u64) -> Self {
        Self {
            seed,
            test_fraction: 0.2,
            rush: ForestConfig {
                n_trees: 25,
                max_depth: 10,
                min_samples_split: 4,
                min_samples_leaf: 2,
                seed,
            },
            confirm: BoostingConfig {
                n_estimators: 40,
                max_depth: 4,
                learning_rate: 0.1,
                min_samples_split: 4,
                min_samples_leaf: 1,
                seed,
            },
            booking: BoostingConfig {
                n_estimators: 30,
                max_depth: 4,
                learning_rate: 0.1,
                min_samples_split: 4,
                min_samples_leaf: 1,
                seed,
            },
        }
    }
}

/// Evaluation metrics from one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub rush_accuracy: f64,
    pub confirm_mae: f64,
    pub confirm_r2: f64,
    pub booking_mae: f64,
    pub booking_r2: f64,
}

/// Everything a training run produces; persisted as versioned artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifacts {
    pub rush_model: RandomForestClassifier,
    pub confirm_model: GradientBoostingRegressor,
    pub booking_model: GradientBoostingRegressor,
    pub label_encoders: LabelEncoders,
    pub rush_target_encoder: LabelEncoder,
    pub rush_scaler: StandardScaler,
    pub confirm_scaler: StandardScaler,
    pub booking_scaler: StandardScaler,
    pub rush_features: Vec<String>,
    pub confirm_features: Vec<String>,
    pub booking_features: Vec<String>,
    /// (feature name, weight) in training-feature order
    pub rush_feature_importance: Vec<(String, f64)>,
    pub report: TrainingReport,
}

// ============================================================================
// Training Pipeline
// ============================================================================

/// Train the model trio from generated rows.
pub fn train(rows: &[TrainingExample], config: &TrainingConfig) -> Result<TrainedArtifacts, AdvisorError> {
    if rows.len() < 50 {
        return Err(AdvisorError::Validation(format!(
            "training needs at least 50 rows (got {})",
            rows.len()
        )));
    }

    info!(samples = rows.len(), "training model trio");

    // Shared label encoders, one per categorical column.
    let mut label_encoders = LabelEncoders::new();
    for column in CATEGORICAL_COLUMNS {
        let values: Vec<String> = rows
            .iter()
            .filter_map(|row| match row.raw_value(column) {
                Some(crate::encoding::RawValue::Categorical(s)) => Some(s.to_string()),
                _ => None,
            })
            .collect();
        label_encoders.insert(column.to_string(), LabelEncoder::fit(values));
    }

    // Target encoder for rush level labels.
    let rush_target_encoder =
        LabelEncoder::fit(rows.iter().map(|row| row.rush_level.as_str()));
    let n_classes = rush_target_encoder.len();

    // --- Model 1: rush level classifier --------------------------------
    let rush_features: Vec<String> = RUSH_FEATURES.iter().map(|s| s.to_string()).collect();
    let (rush_matrix, rush_scaler) =
        encode_and_scale(rows, &rush_features, &label_encoders)?;
    let rush_targets: Vec<f64> = rows
        .iter()
        .map(|row| rush_target_encoder.transform(row.rush_level.as_str()).code as f64)
        .collect();

    let split = Split::new(rows.len(), config.test_fraction, config.seed);
    let rush_model = RandomForestClassifier::fit(
        &split.take(&rush_matrix, SplitSide::Train),
        &split.take_targets(&rush_targets, SplitSide::Train),
        n_classes,
        &config.rush,
    )?;

    let rush_accuracy = accuracy(
        &rush_model,
        &split.take(&rush_matrix, SplitSide::Test),
        &split.take_targets(&rush_targets, SplitSide::Test),
    )?;
    info!(accuracy = rush_accuracy, "rush classifier trained");

    let rush_feature_importance: Vec<(String, f64)> = rush_features
        .iter()
        .cloned()
        .zip(rush_model.feature_importances().iter().copied())
        .collect();

    // --- Model 2: confirmation probability regressor -------------------
    let confirm_features: Vec<String> = CONFIRM_FEATURES.iter().map(|s| s.to_string()).collect();
    let (confirm_matrix, confirm_scaler) =
        encode_and_scale(rows, &confirm_features, &label_encoders)?;
    let confirm_targets: Vec<f64> = rows.iter().map(|row| row.confirmation_probability).collect();

    let confirm_model = GradientBoostingRegressor::fit(
        &split.take(&confirm_matrix, SplitSide::Train),
        &split.take_targets(&confirm_targets, SplitSide::Train),
        &config.confirm,
    )?;
    let (confirm_mae, confirm_r2) = regression_metrics(
        &confirm_model,
        &split.take(&confirm_matrix, SplitSide::Test),
        &split.take_targets(&confirm_targets, SplitSide::Test),
    )?;
    info!(
        mae = confirm_mae,
        r2 = confirm_r2,
        "confirmation regressor trained"
    );

    // --- Model 3: booking window regressor (window midpoint target) ----
    let booking_features: Vec<String> = BOOKING_FEATURES.iter().map(|s| s.to_string()).collect();
    let (booking_matrix, booking_scaler) =
        encode_and_scale(rows, &booking_features, &label_encoders)?;
    let booking_targets: Vec<f64> = rows
        .iter()
        .map(|row| {
            f64::from(row.optimal_booking_window_min + row.optimal_booking_window_max) / 2.0
        })
        .collect();

    let booking_model = GradientBoostingRegressor::fit(
        &split.take(&booking_matrix, SplitSide::Train),
        &split.take_targets(&booking_targets, SplitSide::Train),
        &config.booking,
    )?;
    let (booking_mae, booking_r2) = regression_metrics(
        &booking_model,
        &split.take(&booking_matrix, SplitSide::Test),
        &split.take_targets(&booking_targets, SplitSide::Test),
    )?;
    info!(
        mae = booking_mae,
        r2 = booking_r2,
        "booking window regressor trained"
    );

    Ok(TrainedArtifacts {
        rush_model,
        confirm_model,
        booking_model,
        label_encoders,
        rush_target_encoder,
        rush_scaler,
        confirm_scaler,
        booking_scaler,
        rush_features,
        confirm_features,
        booking_features,
        rush_feature_importance,
        report: TrainingReport {
            samples: rows.len(),
            rush_accuracy,
            confirm_mae,
            confirm_r2,
            booking_mae,
            booking_r2,
        },
    })
}

/// Encode all rows for one model's feature list, fit that model's scaler
/// on the unscaled matrix, and return the scaled matrix with the scaler.
fn encode_and_scale(
    rows: &[TrainingExample],
    feature_list: &[String],
    encoders: &LabelEncoders,
) -> Result<(Vec<Vec<f64>>, StandardScaler), AdvisorError> {
    let mut matrix = Vec::with_capacity(rows.len());
    for row in rows {
        matrix.push(encoding::encode_unscaled(row, feature_list, encoders)?.values);
    }

    let scaler = StandardScaler::fit(feature_list, &matrix)?;
    for row in &mut matrix {
        scaler.transform_row(row)?;
    }
    Ok((matrix, scaler))
}

// ============================================================================
// Train/Test Split & Metrics
// ============================================================================

#[derive(Clone, Copy)]
enum SplitSide {
    Train,
    Test,
}

struct Split {
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl Split {
    fn new(n: usize, test_fraction: f64, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        let test_indices = indices.split_off(n - n_test);
        Self {
            train_indices: indices,
            test_indices,
        }
    }

    fn indices(&self, side: SplitSide) -> &[usize] {
        match side {
            SplitSide::Train => &self.train_indices,
            SplitSide::Test => &self.test_indices,
        }
    }

    fn take(&self, matrix: &[Vec<f64>], side: SplitSide) -> Vec<Vec<f64>> {
        self.indices(side).iter().map(|&i| matrix[i].clone()).collect()
    }

    fn take_targets(&self, targets: &[f64], side: SplitSide) -> Vec<f64> {
        self.indices(side).iter().map(|&i| targets[i]).collect()
    }
}

fn accuracy(
    model: &RandomForestClassifier,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<f64, AdvisorError> {
    let mut correct = 0usize;
    for (row, &target) in x.iter().zip(y) {
        if model.predict_class(row)? == target as usize {
            correct += 1;
        }
    }
    Ok(correct as f64 / x.len() as f64)
}

fn regression_metrics(
    model: &GradientBoostingRegressor,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<(f64, f64), AdvisorError> {
    let mut abs_err = 0.0;
    let mut ss_res = 0.0;
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let mut ss_tot = 0.0;

    for (row, &target) in x.iter().zip(y) {
        let pred = model.predict_row(row)?;
        abs_err += (pred - target).abs();
        ss_res += (pred - target).powi(2);
        ss_tot += (target - mean).powi(2);
    }

    let mae = abs_err / y.len() as f64;
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    Ok((mae, r2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;

    #[test]
    fn test_training_produces_consistent_artifacts() {
        let rows = generator::generate(400, 42).unwrap();
        let artifacts = train(&rows, &TrainingConfig::fast(42)).unwrap();

        assert_eq!(artifacts.rush_features, RUSH_FEATURES.to_vec());
        assert_eq!(artifacts.confirm_features, CONFIRM_FEATURES.to_vec());
        assert_eq!(artifacts.booking_features, BOOKING_FEATURES.to_vec());

        // Scaler columns must mirror each model's feature list exactly
        assert_eq!(artifacts.rush_scaler.columns(), &artifacts.rush_features[..]);
        assert_eq!(
            artifacts.confirm_scaler.columns(),
            &artifacts.confirm_features[..]
        );
        assert_eq!(
            artifacts.booking_scaler.columns(),
            &artifacts.booking_features[..]
        );

        assert_eq!(
            artifacts.rush_feature_importance.len(),
            RUSH_FEATURES.len()
        );
        assert!(artifacts
            .rush_feature_importance
            .iter()
            .all(|(_, w)| *w >= 0.0));

        // A corpus this size separates the classes reasonably well
        assert!(artifacts.report.rush_accuracy > 0.5);
        assert!(artifacts.report.confirm_mae < 0.3);
    }

    #[test]
    fn test_training_rejects_tiny_corpus() {
        let rows = generator::generate(10, 42).unwrap();
        assert!(train(&rows, &TrainingConfig::fast(42)).is_err());
    }

    #[test]
    fn test_rush_target_encoder_covers_all_levels() {
        let rows = generator::generate(400, 42).unwrap();
        let artifacts = train(&rows, &TrainingConfig::fast(42)).unwrap();

        // Alphabetical label order: High, Low, Medium
        let classes = artifacts.rush_target_encoder.classes();
        assert!(classes.len() >= 2);
        let mut sorted = classes.to_vec();
        sorted.sort();
        assert_eq!(classes, &sorted[..]);
    }
}
