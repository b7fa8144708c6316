//! Model artifact store and the inference context loaded from it.
//!
//! Artifacts live in a sled database, one JSON-serialized value per
//! namespaced key. Every key in [`keys::REQUIRED`] must be present for
//! the advisory composer to initialize; a missing or malformed key is a
//! fatal startup failure, never a degraded serve.
//!
//! The [`InferenceContext`] is constructed once at startup and treated as
//! read-only for the life of the process; request handling borrows it and
//! mutates nothing.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::encoding::{LabelEncoder, LabelEncoders, StandardScaler};
use crate::error::AdvisorError;
use crate::model::{GradientBoostingRegressor, RandomForestClassifier};
use crate::training::{TrainedArtifacts, TrainingReport};

/// Artifact key namespace.
pub mod keys {
    pub const RUSH_CLASSIFIER: &str = "rush_classifier";
    pub const CONFIRMATION_REGRESSOR: &str = "confirmation_regressor";
    pub const BOOKING_WINDOW_REGRESSOR: &str = "booking_window_regressor";
    pub const LABEL_ENCODERS: &str = "label_encoders";
    pub const RUSH_TARGET_ENCODER: &str = "rush_target_encoder";
    pub const RUSH_SCALER: &str = "rush_scaler";
    pub const CONFIRM_SCALER: &str = "confirm_scaler";
    pub const BOOKING_SCALER: &str = "booking_scaler";
    pub const RUSH_FEATURES: &str = "rush_features";
    pub const CONFIRM_FEATURES: &str = "confirm_features";
    pub const BOOKING_FEATURES: &str = "booking_features";
    pub const RUSH_FEATURE_IMPORTANCE: &str = "rush_feature_importance";
    /// Optional: evaluation metrics of the producing run
    pub const TRAINING_REPORT: &str = "training_report";

    /// Keys that must all be present for serving.
    pub const REQUIRED: [&str; 12] = [
        RUSH_CLASSIFIER,
        CONFIRMATION_REGRESSOR,
        BOOKING_WINDOW_REGRESSOR,
        LABEL_ENCODERS,
        RUSH_TARGET_ENCODER,
        RUSH_SCALER,
        CONFIRM_SCALER,
        BOOKING_SCALER,
        RUSH_FEATURES,
        CONFIRM_FEATURES,
        BOOKING_FEATURES,
        RUSH_FEATURE_IMPORTANCE,
    ];
}

// ============================================================================
// Artifact Store
// ============================================================================

/// Namespaced blob store for model artifacts (sled + JSON values).
pub struct ArtifactStore {
    db: sled::Db,
}

impl ArtifactStore {
    /// Open or create the artifact database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AdvisorError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temp() -> Result<Self, AdvisorError> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Self { db })
    }

    /// Store one artifact under its key.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AdvisorError> {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key, bytes)?;
        Ok(())
    }

    /// Load one artifact; a missing key is a configuration error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, AdvisorError> {
        let bytes = self
            .db
            .get(key)?
            .ok_or_else(|| AdvisorError::Configuration(format!("missing artifact '{key}'")))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AdvisorError::Configuration(format!("malformed artifact '{key}': {e}"))
        })
    }

    /// Load one optional artifact (`None` when absent).
    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AdvisorError> {
        match self.db.get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                AdvisorError::Configuration(format!("malformed artifact '{key}': {e}"))
            }),
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool, AdvisorError> {
        Ok(self.db.contains_key(key)?)
    }

    pub fn remove(&self, key: &str) -> Result<(), AdvisorError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// Persist a full training run under the documented key set.
    pub fn save(&self, artifacts: &TrainedArtifacts) -> Result<(), AdvisorError> {
        self.put(keys::RUSH_CLASSIFIER, &artifacts.rush_model)?;
        self.put(keys::CONFIRMATION_REGRESSOR, &artifacts.confirm_model)?;
        self.put(keys::BOOKING_WINDOW_REGRESSOR, &artifacts.booking_model)?;
        self.put(keys::LABEL_ENCODERS, &artifacts.label_encoders)?;
        self.put(keys::RUSH_TARGET_ENCODER, &artifacts.rush_target_encoder)?;
        self.put(keys::RUSH_SCALER, &artifacts.rush_scaler)?;
        self.put(keys::CONFIRM_SCALER, &artifacts.confirm_scaler)?;
        self.put(keys::BOOKING_SCALER, &artifacts.booking_scaler)?;
        self.put(keys::RUSH_FEATURES, &artifacts.rush_features)?;
        self.put(keys::CONFIRM_FEATURES, &artifacts.confirm_features)?;
        self.put(keys::BOOKING_FEATURES, &artifacts.booking_features)?;
        self.put(
            keys::RUSH_FEATURE_IMPORTANCE,
            &artifacts.rush_feature_importance,
        )?;
        self.put(keys::TRAINING_REPORT, &artifacts.report)?;
        self.db.flush()?;

        info!(keys = keys::REQUIRED.len(), "persisted model artifacts");
        Ok(())
    }

    /// Load and validate the complete inference context.
    pub fn load_context(&self) -> Result<InferenceContext, AdvisorError> {
        let context = InferenceContext {
            rush_model: self.get(keys::RUSH_CLASSIFIER)?,
            confirm_model: self.get(keys::CONFIRMATION_REGRESSOR)?,
            booking_model: self.get(keys::BOOKING_WINDOW_REGRESSOR)?,
            label_encoders: self.get(keys::LABEL_ENCODERS)?,
            rush_target_encoder: self.get(keys::RUSH_TARGET_ENCODER)?,
            rush_scaler: self.get(keys::RUSH_SCALER)?,
            confirm_scaler: self.get(keys::CONFIRM_SCALER)?,
            booking_scaler: self.get(keys::BOOKING_SCALER)?,
            rush_features: self.get(keys::RUSH_FEATURES)?,
            confirm_features: self.get(keys::CONFIRM_FEATURES)?,
            booking_features: self.get(keys::BOOKING_FEATURES)?,
            rush_feature_importance: self.get(keys::RUSH_FEATURE_IMPORTANCE)?,
            report: self.get_optional(keys::TRAINING_REPORT)?,
        };
        context.validate()?;
        info!("inference context loaded");
        Ok(context)
    }
}

// ============================================================================
// Inference Context
// ============================================================================

/// Immutable bundle of everything serving needs, built once at startup.
///
/// Each model owns its own scaler and feature list; they are not shared,
/// since each model sees a different feature subset and therefore
/// different scaling statistics.
#[derive(Debug, Clone)]
pub struct InferenceContext {
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
    pub rush_feature_importance: Vec<(String, f64)>,
    pub report: Option<TrainingReport>,
}

impl InferenceContext {
    /// Cross-artifact consistency checks. A mismatch between a model's
    /// persisted feature list and its scaler columns means the artifact
    /// set is torn; refuse to serve rather than silently reorder.
    fn validate(&self) -> Result<(), AdvisorError> {
        for (name, features, scaler) in [
            ("rush", &self.rush_features, &self.rush_scaler),
            ("confirm", &self.confirm_features, &self.confirm_scaler),
            ("booking", &self.booking_features, &self.booking_scaler),
        ] {
            if scaler.columns() != &features[..] {
                return Err(AdvisorError::Configuration(format!(
                    "{name} feature list does not match its scaler columns"
                )));
            }
        }
        if self.rush_target_encoder.len() != self.rush_model.n_classes() {
            return Err(AdvisorError::Configuration(
                "rush target encoder does not match classifier class count".to_string(),
            ));
        }
        if self.rush_feature_importance.len() != self.rush_features.len() {
            return Err(AdvisorError::Configuration(
                "rush feature importance does not cover the feature list".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;
    use crate::training::{self, TrainingConfig};

    fn trained() -> TrainedArtifacts {
        let rows = generator::generate(300, 42).unwrap();
        training::train(&rows, &TrainingConfig::fast(42)).unwrap()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = ArtifactStore::open_temp().unwrap();
        let artifacts = trained();
        store.save(&artifacts).unwrap();

        let context = store.load_context().unwrap();
        assert_eq!(context.rush_features, artifacts.rush_features);
        assert_eq!(context.rush_target_encoder.classes(), artifacts.rush_target_encoder.classes());
        assert!(context.report.is_some());
    }

    #[test]
    fn test_missing_key_fails_loudly() {
        let store = ArtifactStore::open_temp().unwrap();
        store.save(&trained()).unwrap();
        store.remove(keys::CONFIRM_SCALER).unwrap();

        let err = store.load_context().unwrap_err();
        assert!(matches!(err, AdvisorError::Configuration(_)));
        assert!(err.to_string().contains("confirm_scaler"));
    }

    #[test]
    fn test_empty_store_fails() {
        let store = ArtifactStore::open_temp().unwrap();
        assert!(store.load_context().is_err());
    }

    #[test]
    fn test_torn_artifacts_rejected() {
        let store = ArtifactStore::open_temp().unwrap();
        store.save(&trained()).unwrap();
        // Overwrite one feature list so it no longer matches its scaler
        store
            .put(keys::RUSH_FEATURES, &vec!["festival".to_string()])
            .unwrap();

        let err = store.load_context().unwrap_err();
        assert!(matches!(err, AdvisorError::Configuration(_)));
    }
}
