//! Feature encoding: label encoders, standard scalers, and the single
//! `encode` choke point shared by the training and serving paths.
//!
//! The contract (applied identically at train time and inference time):
//! - Each categorical column has an independently fitted label-to-code
//!   mapping; distinct training values sorted alphabetically get codes
//!   0..k-1. An unseen value at inference falls back to code 0 — a
//!   documented degraded path reported via `fallback_columns`, never a
//!   crash.
//! - Each model owns a fitted standardization (x - mean) / std applied
//!   per column in the order recorded at training time. Any mismatch
//!   between the fitted column list and the presented feature list is a
//!   hard error, never a silent reorder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::AdvisorError;

// ============================================================================
// Raw Records
// ============================================================================

/// A raw field value before encoding.
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Categorical(&'a str),
    Numeric(f64),
}

/// Anything that can hand the encoder raw fields by corpus column name.
///
/// Returning `None` for an unknown column makes feature-list skew fail
/// loudly at the choke point instead of silently defaulting.
pub trait FeatureSource {
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>>;
}

impl FeatureSource for crate::types::TrainingExample {
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
        crate::types::TrainingExample::raw_value(self, column)
    }
}

impl<'a> FeatureSource for BTreeMap<&'a str, RawValue<'a>> {
    fn raw_value(&self, column: &str) -> Option<RawValue<'_>> {
        self.get(column).copied()
    }
}

// ============================================================================
// Label Encoder
// ============================================================================

/// Result of encoding one categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedValue {
    pub code: usize,
    /// True when the value was unseen in training and code 0 was used
    pub fallback_used: bool,
}

/// Label-to-code mapping fitted from the distinct values of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Sorted class labels; index is the code
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit from training values: dedupe, sort alphabetically, assign 0..k-1.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Encode a label. Unseen labels fall back to code 0 with a flag.
    pub fn transform(&self, label: &str) -> EncodedValue {
        match self.classes.binary_search_by(|c| c.as_str().cmp(label)) {
            Ok(code) => EncodedValue {
                code,
                fallback_used: false,
            },
            Err(_) => EncodedValue {
                code: 0,
                fallback_used: true,
            },
        }
    }

    /// Recover the original label for a code seen in training.
    pub fn inverse(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Per-column encoders, keyed by corpus column name.
pub type LabelEncoders = BTreeMap<String, LabelEncoder>;

// ============================================================================
// Standard Scaler
// ============================================================================

/// Per-column standardization fitted at training time.
///
/// The fitted column order is stored and re-verified on every transform;
/// a zero standard deviation divides by 1 instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit from an unscaled matrix whose columns follow `columns` order.
    pub fn fit(columns: &[String], matrix: &[Vec<f64>]) -> Result<Self, AdvisorError> {
        if matrix.is_empty() {
            return Err(AdvisorError::Inference(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }
        let width = columns.len();
        if matrix.iter().any(|row| row.len() != width) {
            return Err(AdvisorError::Inference(format!(
                "scaler fit: matrix rows do not all have {width} columns"
            )));
        }

        let mut means = Vec::with_capacity(width);
        let mut stds = Vec::with_capacity(width);
        for col in 0..width {
            let column: Vec<f64> = matrix.iter().map(|row| row[col]).collect();
            let mean = (&column).mean();
            let std = (&column).std_dev();
            means.push(mean);
            stds.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }

        Ok(Self {
            columns: columns.to_vec(),
            means,
            stds,
        })
    }

    /// Standardize one row in place. The row must match the fitted width.
    pub fn transform_row(&self, row: &mut [f64]) -> Result<(), AdvisorError> {
        if row.len() != self.columns.len() {
            return Err(AdvisorError::Inference(format!(
                "scaler width mismatch: row has {} values, scaler fitted on {}",
                row.len(),
                self.columns.len()
            )));
        }
        for (i, value) in row.iter_mut().enumerate() {
            *value = (*value - self.means[i]) / self.stds[i];
        }
        Ok(())
    }

    /// Column order recorded at fit time.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

// ============================================================================
// Encode Choke Point
// ============================================================================

/// An encoded feature vector plus the columns that needed the unseen-value
/// fallback (empty in the normal path).
#[derive(Debug, Clone)]
pub struct EncodedVector {
    pub values: Vec<f64>,
    pub fallback_columns: Vec<String>,
}

/// Label-encode a record into the unscaled vector for `feature_list`.
///
/// Used directly by training before the scaler exists; inference goes
/// through [`encode`].
pub fn encode_unscaled<S>(
    record: &S,
    feature_list: &[String],
    encoders: &LabelEncoders,
) -> Result<EncodedVector, AdvisorError>
where
    S: FeatureSource + ?Sized,
{
    let mut values = Vec::with_capacity(feature_list.len());
    let mut fallback_columns = Vec::new();

    for name in feature_list {
        let raw = record.raw_value(name).ok_or_else(|| {
            AdvisorError::Inference(format!("feature '{name}' missing from record"))
        })?;
        match raw {
            RawValue::Categorical(label) => {
                let encoder = encoders.get(name).ok_or_else(|| {
                    AdvisorError::Inference(format!("no fitted encoder for column '{name}'"))
                })?;
                let encoded = encoder.transform(label);
                if encoded.fallback_used {
                    fallback_columns.push(name.clone());
                }
                values.push(encoded.code as f64);
            }
            RawValue::Numeric(x) => {
                if !x.is_finite() {
                    return Err(AdvisorError::Inference(format!(
                        "non-finite value for feature '{name}'"
                    )));
                }
                values.push(x);
            }
        }
    }

    Ok(EncodedVector {
        values,
        fallback_columns,
    })
}

/// The single choke point: encode + scale a raw record into the exact
/// numeric vector a model expects. Pure and idempotent.
pub fn encode<S>(
    record: &S,
    feature_list: &[String],
    encoders: &LabelEncoders,
    scaler: &StandardScaler,
) -> Result<EncodedVector, AdvisorError>
where
    S: FeatureSource + ?Sized,
{
    if scaler.columns() != feature_list {
        return Err(AdvisorError::Inference(format!(
            "feature list does not match fitted scaler columns: {:?} vs {:?}",
            feature_list,
            scaler.columns()
        )));
    }

    let mut encoded = encode_unscaled(record, feature_list, encoders)?;
    scaler.transform_row(&mut encoded.values)?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoder_alphabetical_codes() {
        let enc = LabelEncoder::fit(["Sleeper", "General", "3AC", "Sleeper"]);
        assert_eq!(enc.classes(), ["3AC", "General", "Sleeper"]);
        assert_eq!(enc.transform("3AC").code, 0);
        assert_eq!(enc.transform("General").code, 1);
        assert_eq!(enc.transform("Sleeper").code, 2);
    }

    #[test]
    fn test_label_encoder_round_trip() {
        let enc = LabelEncoder::fit(["Diwali", "Holi", "Pongal"]);
        for label in ["Diwali", "Holi", "Pongal"] {
            let e = enc.transform(label);
            assert!(!e.fallback_used);
            assert_eq!(enc.inverse(e.code), Some(label));
        }
    }

    #[test]
    fn test_unseen_label_falls_back_to_zero() {
        let enc = LabelEncoder::fit(["Express", "Mail"]);
        let e = enc.transform("Vande Bharat");
        assert_eq!(e.code, 0);
        assert!(e.fallback_used);
    }

    #[test]
    fn test_scaler_standardizes() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let matrix = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let scaler = StandardScaler::fit(&columns, &matrix).unwrap();

        let mut row = vec![2.0, 20.0];
        scaler.transform_row(&mut row).unwrap();
        assert!(row[0].abs() < 1e-9, "mean value should scale to 0");
        assert!(row[1].abs() < 1e-9);
    }

    #[test]
    fn test_scaler_constant_column_divides_by_one() {
        let columns = vec!["c".to_string()];
        let matrix = vec![vec![7.0], vec![7.0], vec![7.0]];
        let scaler = StandardScaler::fit(&columns, &matrix).unwrap();
        let mut row = vec![7.0];
        scaler.transform_row(&mut row).unwrap();
        assert!(row[0].abs() < 1e-9);
    }

    #[test]
    fn test_scaler_width_mismatch_is_error() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let matrix = vec![vec![1.0, 2.0]];
        let scaler = StandardScaler::fit(&columns, &matrix).unwrap();
        let mut row = vec![1.0];
        assert!(scaler.transform_row(&mut row).is_err());
    }

    #[test]
    fn test_encode_rejects_feature_list_skew() {
        let mut record: BTreeMap<&str, RawValue> = BTreeMap::new();
        record.insert("x", RawValue::Numeric(1.0));
        let features = vec!["x".to_string()];
        let other = vec!["y".to_string()];
        let encoders = LabelEncoders::new();
        let scaler = StandardScaler::fit(&other, &[vec![1.0]]).unwrap();

        assert!(encode(&record, &features, &encoders, &scaler).is_err());
    }

    #[test]
    fn test_encode_reports_fallback_columns() {
        let mut encoders = LabelEncoders::new();
        encoders.insert("festival".to_string(), LabelEncoder::fit(["Diwali", "Holi"]));

        let mut record: BTreeMap<&str, RawValue> = BTreeMap::new();
        record.insert("festival", RawValue::Categorical("Onam"));
        let features = vec!["festival".to_string()];

        let encoded = encode_unscaled(&record, &features, &encoders).unwrap();
        assert_eq!(encoded.values, vec![0.0]);
        assert_eq!(encoded.fallback_columns, vec!["festival".to_string()]);
    }

    #[test]
    fn test_encode_missing_feature_is_error() {
        let record: BTreeMap<&str, RawValue> = BTreeMap::new();
        let features = vec!["absent".to_string()];
        let encoders = LabelEncoders::new();
        assert!(encode_unscaled(&record, &features, &encoders).is_err());
    }
}
