//! Statistical models behind the fit/predict contract.
//!
//! The advisory pipeline treats the learners as swappable black boxes:
//! a classifier exposes `predict_class` / `predict_distribution`, a
//! regressor exposes `predict_row`. The concrete implementations here are
//! a CART decision tree, a random-forest classifier built on it, and a
//! gradient-boosting regressor built on it.
//!
//! ## Architecture
//! - `decision_tree`: binary CART splits (gini / variance), bounded depth
//! - `forest`: bootstrap-aggregated classification trees with
//!   impurity-based feature importance, fitted in parallel via rayon
//! - `boosting`: residual-fitted shallow regression trees

pub mod boosting;
pub mod decision_tree;
pub mod forest;

pub use boosting::{BoostingConfig, GradientBoostingRegressor};
pub use decision_tree::{DecisionTree, TreeConfig, TreeTask};
pub use forest::{ForestConfig, RandomForestClassifier};

use crate::error::AdvisorError;

/// Continuous-output estimator.
pub trait Regressor {
    fn predict_row(&self, row: &[f64]) -> Result<f64, AdvisorError>;
}

/// Multi-class estimator with per-class probabilities.
pub trait Classifier {
    fn predict_class(&self, row: &[f64]) -> Result<usize, AdvisorError>;
    fn predict_distribution(&self, row: &[f64]) -> Result<Vec<f64>, AdvisorError>;
}
