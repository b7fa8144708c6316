//! Gradient-boosting regressor: mean-initialized ensemble of shallow
//! regression trees fitted on residuals with a constant learning rate.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::decision_tree::{DecisionTree, TreeConfig, TreeTask};
use super::Regressor;
use crate::error::AdvisorError;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 150,
            max_depth: 8,
            learning_rate: 0.1,
            min_samples_split: 5,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// A fitted gradient-boosting regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    /// Initial prediction (target mean)
    init: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl GradientBoostingRegressor {
    /// Fit on `x` against continuous targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &BoostingConfig) -> Result<Self, AdvisorError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AdvisorError::Inference(format!(
                "boosting fit: {} rows against {} targets",
                x.len(),
                y.len()
            )));
        }
        if config.n_estimators == 0 || config.learning_rate <= 0.0 {
            return Err(AdvisorError::Inference(
                "boosting fit: n_estimators and learning_rate must be positive".to_string(),
            ));
        }

        let n_features = x[0].len();
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut predictions = vec![init; y.len()];
        let mut residuals = vec![0.0; y.len()];
        let mut trees = Vec::with_capacity(config.n_estimators);

        for round in 0..config.n_estimators {
            for i in 0..y.len() {
                residuals[i] = y[i] - predictions[i];
            }

            let mut rng = StdRng::seed_from_u64(
                config.seed.wrapping_add(round as u64).wrapping_mul(0x9E37_79B9),
            );
            let tree = DecisionTree::fit(
                x,
                &residuals,
                TreeTask::Regression,
                &tree_config,
                None,
                &mut rng,
            )?;

            for (i, row) in x.iter().enumerate() {
                predictions[i] += config.learning_rate * tree.predict_value(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            learning_rate: config.learning_rate,
            trees,
            n_features,
        })
    }
}

impl Regressor for GradientBoostingRegressor {
    fn predict_row(&self, row: &[f64]) -> Result<f64, AdvisorError> {
        if row.len() != self.n_features {
            return Err(AdvisorError::Inference(format!(
                "boosting predict: row has {} features, model fitted on {}",
                row.len(),
                self.n_features
            )));
        }
        let mut prediction = self.init;
        for tree in &self.trees {
            prediction += self.learning_rate * tree.predict_value(row);
        }
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BoostingConfig {
        BoostingConfig {
            n_estimators: 40,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    #[test]
    fn test_boosting_fits_step_target() {
        let x: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..50).map(|i| if i < 25 { 0.2 } else { 0.8 }).collect();

        let model = GradientBoostingRegressor::fit(&x, &y, &small_config()).unwrap();
        assert!((model.predict_row(&[5.0]).unwrap() - 0.2).abs() < 0.05);
        assert!((model.predict_row(&[40.0]).unwrap() - 0.8).abs() < 0.05);
    }

    #[test]
    fn test_boosting_reduces_training_error_over_mean() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64, (i % 5) as f64]).collect();
        let y: Vec<f64> = (0..60).map(|i| 2.0 * i as f64 + 3.0).collect();
        let mean = y.iter().sum::<f64>() / y.len() as f64;

        let model = GradientBoostingRegressor::fit(&x, &y, &small_config()).unwrap();

        let model_mae: f64 = x
            .iter()
            .zip(&y)
            .map(|(row, &target)| (model.predict_row(row).unwrap() - target).abs())
            .sum::<f64>()
            / y.len() as f64;
        let mean_mae: f64 = y.iter().map(|&t| (t - mean).abs()).sum::<f64>() / y.len() as f64;

        assert!(model_mae < mean_mae / 2.0);
    }

    #[test]
    fn test_row_width_mismatch_is_error() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 1.0]).collect();
        let y: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let model = GradientBoostingRegressor::fit(&x, &y, &small_config()).unwrap();
        assert!(model.predict_row(&[1.0]).is_err());
    }
}
