//! Random-forest classifier: bootstrap-aggregated CART trees with
//! per-split feature subsampling and impurity-based feature importance.
//!
//! Trees are fitted in parallel via rayon; each tree derives its RNG
//! deterministically from the forest seed, so a fixed seed reproduces the
//! same forest regardless of thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::{DecisionTree, TreeConfig, TreeTask};
use super::Classifier;
use crate::error::AdvisorError;

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// A fitted random-forest classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
    /// Per-feature importance, normalized to sum to 1 over non-zero totals
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    /// Fit on `x` against class-index targets `y` (values in 0..n_classes).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        n_classes: usize,
        config: &ForestConfig,
    ) -> Result<Self, AdvisorError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AdvisorError::Inference(format!(
                "forest fit: {} rows against {} targets",
                x.len(),
                y.len()
            )));
        }
        if config.n_trees == 0 {
            return Err(AdvisorError::Inference(
                "forest fit: n_trees must be positive".to_string(),
            ));
        }

        let n_features = x[0].len();
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let features_per_split = ((n_features as f64).sqrt().round() as usize).max(1);
        let task = TreeTask::Classification { n_classes };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(
                    config.seed.wrapping_add(tree_idx as u64).wrapping_mul(0x9E37_79B9),
                );
                let (xb, yb) = bootstrap(x, y, &mut rng);
                DecisionTree::fit(
                    &xb,
                    &yb,
                    task,
                    &tree_config,
                    Some(features_per_split),
                    &mut rng,
                )
            })
            .collect::<Result<_, _>>()?;

        let mut totals = vec![0.0; n_features];
        for tree in &trees {
            for (feature, &imp) in tree.importances().iter().enumerate() {
                totals[feature] += imp;
            }
        }
        let sum: f64 = totals.iter().sum();
        let feature_importances = if sum > 0.0 {
            totals.iter().map(|t| t / sum).collect()
        } else {
            totals
        };

        Ok(Self {
            trees,
            n_classes,
            n_features,
            feature_importances,
        })
    }

    /// Average of per-tree leaf distributions.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, AdvisorError> {
        if row.len() != self.n_features {
            return Err(AdvisorError::Inference(format!(
                "forest predict: row has {} features, model fitted on {}",
                row.len(),
                self.n_features
            )));
        }
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (class, p) in tree.leaf_distribution(row).iter().enumerate() {
                probs[class] += p;
            }
        }
        let n = self.trees.len() as f64;
        for p in &mut probs {
            *p /= n;
        }
        Ok(probs)
    }

    /// Importance weights, one per input feature (non-negative, sums to 1).
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl Classifier for RandomForestClassifier {
    fn predict_class(&self, row: &[f64]) -> Result<usize, AdvisorError> {
        let probs = self.predict_proba(row)?;
        let class = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(class, _)| class)
            .ok_or_else(|| AdvisorError::Inference("empty class distribution".to_string()))?;
        Ok(class)
    }

    fn predict_distribution(&self, row: &[f64]) -> Result<Vec<f64>, AdvisorError> {
        self.predict_proba(row)
    }
}

/// Sample n rows with replacement.
fn bootstrap(x: &[Vec<f64>], y: &[f64], rng: &mut StdRng) -> (Vec<Vec<f64>>, Vec<f64>) {
    let n = x.len();
    let mut xb = Vec::with_capacity(n);
    let mut yb = Vec::with_capacity(n);
    for _ in 0..n {
        let i = rng.gen_range(0..n);
        xb.push(x[i].clone());
        yb.push(y[i]);
    }
    (xb, yb)
}
