//! CART decision tree used by both the forest and the booster.
//!
//! Binary splits on numeric features; gini impurity for classification,
//! variance for regression. Class targets are passed as class indices in
//! `f64` form. Impurity-decrease sums per feature are accumulated during
//! fitting for the explainability surface.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// Split-stopping parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

/// Target kind for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeTask {
    Classification { n_classes: usize },
    Regression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Regression mean, or majority class index for classification
        value: f64,
        /// Normalized class frequencies (empty for regression)
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted CART tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    task: TreeTask,
    root: Node,
    n_features: usize,
    /// Unnormalized impurity-decrease sums per feature
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Fit a tree on `x` (row-major) against targets `y`.
    ///
    /// `features_per_split` limits the candidate features evaluated at
    /// each split (random-forest subsampling); `None` considers all.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        task: TreeTask,
        config: &TreeConfig,
        features_per_split: Option<usize>,
        rng: &mut StdRng,
    ) -> Result<Self, AdvisorError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AdvisorError::Inference(format!(
                "tree fit: {} rows against {} targets",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(AdvisorError::Inference(
                "tree fit: ragged or empty feature matrix".to_string(),
            ));
        }
        if let TreeTask::Classification { n_classes } = task {
            if n_classes < 2 {
                return Err(AdvisorError::Inference(
                    "tree fit: classification needs at least 2 classes".to_string(),
                ));
            }
        }

        let mut builder = Builder {
            x,
            y,
            task,
            config: *config,
            n_features,
            features_per_split: features_per_split
                .map(|k| k.clamp(1, n_features))
                .unwrap_or(n_features),
            total_samples: x.len() as f64,
            importances: vec![0.0; n_features],
            rng,
        };

        let indices: Vec<usize> = (0..x.len()).collect();
        let root = builder.build(&indices, 0);
        let importances = builder.importances;

        Ok(Self {
            task,
            root,
            n_features,
            importances,
        })
    }

    /// Regression value, or class index as `f64` for classification.
    pub fn predict_value(&self, row: &[f64]) -> f64 {
        self.leaf_for(row).0
    }

    /// Class frequency distribution at the matched leaf (classification only).
    pub fn leaf_distribution(&self, row: &[f64]) -> &[f64] {
        self.leaf_for(row).1
    }

    fn leaf_for(&self, row: &[f64]) -> (f64, &[f64]) {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf {
                    value,
                    distribution,
                } => return (*value, distribution),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn task(&self) -> TreeTask {
        self.task
    }

    /// Unnormalized per-feature impurity decrease accumulated at fit time.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

// ============================================================================
// Recursive Builder
// ============================================================================

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    task: TreeTask,
    config: TreeConfig,
    n_features: usize,
    features_per_split: usize,
    total_samples: f64,
    importances: Vec<f64>,
    rng: &'a mut StdRng,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Builder<'_> {
    fn build(&mut self, indices: &[usize], depth: usize) -> Node {
        let impurity = self.impurity(indices);

        let stop = depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-12;

        if !stop {
            if let Some(split) = self.best_split(indices, impurity) {
                self.importances[split.feature] +=
                    (indices.len() as f64 / self.total_samples) * split.gain;
                let left = self.build(&split.left, depth + 1);
                let right = self.build(&split.right, depth + 1);
                return Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            }
        }

        self.leaf(indices)
    }

    fn leaf(&self, indices: &[usize]) -> Node {
        match self.task {
            TreeTask::Regression => {
                let mean =
                    indices.iter().map(|&i| self.y[i]).sum::<f64>() / indices.len() as f64;
                Node::Leaf {
                    value: mean,
                    distribution: Vec::new(),
                }
            }
            TreeTask::Classification { n_classes } => {
                let counts = self.class_counts(indices, n_classes);
                let n = indices.len() as f64;
                let distribution: Vec<f64> = counts.iter().map(|&c| c as f64 / n).collect();
                let majority = counts
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, &c)| c)
                    .map(|(class, _)| class)
                    .unwrap_or(0);
                Node::Leaf {
                    value: majority as f64,
                    distribution,
                }
            }
        }
    }

    fn class_counts(&self, indices: &[usize], n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; n_classes];
        for &i in indices {
            let class = self.y[i] as usize;
            if class < n_classes {
                counts[class] += 1;
            }
        }
        counts
    }

    fn impurity(&self, indices: &[usize]) -> f64 {
        match self.task {
            TreeTask::Classification { n_classes } => {
                let counts = self.class_counts(indices, n_classes);
                gini(&counts, indices.len())
            }
            TreeTask::Regression => {
                let n = indices.len() as f64;
                let sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
                let sum_sq: f64 = indices.iter().map(|&i| self.y[i] * self.y[i]).sum();
                (sum_sq / n - (sum / n).powi(2)).max(0.0)
            }
        }
    }

    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<SplitCandidate> {
        let candidates = if self.features_per_split < self.n_features {
            sample(self.rng, self.n_features, self.features_per_split).into_vec()
        } else {
            (0..self.n_features).collect()
        };

        let mut best: Option<(usize, f64, f64)> = None;

        for feature in candidates {
            if let Some((threshold, gain)) = self.best_threshold(indices, feature, parent_impurity)
            {
                let replace = best.map_or(true, |(_, _, g)| gain > g);
                if replace {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        let (feature, threshold, gain) = best?;
        let (mut left, mut right) = (Vec::new(), Vec::new());
        for &i in indices {
            if self.x[i][feature] <= threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        Some(SplitCandidate {
            feature,
            threshold,
            gain,
            left,
            right,
        })
    }

    /// Sorted sweep over one feature; returns (threshold, gain) of the best
    /// valid split, honoring min_samples_leaf.
    fn best_threshold(
        &self,
        indices: &[usize],
        feature: usize,
        parent_impurity: f64,
    ) -> Option<(f64, f64)> {
        let n = indices.len();
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (self.x[i][feature], self.y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut best: Option<(f64, f64)> = None;

        match self.task {
            TreeTask::Classification { n_classes } => {
                let mut left_counts = vec![0usize; n_classes];
                let mut right_counts = vec![0usize; n_classes];
                for &(_, target) in &pairs {
                    let class = target as usize;
                    if class < n_classes {
                        right_counts[class] += 1;
                    }
                }

                for k in 0..n - 1 {
                    let class = pairs[k].1 as usize;
                    if class < n_classes {
                        left_counts[class] += 1;
                        right_counts[class] -= 1;
                    }
                    if pairs[k].0 == pairs[k + 1].0 {
                        continue;
                    }
                    let (nl, nr) = (k + 1, n - k - 1);
                    if nl < self.config.min_samples_leaf || nr < self.config.min_samples_leaf {
                        continue;
                    }
                    let weighted = (nl as f64 * gini(&left_counts, nl)
                        + nr as f64 * gini(&right_counts, nr))
                        / n as f64;
                    let gain = parent_impurity - weighted;
                    if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                        best = Some(((pairs[k].0 + pairs[k + 1].0) / 2.0, gain));
                    }
                }
            }
            TreeTask::Regression => {
                let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
                let total_sum_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
                let mut left_sum = 0.0;
                let mut left_sum_sq = 0.0;

                for k in 0..n - 1 {
                    left_sum += pairs[k].1;
                    left_sum_sq += pairs[k].1 * pairs[k].1;
                    if pairs[k].0 == pairs[k + 1].0 {
                        continue;
                    }
                    let (nl, nr) = (k + 1, n - k - 1);
                    if nl < self.config.min_samples_leaf || nr < self.config.min_samples_leaf {
                        continue;
                    }
                    let var_l = variance_from_sums(left_sum, left_sum_sq, nl);
                    let var_r =
                        variance_from_sums(total_sum - left_sum, total_sum_sq - left_sum_sq, nr);
                    let weighted = (nl as f64 * var_l + nr as f64 * var_r) / n as f64;
                    let gain = parent_impurity - weighted;
                    if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                        best = Some(((pairs[k].0 + pairs[k + 1].0) / 2.0, gain));
                    }
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn variance_from_sums(sum: f64, sum_sq: f64, n: usize) -> f64 {
    let n = n as f64;
    (sum_sq / n - (sum / n).powi(2)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_classification_separable() {
        // Two well-separated clusters on one feature
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![if i < 10 { 0.0 + i as f64 * 0.1 } else { 5.0 + i as f64 * 0.1 }])
            .collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 0.0 } else { 1.0 }).collect();

        let tree = DecisionTree::fit(
            &x,
            &y,
            TreeTask::Classification { n_classes: 2 },
            &TreeConfig::default(),
            None,
            &mut rng(),
        )
        .unwrap();

        assert_eq!(tree.predict_value(&[0.5]), 0.0);
        assert_eq!(tree.predict_value(&[6.0]), 1.0);
        let dist = tree.leaf_distribution(&[0.5]);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_regression_step_function() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 10.0 } else { 50.0 }).collect();

        let tree = DecisionTree::fit(
            &x,
            &y,
            TreeTask::Regression,
            &TreeConfig::default(),
            None,
            &mut rng(),
        )
        .unwrap();

        assert!((tree.predict_value(&[5.0]) - 10.0).abs() < 1e-9);
        assert!((tree.predict_value(&[30.0]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_importance_goes_to_splitting_feature() {
        // Feature 1 carries all the signal; feature 0 is constant
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| if i < 15 { 0.0 } else { 1.0 }).collect();

        let tree = DecisionTree::fit(
            &x,
            &y,
            TreeTask::Classification { n_classes: 2 },
            &TreeConfig::default(),
            None,
            &mut rng(),
        )
        .unwrap();

        assert!(tree.importances()[1] > 0.0);
        assert!(tree.importances()[0].abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_ragged_matrix() {
        let x = vec![vec![1.0, 2.0], vec![1.0]];
        let y = vec![0.0, 1.0];
        assert!(DecisionTree::fit(
            &x,
            &y,
            TreeTask::Regression,
            &TreeConfig::default(),
            None,
            &mut rng(),
        )
        .is_err());
    }
}
