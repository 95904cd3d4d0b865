//! Gradient-boosted tree classifier on binary log-loss.
//!
//! 1. Start from the log-odds of the positive rate.
//! 2. Each round: gradients `p - y`, hessians `p(1-p)`, fit a regression
//!    tree on a row/column subsample, add `learning_rate * tree`.
//! 3. `P(y=1) = sigmoid(margin)`; predict 1 when `P >= 0.5`.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::tree::{RegressionTree, TreeParams};
use super::ClassifierError;

/// Hyperparameters for [`GradientBoostedClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows sampled per tree.
    pub subsample: f64,
    /// Fraction of feature columns sampled per tree.
    pub colsample_bytree: f64,
    pub min_child_weight: f64,
    /// L2 regularization on leaf values.
    pub lambda: f64,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 5,
            learning_rate: 0.1,
            subsample: 0.9,
            colsample_bytree: 0.9,
            min_child_weight: 1.0,
            lambda: 1.0,
            seed: 42,
        }
    }
}

impl BoosterParams {
    fn validate(&self) -> Result<(), ClassifierError> {
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ClassifierError::InvalidParams(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(ClassifierError::InvalidParams(format!(
                "colsample_bytree must be in (0, 1], got {}",
                self.colsample_bytree
            )));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(ClassifierError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Clamp for the initial margin of a single-class training set.
const MAX_BASE_MARGIN: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostedClassifier {
    params: BoosterParams,
    base_margin: f64,
    trees: Vec<RegressionTree>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl GradientBoostedClassifier {
    /// Fit on a dense row-major matrix and binary labels.
    pub fn fit(
        params: BoosterParams,
        x: &[Vec<f64>],
        y: &[u8],
    ) -> Result<Self, ClassifierError> {
        params.validate()?;
        if x.len() != y.len() {
            return Err(ClassifierError::ShapeMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if x.is_empty() {
            return Err(ClassifierError::NoSamples);
        }

        let n_samples = x.len();
        let n_features = x[0].len();
        if let Some(bad) = x.iter().position(|r| r.len() != n_features) {
            return Err(ClassifierError::RaggedRow {
                row: bad,
                expected: n_features,
            });
        }

        let positives = y.iter().filter(|&&l| l == 1).count();
        let p = positives as f64 / n_samples as f64;
        let base_margin = if p <= 0.0 {
            -MAX_BASE_MARGIN
        } else if p >= 1.0 {
            MAX_BASE_MARGIN
        } else {
            (p / (1.0 - p)).ln().clamp(-MAX_BASE_MARGIN, MAX_BASE_MARGIN)
        };

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            lambda: params.lambda,
            min_child_weight: params.min_child_weight,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut margins = vec![base_margin; n_samples];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let all_features: Vec<usize> = (0..n_features).collect();
        let n_cols = ((n_features as f64 * params.colsample_bytree).ceil() as usize)
            .clamp(n_features.min(1), n_features.max(1));

        for _ in 0..params.n_estimators {
            let mut grad = Vec::with_capacity(n_samples);
            let mut hess = Vec::with_capacity(n_samples);
            for (m, &label) in margins.iter().zip(y) {
                let prob = sigmoid(*m);
                grad.push(prob - f64::from(label));
                hess.push((prob * (1.0 - prob)).max(1e-16));
            }

            let mut samples: Vec<usize> = (0..n_samples)
                .filter(|_| params.subsample >= 1.0 || rng.gen::<f64>() < params.subsample)
                .collect();
            if samples.is_empty() {
                samples = (0..n_samples).collect();
            }

            let mut features: Vec<usize> = all_features
                .choose_multiple(&mut rng, n_cols.min(n_features))
                .copied()
                .collect();
            features.sort_unstable();

            let tree = RegressionTree::fit(x, &grad, &hess, &samples, &features, &tree_params);
            for (m, row) in margins.iter_mut().zip(x) {
                *m += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            params,
            base_margin,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict_margin(&self, row: &[f64]) -> f64 {
        self.trees.iter().fold(self.base_margin, |acc, t| {
            acc + self.params.learning_rate * t.predict(row)
        })
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.predict_margin(row))
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }

    pub fn predict_batch(&self, x: &[Vec<f64>]) -> Vec<u8> {
        x.iter().map(|row| self.predict(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> BoosterParams {
        BoosterParams {
            n_estimators: 30,
            max_depth: 3,
            ..BoosterParams::default()
        }
    }

    #[test]
    fn test_learns_threshold_rule() {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<u8> = (0..60).map(|i| u8::from(i >= 30)).collect();
        let model = GradientBoostedClassifier::fit(small_params(), &x, &y).unwrap();

        assert_eq!(model.n_trees(), 30);
        assert_eq!(model.predict(&[5.0, 5.0]), 0);
        assert_eq!(model.predict(&[55.0, 6.0]), 1);
        let correct = model
            .predict_batch(&x)
            .iter()
            .zip(&y)
            .filter(|(p, a)| p == a)
            .count();
        assert!(correct >= 57, "only {correct}/60 correct");
    }

    #[test]
    fn test_single_class_is_constant() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = vec![0u8; 10];
        let model = GradientBoostedClassifier::fit(small_params(), &x, &y).unwrap();
        assert!(x.iter().all(|r| model.predict(r) == 0));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![(i * 37 % 11) as f64, i as f64]).collect();
        let y: Vec<u8> = (0..40).map(|i| u8::from(i * 37 % 11 > 5)).collect();
        let a = GradientBoostedClassifier::fit(small_params(), &x, &y).unwrap();
        let b = GradientBoostedClassifier::fit(small_params(), &x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_feature_matrix() {
        let x = vec![Vec::<f64>::new(); 4];
        let y = vec![1, 1, 1, 0];
        let model = GradientBoostedClassifier::fit(small_params(), &x, &y).unwrap();
        assert_eq!(model.predict(&[]), 1);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            GradientBoostedClassifier::fit(small_params(), &[], &[]).unwrap_err(),
            ClassifierError::NoSamples
        );
        assert!(matches!(
            GradientBoostedClassifier::fit(small_params(), &[vec![1.0]], &[1, 0]),
            Err(ClassifierError::ShapeMismatch { .. })
        ));
        let params = BoosterParams {
            subsample: 0.0,
            ..small_params()
        };
        assert!(matches!(
            GradientBoostedClassifier::fit(params, &[vec![1.0]], &[1]),
            Err(ClassifierError::InvalidParams(_))
        ));
    }
}
