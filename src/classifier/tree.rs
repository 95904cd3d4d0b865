//! Second-order regression tree used as the booster's weak learner.
//!
//! Splits maximize the log-loss gain
//! `G_L²/(H_L+λ) + G_R²/(H_R+λ) - G²/(H+λ)`; leaves hold `-G/(H+λ)`.
//! Missing values (NaN) always follow the right branch.

use rayon::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on the rows in `samples`, considering only `features`.
    pub fn fit(
        x: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        samples: &[usize],
        features: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, grad, hess, samples.to_vec(), features, params, 0);
        tree
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        samples: Vec<usize>,
        features: &[usize],
        params: &TreeParams,
        depth: usize,
    ) -> usize {
        let g: f64 = samples.iter().map(|&i| grad[i]).sum();
        let h: f64 = samples.iter().map(|&i| hess[i]).sum();
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: -g / (h + params.lambda),
        });

        if depth >= params.max_depth || samples.len() < 2 {
            return idx;
        }

        let Some(split) = best_split(x, grad, hess, &samples, features, params, g, h) else {
            return idx;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, grad, hess, left_samples, features, params, depth + 1);
        let right = self.grow(x, grad, hess, right_samples, features, params, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

#[allow(clippy::too_many_arguments)]
fn best_split(
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    features: &[usize],
    params: &TreeParams,
    g_total: f64,
    h_total: f64,
) -> Option<SplitCandidate> {
    let parent = score(g_total, h_total, params.lambda);

    features
        .par_iter()
        .filter_map(|&feature| {
            best_split_for_feature(x, grad, hess, samples, feature, params, g_total, h_total, parent)
        })
        .reduce_with(|a, b| {
            // Deterministic regardless of rayon scheduling: higher gain wins,
            // ties go to the lower feature index.
            if b.gain > a.gain || (b.gain == a.gain && b.feature < a.feature) {
                b
            } else {
                a
            }
        })
}

#[allow(clippy::too_many_arguments)]
fn best_split_for_feature(
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    feature: usize,
    params: &TreeParams,
    g_total: f64,
    h_total: f64,
    parent: f64,
) -> Option<SplitCandidate> {
    let mut present: Vec<(f64, usize)> = samples
        .iter()
        .map(|&i| (x[i][feature], i))
        .filter(|(v, _)| !v.is_nan())
        .collect();
    if present.len() < 2 {
        return None;
    }
    present.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut best: Option<SplitCandidate> = None;
    let mut g_left = 0.0;
    let mut h_left = 0.0;

    for w in 0..present.len() - 1 {
        let (value, i) = present[w];
        g_left += grad[i];
        h_left += hess[i];

        let next = present[w + 1].0;
        if next == value {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < params.min_child_weight || h_right < params.min_child_weight {
            continue;
        }

        let gain = score(g_left, h_left, params.lambda) + score(g_right, h_right, params.lambda)
            - parent;
        if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
            best = Some(SplitCandidate {
                feature,
                threshold: (value + next) / 2.0,
                gain,
            });
        }
    }

    best
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 3,
        lambda: 1.0,
        min_child_weight: 0.0,
    };

    #[test]
    fn test_single_threshold_is_found() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        // Negative gradient for the upper half pushes those leaves positive.
        let grad: Vec<f64> = (0..8).map(|i| if i < 4 { 0.5 } else { -0.5 }).collect();
        let hess = vec![0.25; 8];
        let samples: Vec<usize> = (0..8).collect();

        let tree = RegressionTree::fit(&x, &grad, &hess, &samples, &[0], &PARAMS);
        assert!(tree.predict(&[1.0]) < 0.0);
        assert!(tree.predict(&[6.0]) > 0.0);
    }

    #[test]
    fn test_constant_feature_yields_single_leaf() {
        let x = vec![vec![1.0]; 5];
        let grad = vec![0.2, -0.1, 0.3, 0.0, 0.1];
        let hess = vec![0.25; 5];
        let samples: Vec<usize> = (0..5).collect();
        let tree = RegressionTree::fit(&x, &grad, &hess, &samples, &[0], &PARAMS);
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_nan_goes_right() {
        let x: Vec<Vec<f64>> = vec![vec![0.0], vec![0.0], vec![10.0], vec![10.0]];
        let grad = vec![0.5, 0.5, -0.5, -0.5];
        let hess = vec![0.25; 4];
        let tree = RegressionTree::fit(&x, &grad, &hess, &[0, 1, 2, 3], &[0], &PARAMS);
        assert_eq!(tree.predict(&[f64::NAN]), tree.predict(&[10.0]));
    }
}
