//! Split gain and leaf weight computation

use serde::{Deserialize, Serialize};

/// Regularization and splitting constraints shared by every tree in a forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GainParams {
    /// L2 regularization on leaf weights (lambda)
    pub reg_lambda: f64,
    /// Minimum gain required to keep a split (gamma)
    pub min_split_gain: f64,
    /// Minimum number of rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1.0,
            min_split_gain: 0.0,
            min_samples_leaf: 1,
        }
    }
}

impl GainParams {
    /// Structure score of a node: `G² / (H + λ)`
    #[inline]
    fn score(&self, grad: f64, hess: f64) -> f64 {
        grad * grad / (hess + self.reg_lambda)
    }

    /// XGBoost gain formula.
    ///
    /// ```text
    /// gain = 0.5 * [G_L²/(H_L + λ) + G_R²/(H_R + λ) - G_P²/(H_P + λ)]
    /// ```
    #[inline]
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
    ) -> f64 {
        let grad_parent = grad_left + grad_right;
        let hess_parent = hess_left + hess_right;
        0.5 * (self.score(grad_left, hess_left) + self.score(grad_right, hess_right)
            - self.score(grad_parent, hess_parent))
    }

    /// Whether a candidate split satisfies the constraints
    #[inline]
    pub fn is_valid_split(&self, gain: f64, n_left: usize, n_right: usize) -> bool {
        n_left >= self.min_samples_leaf
            && n_right >= self.min_samples_leaf
            && gain > self.min_split_gain
            && gain > 1e-12
    }

    /// Optimal leaf weight: `-G / (H + λ)`
    #[inline]
    pub fn compute_leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        let denom = hess_sum + self.reg_lambda;
        if denom <= 0.0 {
            0.0
        } else {
            -grad_sum / denom
        }
    }
}
