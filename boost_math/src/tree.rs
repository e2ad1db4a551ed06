//! Exact-greedy regression trees
//!
//! Trees are grown depth-first on gradient/hessian statistics. Every
//! candidate threshold is the midpoint between two consecutive distinct
//! feature values, rows with `value < threshold` go left.

use crate::gain::GainParams;
use crate::matrix::DenseMatrix;
use serde::{Deserialize, Serialize};

/// A single tree node, stored in a flat arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree with the root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Best split found for a node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows a single tree from per-row gradients
pub struct TreeGrower<'a> {
    features: &'a DenseMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    gain: &'a GainParams,
    max_depth: usize,
    nodes: Vec<Node>,
}

impl<'a> TreeGrower<'a> {
    pub fn new(
        features: &'a DenseMatrix,
        grad: &'a [f64],
        hess: &'a [f64],
        gain: &'a GainParams,
        max_depth: usize,
    ) -> Self {
        Self {
            features,
            grad,
            hess,
            gain,
            max_depth,
            nodes: Vec::new(),
        }
    }

    /// Grow a tree over the given row subset
    pub fn grow(mut self, rows: Vec<usize>) -> RegressionTree {
        self.grow_node(rows, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn grow_node(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let (grad_sum, hess_sum) = rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            (g + self.grad[r], h + self.hess[r])
        });

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.gain.compute_leaf_weight(grad_sum, hess_sum),
        });

        if depth >= self.max_depth || rows.len() < 2 * self.gain.min_samples_leaf.max(1) {
            return index;
        }

        let Some(split) = self.find_best_split(&rows, grad_sum, hess_sum) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.features.get(r, split.feature) < split.threshold);

        let left = self.grow_node(left_rows, depth + 1);
        let right = self.grow_node(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn find_best_split(
        &self,
        rows: &[usize],
        grad_sum: f64,
        hess_sum: f64,
    ) -> Option<SplitCandidate> {
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..self.features.n_cols() {
            sorted.sort_by(|&a, &b| {
                self.features
                    .get(a, feature)
                    .total_cmp(&self.features.get(b, feature))
            });

            let mut grad_left = 0.0;
            let mut hess_left = 0.0;
            for i in 0..sorted.len() - 1 {
                let row = sorted[i];
                grad_left += self.grad[row];
                hess_left += self.hess[row];

                let value = self.features.get(row, feature);
                let next = self.features.get(sorted[i + 1], feature);
                if value == next {
                    continue;
                }

                let n_left = i + 1;
                let n_right = sorted.len() - n_left;
                let gain = self.gain.compute_gain(
                    grad_left,
                    hess_left,
                    grad_sum - grad_left,
                    hess_sum - hess_left,
                );
                if !self.gain.is_valid_split(gain, n_left, n_right) {
                    continue;
                }

                if best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: value + (next - value) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl RegressionTree {
    /// Multiply every leaf value by `factor` (shrinkage)
    pub fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    /// Raw output of the tree for one row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
