//! Gradient boosting with squared-error loss
//!
//! Each round fits a [`RegressionTree`] to the gradients of
//! `0.5 * (prediction - target)²`, shrinks it by the learning rate and adds it
//! to the ensemble. When an evaluation set is supplied, validation RMSE is
//! tracked every round and the forest is truncated to its best round once
//! early stopping fires.

use crate::callback::EarlyStopping;
use crate::gain::GainParams;
use crate::matrix::DenseMatrix;
use crate::tree::{RegressionTree, TreeGrower};
use crate::{BoostError, Result};
use serde::{Deserialize, Serialize};

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoostParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Split regularization
    pub gain: GainParams,
    /// Stop after this many rounds without validation improvement
    pub early_stopping_rounds: Option<usize>,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            gain: GainParams::default(),
            early_stopping_rounds: Some(10),
        }
    }
}

impl BoostParams {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(BoostError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(BoostError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.gain.reg_lambda < 0.0 || self.gain.min_split_gain < 0.0 {
            return Err(BoostError::InvalidParameter(
                "reg_lambda and min_split_gain must be non-negative".to_string(),
            ));
        }
        if self.gain.min_samples_leaf == 0 {
            return Err(BoostError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Held-out data monitored during training
#[derive(Debug, Clone, Copy)]
pub struct EvalSet<'a> {
    pub features: &'a DenseMatrix,
    pub targets: &'a [f64],
}

/// Untrained boosting model
#[derive(Debug, Clone)]
pub struct GradientBoostedRegressor {
    params: BoostParams,
}

/// Fitted ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedForest {
    base_score: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
    /// Validation RMSE per round (empty without an evaluation set)
    eval_history: Vec<f64>,
    best_iteration: Option<usize>,
}

impl GradientBoostedRegressor {
    pub fn new(params: BoostParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &BoostParams {
        &self.params
    }

    /// Fit the ensemble
    pub fn fit(
        &self,
        features: &DenseMatrix,
        targets: &[f64],
        eval_set: Option<EvalSet<'_>>,
    ) -> Result<BoostedForest> {
        check_shapes(features, targets, "training")?;
        if let Some(eval) = &eval_set {
            check_shapes(eval.features, eval.targets, "evaluation")?;
            if eval.features.n_cols() != features.n_cols() {
                return Err(BoostError::InvalidInput(format!(
                    "Evaluation set has {} features, training set has {}",
                    eval.features.n_cols(),
                    features.n_cols()
                )));
            }
        }

        let base_score = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![base_score; targets.len()];
        let mut eval_predictions =
            eval_set.map(|eval| vec![base_score; eval.features.n_rows()]);

        let hess = vec![1.0; targets.len()];
        let mut grad = vec![0.0; targets.len()];
        let mut trees = Vec::with_capacity(self.params.n_estimators);
        let mut eval_history = Vec::new();
        let mut early_stopping = self.params.early_stopping_rounds.map(EarlyStopping::new);

        for _ in 0..self.params.n_estimators {
            for (g, (p, t)) in grad.iter_mut().zip(predictions.iter().zip(targets)) {
                *g = p - t;
            }

            let mut tree =
                TreeGrower::new(features, &grad, &hess, &self.params.gain, self.params.max_depth)
                    .grow((0..targets.len()).collect());
            tree.scale_leaves(self.params.learning_rate);

            for (i, p) in predictions.iter_mut().enumerate() {
                *p += tree.predict_row(features.row(i));
            }

            let mut stop = false;
            if let (Some(eval), Some(eval_preds)) = (&eval_set, eval_predictions.as_mut()) {
                for (i, p) in eval_preds.iter_mut().enumerate() {
                    *p += tree.predict_row(eval.features.row(i));
                }
                let score = rmse(eval_preds, eval.targets);
                eval_history.push(score);
                if let Some(es) = early_stopping.as_mut() {
                    stop = es.should_stop(score);
                }
            }

            trees.push(tree);
            if stop {
                break;
            }
        }

        let best_iteration = match (&early_stopping, eval_set.is_some()) {
            (Some(es), true) => Some(es.best_round()),
            _ => None,
        };
        if let Some(best) = best_iteration {
            trees.truncate(best + 1);
        }

        Ok(BoostedForest {
            base_score,
            n_features: features.n_cols(),
            trees,
            eval_history,
            best_iteration,
        })
    }
}

impl BoostedForest {
    /// Predict a single row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(BoostError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }

        Ok(self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>())
    }

    /// Predict every row of a matrix
    pub fn predict(&self, features: &DenseMatrix) -> Result<Vec<f64>> {
        (0..features.n_rows())
            .map(|i| self.predict_row(features.row(i)))
            .collect()
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn eval_history(&self) -> &[f64] {
        &self.eval_history
    }

    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }
}

fn check_shapes(features: &DenseMatrix, targets: &[f64], label: &str) -> Result<()> {
    if features.is_empty() {
        return Err(BoostError::InsufficientData(format!(
            "The {} set has no rows",
            label
        )));
    }
    if features.n_rows() != targets.len() {
        return Err(BoostError::InvalidInput(format!(
            "The {} set has {} rows but {} targets",
            label,
            features.n_rows(),
            targets.len()
        )));
    }
    if targets.iter().any(|t| !t.is_finite()) {
        return Err(BoostError::InvalidInput(format!(
            "The {} targets contain non-finite values",
            label
        )));
    }
    Ok(())
}

fn rmse(predictions: &[f64], targets: &[f64]) -> f64 {
    let mse = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / targets.len() as f64;
    mse.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_data(n: usize) -> (DenseMatrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets = (0..n).map(|i| 3.0 * i as f64 + 5.0).collect();
        (DenseMatrix::from_rows(&rows).unwrap(), targets)
    }

    #[test]
    fn test_fit_reduces_error() {
        let (x, y) = linear_data(40);
        let model = GradientBoostedRegressor::new(BoostParams {
            n_estimators: 50,
            learning_rate: 0.3,
            max_depth: 3,
            early_stopping_rounds: None,
            ..Default::default()
        })
        .unwrap();

        let forest = model.fit(&x, &y, None).unwrap();
        assert_eq!(forest.n_trees(), 50);
        assert!(forest.best_iteration().is_none());

        let preds = forest.predict(&x).unwrap();
        let baseline = vec![forest.base_score(); y.len()];
        assert!(rmse(&preds, &y) < rmse(&baseline, &y) / 10.0);
    }

    #[test]
    fn test_base_score_is_target_mean() {
        let (x, y) = linear_data(10);
        let forest = GradientBoostedRegressor::new(BoostParams::default())
            .unwrap()
            .fit(&x, &y, None)
            .unwrap();
        assert_relative_eq!(forest.base_score(), 18.5);
    }

    #[test]
    fn test_early_stopping_truncates_forest() {
        let (x, y) = linear_data(30);
        // Evaluation targets the model cannot learn from the training data
        let eval_targets = vec![0.0; 30];
        let model = GradientBoostedRegressor::new(BoostParams {
            n_estimators: 100,
            early_stopping_rounds: Some(3),
            ..Default::default()
        })
        .unwrap();

        let forest = model
            .fit(
                &x,
                &y,
                Some(EvalSet {
                    features: &x,
                    targets: &eval_targets,
                }),
            )
            .unwrap();

        let best = forest.best_iteration().unwrap();
        assert_eq!(forest.n_trees(), best + 1);
        assert!(forest.eval_history().len() < 100);
    }

    #[test]
    fn test_feature_count_checked_on_predict() {
        let (x, y) = linear_data(10);
        let forest = GradientBoostedRegressor::new(BoostParams::default())
            .unwrap()
            .fit(&x, &y, None)
            .unwrap();
        assert!(forest.predict_row(&[1.0]).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let params = BoostParams {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(GradientBoostedRegressor::new(params).is_err());
    }
}
