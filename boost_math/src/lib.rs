//! # Boost Math
//!
//! Gradient-boosted regression trees for dense tabular data.
//! This crate provides a dense feature matrix, an exact-greedy regression
//! tree learner and a squared-error boosting loop with early stopping.

use thiserror::Error;

pub mod booster;
pub mod callback;
pub mod gain;
pub mod matrix;
pub mod tree;

pub use booster::{BoostParams, BoostedForest, EvalSet, GradientBoostedRegressor};
pub use matrix::DenseMatrix;

/// Errors that can occur while fitting or evaluating a boosted model
#[derive(Error, Debug)]
pub enum BoostError {
    #[error("Insufficient data for training: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for boosting operations
pub type Result<T> = std::result::Result<T, BoostError>;
