//! Error types for the rent_model crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the rent_model crate
#[derive(Debug, Error)]
pub enum RentError {
    /// Malformed or incompatible input: garden text, unseen neighborhood,
    /// feature-schema mismatch
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A required artifact does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A pipeline post-condition did not hold
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Error from invalid parameters or configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data loading or shape
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from the listing store
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error while encoding or decoding JSON
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from the boosting library
    #[error("Model error: {0}")]
    ModelError(#[from] boost_math::BoostError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, RentError>;

impl From<PolarsError> for RentError {
    fn from(err: PolarsError) -> Self {
        RentError::PolarsError(err.to_string())
    }
}

impl From<rusqlite::Error> for RentError {
    fn from(err: rusqlite::Error) -> Self {
        RentError::StorageError(err.to_string())
    }
}
