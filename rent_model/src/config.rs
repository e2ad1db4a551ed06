//! Project configuration
//!
//! A [`Config`] is loaded once at process start and passed by reference into
//! every stage that needs it. Every field has a default, so a JSON file only
//! has to name the values it overrides. Unknown keys are rejected:
//!
//! ```json
//! {
//!   "data": { "train_size": 0.8, "seed": 42 },
//!   "model": {
//!     "hyperparams": {
//!       "n_estimators": 300,
//!       "max_depth": 4,
//!       "gain": { "reg_lambda": 2.0 }
//!     }
//!   },
//!   "paths": { "model": "artifacts/model.json" }
//! }
//! ```

use crate::data::columns;
use crate::error::{RentError, Result};
use boost_math::BoostParams;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "RENT_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub paths: PathsConfig,
}

/// Feature selection and splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Columns kept by preprocessing, before neighborhood encoding
    pub features: Vec<String>,
    /// Name of the target column
    pub target: String,
    /// Fraction of rows used for training
    pub train_size: f64,
    /// Seed for the row shuffle; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            features: [
                columns::NEIGHBORHOOD_ID,
                columns::YEAR_BUILT,
                columns::AREA,
                columns::BEDROOMS,
                columns::BATHROOMS,
                columns::GARDEN_SIZE,
                columns::BALCONY,
                columns::PARKING,
                columns::FURNISHED,
                columns::GARAGE,
                columns::STORAGE,
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            target: columns::RENT.to_string(),
            train_size: 0.75,
            seed: None,
        }
    }
}

/// Model hyperparameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub hyperparams: BoostParams,
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Persisted model artifact
    pub model: PathBuf,
    /// SQLite database holding the raw listings table
    pub database: PathBuf,
    /// Raw listings file used for ingestion
    pub raw_data: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("artifacts/model.json"),
            database: PathBuf::from("data/rentals.db"),
            raw_data: PathBuf::from("data/raw.parquet"),
        }
    }
}

impl Config {
    /// Read and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RentError::InvalidParameter(format!(
                "Cannot open config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `RENT_CONFIG`, or the defaults when unset
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let data = &self.data;
        if !(data.train_size > 0.0 && data.train_size < 1.0) {
            return Err(RentError::InvalidParameter(format!(
                "train_size must be in (0, 1), got {}",
                data.train_size
            )));
        }
        if data.features.is_empty() {
            return Err(RentError::InvalidParameter(
                "At least one feature column is required".to_string(),
            ));
        }
        if data.features.contains(&data.target) {
            return Err(RentError::InvalidParameter(format!(
                "Target '{}' is also listed as a feature",
                data.target
            )));
        }
        self.model.hyperparams.validate()?;
        Ok(())
    }
}
