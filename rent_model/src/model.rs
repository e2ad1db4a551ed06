//! Persisted rent model
//!
//! A [`TrainedModel`] bundles the fitted forest with everything serving needs
//! to rebuild the training-time feature vector: the ordered feature names,
//! the target name and the learned binary levels. It is written once by the
//! trainer as a single JSON document and read whole by the inference service.

use crate::data::column_as_f64;
use crate::error::{RentError, Result};
use crate::features::BinaryEncoder;
use crate::metrics::EvaluationResult;
use boost_math::{BoostedForest, DenseMatrix};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// A fitted model together with its feature contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Columns selected from a raw record before neighborhood encoding
    input_features: Vec<String>,
    feature_names: Vec<String>,
    target: String,
    encoder: BinaryEncoder,
    forest: BoostedForest,
    test_r_squared: f64,
    baseline_r_squared: f64,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn new(
        input_features: Vec<String>,
        feature_names: Vec<String>,
        target: String,
        encoder: BinaryEncoder,
        forest: BoostedForest,
        evaluation: EvaluationResult,
    ) -> Result<Self> {
        if feature_names.len() != forest.n_features() {
            return Err(RentError::InvariantViolation(format!(
                "{} feature names for a forest of {} features",
                feature_names.len(),
                forest.n_features()
            )));
        }

        Ok(Self {
            input_features,
            feature_names,
            target,
            encoder,
            forest,
            test_r_squared: evaluation.test_r_squared,
            baseline_r_squared: evaluation.baseline_r_squared,
            trained_at: Utc::now(),
        })
    }

    /// Raw-side feature columns, as configured at training time
    pub fn input_features(&self) -> &[String] {
        &self.input_features
    }

    /// Feature names in the order the forest expects them
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Binary levels learned from the training corpus
    pub fn encoder(&self) -> &BinaryEncoder {
        &self.encoder
    }

    pub fn forest(&self) -> &BoostedForest {
        &self.forest
    }

    pub fn evaluation(&self) -> EvaluationResult {
        EvaluationResult {
            test_r_squared: self.test_r_squared,
            baseline_r_squared: self.baseline_r_squared,
        }
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Arrange `df` into the forest's feature matrix.
    ///
    /// The columns of `df` must be exactly the recorded feature names; they
    /// are reordered as needed. Extra or missing columns are a validation
    /// error.
    pub fn feature_matrix(&self, df: &DataFrame) -> Result<DenseMatrix> {
        let expected: BTreeSet<&str> = self.feature_names.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = df.get_column_names().into_iter().collect();

        let missing: Vec<&str> = expected.difference(&actual).copied().collect();
        let extra: Vec<&str> = actual.difference(&expected).copied().collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(RentError::ValidationError(format!(
                "Feature columns do not match the model (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                extra.join(", ")
            )));
        }

        frame_to_matrix(df, &self.feature_names)
    }

    /// Raw (unrounded) predictions for every row of `df`
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let matrix = self.feature_matrix(df)?;
        Ok(self.forest.predict(&matrix)?)
    }

    /// Write the model as JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path = %path.display(), trees = self.forest.n_trees(), "saved model");
        Ok(())
    }

    /// Read a model written by [`TrainedModel::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RentError::NotFound(format!(
                "No model artifact at '{}'",
                path.display()
            )));
        }

        let reader = BufReader::new(File::open(path)?);
        let model: TrainedModel = serde_json::from_reader(reader)?;
        if model.feature_names.len() != model.forest.n_features() {
            return Err(RentError::InvariantViolation(format!(
                "Model at '{}' records {} feature names for {} features",
                path.display(),
                model.feature_names.len(),
                model.forest.n_features()
            )));
        }
        Ok(model)
    }
}

/// Row-major matrix of the `names` columns of `df`, in that order
pub(crate) fn frame_to_matrix(df: &DataFrame, names: &[String]) -> Result<DenseMatrix> {
    let columns = names
        .iter()
        .map(|name| {
            column_as_f64(df, name)?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| {
                        RentError::ValidationError(format!(
                            "Feature '{}' is missing at row {}",
                            name, row
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let n_rows = df.height();
    let mut data = Vec::with_capacity(n_rows * columns.len());
    for row in 0..n_rows {
        data.extend(columns.iter().map(|col| col[row]));
    }
    Ok(DenseMatrix::new(data, n_rows, columns.len())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boost_math::{BoostParams, GradientBoostedRegressor};
    use tempfile::tempdir;

    fn fitted() -> TrainedModel {
        let x = DenseMatrix::from_rows(&[
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 30.0],
            vec![4.0, 40.0],
        ])
        .unwrap();
        let y = vec![100.0, 200.0, 300.0, 400.0];
        let forest = GradientBoostedRegressor::new(BoostParams::default())
            .unwrap()
            .fit(&x, &y, None)
            .unwrap();
        TrainedModel::new(
            vec!["area".to_string(), "neighborhood_id".to_string()],
            vec!["area".to_string(), "mean_area".to_string()],
            "rent".to_string(),
            BinaryEncoder::default(),
            forest,
            EvaluationResult {
                test_r_squared: 0.9,
                baseline_r_squared: 0.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_columns_are_reordered() {
        let model = fitted();
        let df = DataFrame::new(vec![
            Series::new("mean_area", vec![20.0]),
            Series::new("area", vec![2i64]),
        ])
        .unwrap();
        let matrix = model.feature_matrix(&df).unwrap();
        assert_eq!(matrix.row(0), &[2.0, 20.0]);
    }

    #[test]
    fn test_extra_and_missing_columns_rejected() {
        let model = fitted();
        let df = DataFrame::new(vec![
            Series::new("area", vec![2.0]),
            Series::new("rooms", vec![3.0]),
        ])
        .unwrap();
        let err = model.feature_matrix(&df).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, RentError::ValidationError(_)));
        assert!(msg.contains("mean_area"));
        assert!(msg.contains("rooms"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = fitted();

        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.feature_names(), model.feature_names());
        assert_eq!(loaded.target(), "rent");
        assert_eq!(loaded.forest().n_trees(), model.forest().n_trees());

        let df = DataFrame::new(vec![
            Series::new("area", vec![3.0]),
            Series::new("mean_area", vec![30.0]),
        ])
        .unwrap();
        let before = model.predict_frame(&df).unwrap();
        let after = loaded.predict_frame(&df).unwrap();
        assert!((before[0] - after[0]).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            TrainedModel::load(dir.path().join("absent.json")),
            Err(RentError::NotFound(_))
        ));
    }
}
