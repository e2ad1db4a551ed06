//! Model building: preprocessing, splitting, fitting and the baseline gate

use crate::config::Config;
use crate::error::{RentError, Result};
use crate::metrics::evaluate;
use crate::model::{frame_to_matrix, TrainedModel};
use crate::neighborhood::{encode_neighborhood_ids, NeighborhoodStatsSource};
use crate::preprocessing::preprocess_data;
use crate::split::split_data;
use crate::storage::ListingStore;
use boost_math::{EvalSet, GradientBoostedRegressor};
use tracing::{info, warn};

/// Train, evaluate and, if the model beats the baseline, persist it.
///
/// Reads the corpus and the neighborhood statistics from `store`. The model
/// is written to `config.paths.model` only when its test R² is strictly
/// greater than the R² of predicting the test mean; otherwise nothing is
/// written and an [`RentError::InvariantViolation`] is returned.
pub fn build_model<S>(store: &S, config: &Config) -> Result<TrainedModel>
where
    S: ListingStore + NeighborhoodStatsSource + ?Sized,
{
    config.validate()?;
    let data = &config.data;

    let raw = store.fetch_raw_corpus()?;
    let prepared = preprocess_data(&raw, data)?;

    let stats = store.fetch_neighborhood_stats()?;
    let encoded = encode_neighborhood_ids(&prepared.frame, &stats, &data.target)?;
    let split = split_data(&encoded, &data.target, data.train_size, data.seed)?;

    info!(
        train = split.y_train.len(),
        validation = split.y_val.len(),
        test = split.y_test.len(),
        "Training the gradient boosted model"
    );

    let feature_names: Vec<String> = split
        .x_train
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let x_train = frame_to_matrix(&split.x_train, &feature_names)?;
    let x_val = frame_to_matrix(&split.x_val, &feature_names)?;
    let x_test = frame_to_matrix(&split.x_test, &feature_names)?;

    let regressor = GradientBoostedRegressor::new(config.model.hyperparams.clone())?;
    let forest = regressor.fit(
        &x_train,
        &split.y_train,
        Some(EvalSet {
            features: &x_val,
            targets: &split.y_val,
        }),
    )?;

    let predictions = forest.predict(&x_test)?;
    let evaluation = evaluate(&split.y_test, &predictions)?;
    info!(
        test_r_squared = evaluation.test_r_squared,
        baseline_r_squared = evaluation.baseline_r_squared,
        trees = forest.n_trees(),
        "Evaluated the model on the test split"
    );

    if !evaluation.beats_baseline() {
        warn!("Model does not beat the baseline, not saving it");
        return Err(RentError::InvariantViolation(format!(
            "Test R² {:.2} does not exceed the baseline R² {:.2}",
            evaluation.test_r_squared, evaluation.baseline_r_squared
        )));
    }

    let model = TrainedModel::new(
        data.features.clone(),
        feature_names,
        data.target.clone(),
        prepared.encoder,
        forest,
        evaluation,
    )?;
    model.save(&config.paths.model)?;
    Ok(model)
}

/// Builds the model only when no artifact exists yet
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    config: &'a Config,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Train unless `config.paths.model` already exists. Returns the newly
    /// trained model, or `None` when training was skipped.
    pub fn build_if_missing<S>(&self, store: &S) -> Result<Option<TrainedModel>>
    where
        S: ListingStore + NeighborhoodStatsSource + ?Sized,
    {
        let path = &self.config.paths.model;
        if path.exists() {
            info!(path = %path.display(), "Model artifact exists, skipping training");
            return Ok(None);
        }

        warn!(path = %path.display(), "Model artifact not found, building the model");
        build_model(store, self.config).map(Some)
    }
}
