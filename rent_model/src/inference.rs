//! Rent inference service
//!
//! The service starts [`Unloaded`] and becomes [`Loaded`] by reading a model
//! artifact. Only a loaded service can predict. A failed load leaves the
//! unloaded service untouched, so the caller may retry or fall back.
//!
//! ```no_run
//! use rent_model::inference::InferenceService;
//! use rent_model::storage::SqliteStore;
//! # use rent_model::data::RawListing;
//! # fn run(record: &RawListing) -> rent_model::error::Result<()> {
//! let service = InferenceService::new("artifacts/model.json").load()?;
//! let store = SqliteStore::new("data/rentals.db");
//! let rent = service.predict(record, &store)?;
//! # Ok(())
//! # }
//! ```

use crate::boundary::{ListingPayload, RentEstimate};
use crate::data::{columns, records_to_frame, RawListing};
use crate::error::{RentError, Result};
use crate::features::{parse_garden_feature, BinaryEncoder, NO_GARDEN};
use crate::model::TrainedModel;
use crate::neighborhood::{encode_neighborhood_ids, NeighborhoodStats, NeighborhoodStatsSource};
use rand::seq::IteratorRandom;
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// No model loaded yet
#[derive(Debug, Clone, Copy, Default)]
pub struct Unloaded;

/// A model is loaded and ready to predict
#[derive(Debug, Clone)]
pub struct Loaded {
    model: TrainedModel,
}

/// Inference service in state `S`
#[derive(Debug, Clone)]
pub struct InferenceService<S> {
    model_path: PathBuf,
    state: S,
}

impl<S> InferenceService<S> {
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceService<Unloaded> {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            state: Unloaded,
        }
    }

    /// Read the model artifact. A missing artifact is [`RentError::NotFound`].
    pub fn load(&self) -> Result<InferenceService<Loaded>> {
        info!(path = %self.model_path.display(), "loading the trained model");
        let model = TrainedModel::load(&self.model_path)?;
        Ok(InferenceService {
            model_path: self.model_path.clone(),
            state: Loaded { model },
        })
    }
}

impl InferenceService<Loaded> {
    pub fn model(&self) -> &TrainedModel {
        &self.state.model
    }

    /// Estimate the monthly rent of one listing.
    ///
    /// The record goes through the training transforms: binary encoding with
    /// the model's levels, garden parsing and neighborhood encoding against
    /// statistics fetched from `stats`. The result is the prediction rounded
    /// to the nearest integer and clamped at zero.
    pub fn predict<T>(&self, record: &RawListing, stats: &T) -> Result<u32>
    where
        T: NeighborhoodStatsSource + ?Sized,
    {
        let model = &self.state.model;

        let raw = records_to_frame(std::slice::from_ref(record))?;
        let encoded = model.encoder().transform(&raw)?;
        let parsed = parse_garden_feature(&encoded)?;
        let selected = parsed.select(model.input_features()).map_err(|e| {
            RentError::ValidationError(format!("Record lacks a model input: {}", e))
        })?;

        let neighborhoods = stats.fetch_neighborhood_stats()?;
        let features = encode_neighborhood_ids(&selected, &neighborhoods, model.target())?;

        let prediction = model
            .predict_frame(&features)?
            .first()
            .copied()
            .ok_or_else(|| {
                RentError::InvariantViolation("Model returned no prediction".to_string())
            })?;

        let estimate = prediction.round().max(0.0) as u32;
        debug!(prediction, estimate, "estimated rent");
        Ok(estimate)
    }

    /// Validate a boundary payload and estimate its rent
    pub fn estimate<T>(&self, payload: ListingPayload, stats: &T) -> Result<RentEstimate>
    where
        T: NeighborhoodStatsSource + ?Sized,
    {
        let record = payload.into_listing()?;
        self.predict(&record, stats).map(RentEstimate::from)
    }
}

/// Draw a plausible listing: a neighborhood present in `stats`, amenity
/// values from the learned levels and sizes from fixed ranges.
pub fn sample_listing<R: Rng + ?Sized>(
    rng: &mut R,
    stats: &NeighborhoodStats,
    encoder: &BinaryEncoder,
) -> Result<RawListing> {
    let neighborhood_id = stats
        .iter()
        .map(|(id, _)| *id)
        .choose(rng)
        .ok_or_else(|| RentError::DataError("No neighborhoods to sample from".to_string()))?;

    let mut flag = |column: &str| -> String {
        match encoder.levels().get(column) {
            Some(levels) if rng.gen_bool(0.5) => levels.positive.clone(),
            Some(levels) => levels.negative.clone(),
            None => "no".to_string(),
        }
    };
    let balcony = flag(columns::BALCONY);
    let storage = flag(columns::STORAGE);
    let parking = flag(columns::PARKING);
    let furnished = flag(columns::FURNISHED);
    let garage = flag(columns::GARAGE);

    let bedrooms = rng.gen_range(1..6);
    let garden_size: i64 = rng.gen_range(0..500);
    Ok(RawListing {
        address: None,
        neighborhood_id,
        year_built: rng.gen_range(1900..2024),
        area: f64::from(rng.gen_range(20..300_i32)),
        rooms: bedrooms + 1,
        bedrooms,
        bathrooms: f64::from(rng.gen_range(1..4_i32)),
        balcony,
        storage,
        parking,
        furnished,
        garage,
        garden: if garden_size == 0 {
            NO_GARDEN.to_string()
        } else {
            format!("{} m²", garden_size)
        },
        rent: None,
    })
}
