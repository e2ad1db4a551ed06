//! # Rent Model
//!
//! Rental price estimation for Amsterdam listings.
//!
//! ## Features
//!
//! - Raw listing ingestion from CSV or parquet into a SQLite table
//! - Garden size parsing and binary encoding of yes/no amenities
//! - Neighborhood encoding with per-neighborhood averages of the stored corpus
//! - Train/validation/test splitting and gradient boosted regression trees
//! - A baseline gate: a model is only saved when it beats predicting the mean
//! - Typestate inference service returning whole-euro estimates
//!
//! ## Quick Start
//!
//! ```no_run
//! use rent_model::config::Config;
//! use rent_model::inference::InferenceService;
//! use rent_model::storage::SqliteStore;
//! use rent_model::training::build_model;
//! # use rent_model::data::RawListing;
//! # fn run(listing: &RawListing) -> rent_model::error::Result<()> {
//!
//! let config = Config::load()?;
//! let store = SqliteStore::new(&config.paths.database);
//!
//! // Train, evaluate against the baseline and save the artifact
//! build_model(&store, &config)?;
//!
//! // Serve
//! let service = InferenceService::new(&config.paths.model).load()?;
//! let rent = service.predict(listing, &store)?;
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod inference;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod neighborhood;
pub mod preprocessing;
pub mod split;
pub mod storage;
pub mod training;

// Re-export commonly used types
pub use crate::boundary::{ListingPayload, RentEstimate};
pub use crate::config::Config;
pub use crate::data::{DataLoader, RawListing};
pub use crate::error::{RentError, Result};
pub use crate::inference::{InferenceService, Loaded, Unloaded};
pub use crate::model::TrainedModel;
pub use crate::neighborhood::{NeighborhoodStats, NeighborhoodStatsSource};
pub use crate::storage::{InMemoryStore, ListingStore, SqliteStore};
pub use crate::training::{build_model, ModelBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
