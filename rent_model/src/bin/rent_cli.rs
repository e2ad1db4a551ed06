//! # rent_cli
//!
//! Command-line interface for ingesting listings, training the rent model and
//! estimating rents.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rent_model::boundary::{ListingPayload, RentEstimate};
use rent_model::config::Config;
use rent_model::data::DataLoader;
use rent_model::inference::{sample_listing, InferenceService};
use rent_model::logging::init_tracing;
use rent_model::neighborhood::NeighborhoodStatsSource;
use rent_model::storage::SqliteStore;
use rent_model::training::{build_model, ModelBuilder};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rent_cli")]
#[command(about = "Amsterdam rental price estimation", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to $RENT_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load raw listings into the database, replacing its contents
    Ingest {
        /// Input file (CSV or parquet); defaults to the configured raw data path
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Train and save the model if it beats the baseline
    Train {
        /// Retrain even if a model artifact already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Estimate the rent of one listing given as JSON
    Predict {
        /// Listing payload, e.g. '{"neighborhood_id": 12, ...}'
        #[arg(short, long)]
        payload: String,
    },

    /// Estimate the rent of a randomly drawn listing
    Sample,
}

fn main() -> anyhow::Result<()> {
    if let Err(err) = init_tracing() {
        eprintln!("Logging disabled: {}", err);
    }
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    let store = SqliteStore::new(&config.paths.database);

    match cli.command {
        Commands::Ingest { input } => {
            let input = input.unwrap_or_else(|| config.paths.raw_data.clone());
            let raw = DataLoader::from_path(&input)
                .with_context(|| format!("Failed to read '{}'", input.display()))?;
            let records = DataLoader::records_from_frame(&raw)?;
            let written = store.write_listings(&records)?;
            info!(rows = written, "Ingested raw listings");
        }
        Commands::Train { force } => {
            if force {
                build_model(&store, &config).context("Model building failed")?;
            } else if ModelBuilder::new(&config)
                .build_if_missing(&store)
                .context("Model building failed")?
                .is_none()
            {
                println!(
                    "Model already exists at '{}', use --force to retrain",
                    config.paths.model.display()
                );
            }
        }
        Commands::Predict { payload } => {
            let payload = ListingPayload::from_json(&payload)?;
            let service = InferenceService::new(&config.paths.model).load()?;
            let estimate = service.estimate(payload, &store)?;
            println!("{}", serde_json::to_string(&estimate)?);
        }
        Commands::Sample => {
            let service = InferenceService::new(&config.paths.model).load()?;
            let stats = store.fetch_neighborhood_stats()?;
            let record =
                sample_listing(&mut rand::thread_rng(), &stats, service.model().encoder())?;
            info!(?record, "Drew a random listing");

            let estimate = RentEstimate::from(service.predict(&record, &stats)?);
            println!("{}", serde_json::to_string(&estimate)?);
        }
    }

    Ok(())
}
