//! Listing storage
//!
//! The raw listings live in a single SQLite table. Every call opens its own
//! connection and reads or writes the whole result at once; nothing is cached
//! between calls.

use crate::data::{records_to_frame, RawListing};
use crate::error::Result;
use crate::features::garden_digits;
use crate::neighborhood::{NeighborhoodMeans, NeighborhoodStats, NeighborhoodStatsSource};
use polars::prelude::DataFrame;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SQL_CREATE_LISTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    address         TEXT,
    neighborhood_id INTEGER NOT NULL,
    year_built      INTEGER NOT NULL,
    area            REAL    NOT NULL,
    rooms           INTEGER NOT NULL,
    bedrooms        INTEGER NOT NULL,
    bathrooms       REAL    NOT NULL,
    balcony         TEXT    NOT NULL,
    storage         TEXT    NOT NULL,
    parking         TEXT    NOT NULL,
    furnished       TEXT    NOT NULL,
    garage          TEXT    NOT NULL,
    garden          TEXT    NOT NULL,
    rent            INTEGER
)
"#;

const SQL_INSERT_LISTING: &str = r#"
INSERT INTO listings (
    address, neighborhood_id, year_built, area, rooms, bedrooms, bathrooms,
    balcony, storage, parking, furnished, garage, garden, rent
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
"#;

const SQL_SELECT_LISTINGS: &str = r#"
SELECT address, neighborhood_id, year_built, area, rooms, bedrooms, bathrooms,
       balcony, storage, parking, furnished, garage, garden, rent
FROM listings
ORDER BY rowid
"#;

const SQL_NEIGHBORHOOD_STATS: &str = r#"
SELECT neighborhood_id,
       AVG(area),
       AVG(bedrooms),
       AVG(bathrooms),
       AVG(garden_digits(garden))
FROM listings
GROUP BY neighborhood_id
ORDER BY 1
"#;

/// Source of the raw training corpus
pub trait ListingStore {
    /// Every stored listing as a raw frame
    fn fetch_raw_corpus(&self) -> Result<DataFrame>;
}

/// SQLite-backed listing table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&self.path)?;
        conn.create_scalar_function(
            "garden_digits",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                garden_digits(text.as_deref())
                    .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
            },
        )?;
        Ok(conn)
    }

    /// Create the listings table if it does not exist yet
    pub fn create_table(&self) -> Result<()> {
        self.connect()?.execute(SQL_CREATE_LISTINGS, [])?;
        Ok(())
    }

    /// Replace the table contents with `records` in a single transaction.
    ///
    /// Writing the same corpus twice leaves one copy of it.
    pub fn write_listings(&self, records: &[RawListing]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(SQL_CREATE_LISTINGS, [])?;
        let replaced = tx.execute("DELETE FROM listings", [])?;

        {
            let mut stmt = tx.prepare(SQL_INSERT_LISTING)?;
            for r in records {
                stmt.execute(params![
                    r.address,
                    r.neighborhood_id,
                    r.year_built,
                    r.area,
                    r.rooms,
                    r.bedrooms,
                    r.bathrooms,
                    r.balcony,
                    r.storage,
                    r.parking,
                    r.furnished,
                    r.garage,
                    r.garden,
                    r.rent,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            written = records.len(),
            replaced,
            path = %self.path.display(),
            "wrote listings table"
        );
        Ok(records.len())
    }

    /// Every stored listing, in insertion order
    pub fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SQL_SELECT_LISTINGS)?;
        let rows = stmt.query_map([], |row| {
            Ok(RawListing {
                address: row.get(0)?,
                neighborhood_id: row.get(1)?,
                year_built: row.get(2)?,
                area: row.get(3)?,
                rooms: row.get(4)?,
                bedrooms: row.get(5)?,
                bathrooms: row.get(6)?,
                balcony: row.get(7)?,
                storage: row.get(8)?,
                parking: row.get(9)?,
                furnished: row.get(10)?,
                garage: row.get(11)?,
                garden: row.get(12)?,
                rent: row.get(13)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

impl ListingStore for SqliteStore {
    fn fetch_raw_corpus(&self) -> Result<DataFrame> {
        let records = self.fetch_listings()?;
        debug!(rows = records.len(), "fetched raw corpus");
        records_to_frame(&records)
    }
}

impl NeighborhoodStatsSource for SqliteStore {
    fn fetch_neighborhood_stats(&self) -> Result<NeighborhoodStats> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SQL_NEIGHBORHOOD_STATS)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                NeighborhoodMeans {
                    mean_area: row.get(1)?,
                    mean_bedrooms: row.get(2)?,
                    mean_bathrooms: row.get(3)?,
                    mean_garden_size: row.get(4)?,
                },
            ))
        })?;

        let stats = rows.collect::<rusqlite::Result<NeighborhoodStats>>()?;
        debug!(neighborhoods = stats.len(), "fetched neighborhood statistics");
        Ok(stats)
    }
}

/// Listing store over an in-memory corpus
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<RawListing>,
}

impl InMemoryStore {
    pub fn new(records: Vec<RawListing>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RawListing] {
        &self.records
    }
}

impl ListingStore for InMemoryStore {
    fn fetch_raw_corpus(&self) -> Result<DataFrame> {
        records_to_frame(&self.records)
    }
}

impl NeighborhoodStatsSource for InMemoryStore {
    fn fetch_neighborhood_stats(&self) -> Result<NeighborhoodStats> {
        NeighborhoodStats::aggregate(&self.records)
    }
}
