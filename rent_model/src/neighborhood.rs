//! Neighborhood aggregation encoding
//!
//! The high-cardinality `neighborhood_id` is replaced by four statistics
//! computed over every stored listing in that neighborhood. Statistics are
//! recomputed by the [`NeighborhoodStatsSource`] on every fetch. A caller that
//! wants fewer round trips can hold on to a fetched [`NeighborhoodStats`]
//! (which is itself a source), accepting that it goes stale as the corpus
//! changes.

use crate::data::{columns, RawListing};
use crate::error::{RentError, Result};
use crate::features::garden_digits;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Per-neighborhood averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodMeans {
    pub mean_area: f64,
    pub mean_bedrooms: f64,
    pub mean_bathrooms: f64,
    pub mean_garden_size: f64,
}

/// Aggregate table keyed by neighborhood id, ascending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborhoodStats {
    by_id: BTreeMap<i64, NeighborhoodMeans>,
}

/// Anything able to produce the current neighborhood aggregate
pub trait NeighborhoodStatsSource {
    fn fetch_neighborhood_stats(&self) -> Result<NeighborhoodStats>;
}

impl NeighborhoodStatsSource for NeighborhoodStats {
    fn fetch_neighborhood_stats(&self) -> Result<NeighborhoodStats> {
        Ok(self.clone())
    }
}

impl FromIterator<(i64, NeighborhoodMeans)> for NeighborhoodStats {
    fn from_iter<I: IntoIterator<Item = (i64, NeighborhoodMeans)>>(iter: I) -> Self {
        Self {
            by_id: iter.into_iter().collect(),
        }
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    area: f64,
    bedrooms: f64,
    bathrooms: f64,
    garden_size: f64,
}

impl NeighborhoodStats {
    /// Compute the aggregate over an in-memory corpus.
    ///
    /// Garden sizes use the lenient digit rule of the storage aggregate
    /// (non-digits dropped, nothing left counts as 0). A garden size too
    /// large for `i64` fails the whole aggregate.
    pub fn aggregate(records: &[RawListing]) -> Result<Self> {
        let mut acc: BTreeMap<i64, Accumulator> = BTreeMap::new();
        for record in records {
            let entry = acc.entry(record.neighborhood_id).or_default();
            entry.count += 1;
            entry.area += record.area;
            entry.bedrooms += record.bedrooms as f64;
            entry.bathrooms += record.bathrooms;
            entry.garden_size += garden_digits(Some(&record.garden))? as f64;
        }

        Ok(acc
            .into_iter()
            .map(|(id, a)| {
                let n = a.count as f64;
                (
                    id,
                    NeighborhoodMeans {
                        mean_area: a.area / n,
                        mean_bedrooms: a.bedrooms / n,
                        mean_bathrooms: a.bathrooms / n,
                        mean_garden_size: a.garden_size / n,
                    },
                )
            })
            .collect())
    }

    pub fn get(&self, neighborhood_id: i64) -> Option<&NeighborhoodMeans> {
        self.by_id.get(&neighborhood_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i64, &NeighborhoodMeans)> {
        self.by_id.iter()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// The aggregate as a frame, one row per neighborhood
    pub fn to_frame(&self) -> Result<DataFrame> {
        let means: Vec<&NeighborhoodMeans> = self.by_id.values().collect();
        let df = DataFrame::new(vec![
            Series::new(
                columns::NEIGHBORHOOD_ID,
                self.by_id.keys().copied().collect::<Vec<i64>>(),
            ),
            Series::new(
                columns::MEAN_AREA,
                means.iter().map(|m| m.mean_area).collect::<Vec<f64>>(),
            ),
            Series::new(
                columns::MEAN_BEDROOMS,
                means.iter().map(|m| m.mean_bedrooms).collect::<Vec<f64>>(),
            ),
            Series::new(
                columns::MEAN_BATHROOMS,
                means.iter().map(|m| m.mean_bathrooms).collect::<Vec<f64>>(),
            ),
            Series::new(
                columns::MEAN_GARDEN_SIZE,
                means.iter().map(|m| m.mean_garden_size).collect::<Vec<f64>>(),
            ),
        ])?;
        Ok(df)
    }
}

/// Replace `neighborhood_id` with the four neighborhood statistics.
///
/// Behaves as a left join on the id: the row count never changes. The id
/// column is dropped and `target`, when present, is moved to the last
/// position. Any row whose id has no statistics is a validation error.
pub fn encode_neighborhood_ids(
    df: &DataFrame,
    stats: &NeighborhoodStats,
    target: &str,
) -> Result<DataFrame> {
    let ids = df
        .column(columns::NEIGHBORHOOD_ID)?
        .cast(&DataType::Int64)?;

    let mut joined: [Vec<Option<f64>>; 4] = Default::default();
    let mut unseen = BTreeSet::new();
    for (row, id) in ids.i64()?.into_iter().enumerate() {
        let id = id.ok_or_else(|| {
            RentError::ValidationError(format!("Neighborhood id missing at row {}", row))
        })?;

        let means = stats.get(id);
        if means.is_none() {
            unseen.insert(id);
        }
        joined[0].push(means.map(|m| m.mean_area));
        joined[1].push(means.map(|m| m.mean_bedrooms));
        joined[2].push(means.map(|m| m.mean_bathrooms));
        joined[3].push(means.map(|m| m.mean_garden_size));
    }

    if !unseen.is_empty() {
        let ids: Vec<String> = unseen.iter().map(|id| id.to_string()).collect();
        return Err(RentError::ValidationError(format!(
            "No neighborhood statistics for id(s) {}",
            ids.join(", ")
        )));
    }

    let [area, bedrooms, bathrooms, garden_size] = joined;
    let mut out = df.drop(columns::NEIGHBORHOOD_ID)?;
    out.hstack_mut(&[
        Series::new(columns::MEAN_AREA, area),
        Series::new(columns::MEAN_BEDROOMS, bedrooms),
        Series::new(columns::MEAN_BATHROOMS, bathrooms),
        Series::new(columns::MEAN_GARDEN_SIZE, garden_size),
    ])?;

    if out.get_column_names().contains(&target) {
        let target_column = out.drop_in_place(target)?;
        out.with_column(target_column)?;
    }

    debug!(rows = out.height(), columns = out.width(), "encoded neighborhood ids");
    Ok(out)
}
