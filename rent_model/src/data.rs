//! Raw listing records and tabular loading

use crate::error::{RentError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Column names shared by storage, preprocessing and inference
pub mod columns {
    pub const ADDRESS: &str = "address";
    pub const NEIGHBORHOOD_ID: &str = "neighborhood_id";
    pub const YEAR_BUILT: &str = "year_built";
    pub const AREA: &str = "area";
    pub const ROOMS: &str = "rooms";
    pub const BEDROOMS: &str = "bedrooms";
    pub const BATHROOMS: &str = "bathrooms";
    pub const BALCONY: &str = "balcony";
    pub const STORAGE: &str = "storage";
    pub const PARKING: &str = "parking";
    pub const FURNISHED: &str = "furnished";
    pub const GARAGE: &str = "garage";
    pub const GARDEN: &str = "garden";
    pub const GARDEN_SIZE: &str = "garden_size";
    pub const RENT: &str = "rent";

    pub const MEAN_AREA: &str = "mean_area";
    pub const MEAN_BEDROOMS: &str = "mean_bedrooms";
    pub const MEAN_BATHROOMS: &str = "mean_bathrooms";
    pub const MEAN_GARDEN_SIZE: &str = "mean_garden_size";
}

/// One row of the raw listings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub address: Option<String>,
    pub neighborhood_id: i64,
    pub year_built: i64,
    pub area: f64,
    pub rooms: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub balcony: String,
    pub storage: String,
    pub parking: String,
    pub furnished: String,
    pub garage: String,
    pub garden: String,
    /// Monthly rent, known only for training data
    pub rent: Option<i64>,
}

/// Build a raw frame with one column per [`RawListing`] field
pub fn records_to_frame(records: &[RawListing]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(
            columns::ADDRESS,
            records
                .iter()
                .map(|r| r.address.clone())
                .collect::<Vec<Option<String>>>(),
        ),
        Series::new(
            columns::NEIGHBORHOOD_ID,
            records.iter().map(|r| r.neighborhood_id).collect::<Vec<i64>>(),
        ),
        Series::new(
            columns::YEAR_BUILT,
            records.iter().map(|r| r.year_built).collect::<Vec<i64>>(),
        ),
        Series::new(
            columns::AREA,
            records.iter().map(|r| r.area).collect::<Vec<f64>>(),
        ),
        Series::new(
            columns::ROOMS,
            records.iter().map(|r| r.rooms).collect::<Vec<i64>>(),
        ),
        Series::new(
            columns::BEDROOMS,
            records.iter().map(|r| r.bedrooms).collect::<Vec<i64>>(),
        ),
        Series::new(
            columns::BATHROOMS,
            records.iter().map(|r| r.bathrooms).collect::<Vec<f64>>(),
        ),
        text_series(columns::BALCONY, records, |r| r.balcony.as_str()),
        text_series(columns::STORAGE, records, |r| r.storage.as_str()),
        text_series(columns::PARKING, records, |r| r.parking.as_str()),
        text_series(columns::FURNISHED, records, |r| r.furnished.as_str()),
        text_series(columns::GARAGE, records, |r| r.garage.as_str()),
        text_series(columns::GARDEN, records, |r| r.garden.as_str()),
        Series::new(
            columns::RENT,
            records.iter().map(|r| r.rent).collect::<Vec<Option<i64>>>(),
        ),
    ])?;

    Ok(df)
}

fn text_series(name: &str, records: &[RawListing], field: impl Fn(&RawListing) -> &str) -> Series {
    Series::new(name, records.iter().map(field).collect::<Vec<&str>>())
}

/// Data loader for raw listing files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load raw listings from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::check_raw_columns(&df)?;
        Ok(df)
    }

    /// Load raw listings from a parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;

        Self::check_raw_columns(&df)?;
        Ok(df)
    }

    /// Load by file extension (`.csv` or `.parquet`)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::from_csv(path),
            Some("parquet") => Self::from_parquet(path),
            _ => Err(RentError::DataError(format!(
                "Unsupported raw data format: '{}'",
                path.display()
            ))),
        }
    }

    /// Convert a raw frame back into records, e.g. before writing to storage
    pub fn records_from_frame(df: &DataFrame) -> Result<Vec<RawListing>> {
        Self::check_raw_columns(df)?;

        let address = optional_text(df, columns::ADDRESS)?;
        let neighborhood_id = required_i64(df, columns::NEIGHBORHOOD_ID)?;
        let year_built = required_i64(df, columns::YEAR_BUILT)?;
        let area = required_f64(df, columns::AREA)?;
        let rooms = required_i64(df, columns::ROOMS)?;
        let bedrooms = required_i64(df, columns::BEDROOMS)?;
        let bathrooms = required_f64(df, columns::BATHROOMS)?;
        let balcony = required_text(df, columns::BALCONY)?;
        let storage = required_text(df, columns::STORAGE)?;
        let parking = required_text(df, columns::PARKING)?;
        let furnished = required_text(df, columns::FURNISHED)?;
        let garage = required_text(df, columns::GARAGE)?;
        let garden = required_text(df, columns::GARDEN)?;
        let rent = optional_i64(df, columns::RENT)?;

        Ok((0..df.height())
            .map(|i| RawListing {
                address: address[i].clone(),
                neighborhood_id: neighborhood_id[i],
                year_built: year_built[i],
                area: area[i],
                rooms: rooms[i],
                bedrooms: bedrooms[i],
                bathrooms: bathrooms[i],
                balcony: balcony[i].clone(),
                storage: storage[i].clone(),
                parking: parking[i].clone(),
                furnished: furnished[i].clone(),
                garage: garage[i].clone(),
                garden: garden[i].clone(),
                rent: rent[i],
            })
            .collect())
    }

    fn check_raw_columns(df: &DataFrame) -> Result<()> {
        let names = df.get_column_names();
        let missing: Vec<&str> = [
            columns::NEIGHBORHOOD_ID,
            columns::YEAR_BUILT,
            columns::AREA,
            columns::ROOMS,
            columns::BEDROOMS,
            columns::BATHROOMS,
            columns::BALCONY,
            columns::STORAGE,
            columns::PARKING,
            columns::FURNISHED,
            columns::GARAGE,
            columns::GARDEN,
        ]
        .into_iter()
        .filter(|c| !names.contains(c))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RentError::DataError(format!(
                "Raw data is missing columns: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Numeric column as `f64`, with nulls preserved
pub(crate) fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(name)
        .map_err(|e| RentError::DataError(format!("Column '{}' not found: {}", name, e)))?;

    let dtype = col.dtype();
    if !(dtype.is_numeric() || matches!(dtype, DataType::Boolean)) {
        return Err(RentError::DataError(format!(
            "Column '{}' of type {} cannot be converted to f64",
            name, dtype
        )));
    }

    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    column_as_f64(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                RentError::DataError(format!("Column '{}' is null at row {}", name, i))
            })
        })
        .collect()
}

fn optional_i64(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    if !df.get_column_names().contains(&name) {
        return Ok(vec![None; df.height()]);
    }
    Ok(column_as_f64(df, name)?
        .into_iter()
        .map(|v| v.map(|x| x.round() as i64))
        .collect())
}

fn required_i64(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    Ok(required_f64(df, name)?
        .into_iter()
        .map(|x| x.round() as i64)
        .collect())
}

fn optional_text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if !df.get_column_names().contains(&name) {
        return Ok(vec![None; df.height()]);
    }
    let col = df.column(name)?.cast(&DataType::Utf8)?;
    let values = col
        .utf8()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

fn required_text(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    optional_text(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                RentError::DataError(format!("Column '{}' is null at row {}", name, i))
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::listing;
    use super::*;

    #[test]
    fn test_records_round_trip_through_frame() {
        let records = vec![
            listing(1, 50.0, "Not present", Some(1500)),
            listing(2, 80.0, "25 m²", None),
        ];
        let df = records_to_frame(&records).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 14);

        let back = DataLoader::records_from_frame(&df).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_missing_columns_reported() {
        let df = DataFrame::new(vec![Series::new("area", vec![1.0])]).unwrap();
        let err = DataLoader::records_from_frame(&df).unwrap_err();
        assert!(err.to_string().contains("neighborhood_id"));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            DataLoader::from_path("listings.xlsx"),
            Err(RentError::DataError(_))
        ));
    }
}
