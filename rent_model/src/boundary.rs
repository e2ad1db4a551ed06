//! Serving boundary types
//!
//! A [`ListingPayload`] is the JSON body a caller submits for one listing.
//! Every field except `address` is required and unknown fields are rejected.
//! The answer is a [`RentEstimate`], serialized as
//! `{"estimated rent": <non-negative integer>}`.

use crate::data::RawListing;
use crate::error::{RentError, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Earliest accepted construction year
pub const MIN_YEAR_BUILT: i64 = 1900;

/// One listing submitted for estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingPayload {
    #[serde(default)]
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
}

impl ListingPayload {
    /// Parse and validate a JSON payload
    pub fn from_json(text: &str) -> Result<Self> {
        let payload: ListingPayload = serde_json::from_str(text)
            .map_err(|e| RentError::ValidationError(format!("Invalid payload: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Range checks on the numeric fields
    pub fn validate(&self) -> Result<()> {
        let current_year = i64::from(Utc::now().year());
        if !(MIN_YEAR_BUILT..=current_year).contains(&self.year_built) {
            return Err(RentError::ValidationError(format!(
                "year_built must be between {} and {}, got {}",
                MIN_YEAR_BUILT, current_year, self.year_built
            )));
        }
        if !(self.area.is_finite() && self.area > 0.0) {
            return Err(RentError::ValidationError(format!(
                "area must be positive, got {}",
                self.area
            )));
        }
        if self.neighborhood_id < 1 {
            return Err(RentError::ValidationError(format!(
                "neighborhood_id must be at least 1, got {}",
                self.neighborhood_id
            )));
        }
        if self.rooms < 1 || self.bedrooms < 1 {
            return Err(RentError::ValidationError(format!(
                "rooms and bedrooms must be at least 1, got {} and {}",
                self.rooms, self.bedrooms
            )));
        }
        if !(self.bathrooms.is_finite() && self.bathrooms >= 1.0) {
            return Err(RentError::ValidationError(format!(
                "bathrooms must be at least 1, got {}",
                self.bathrooms
            )));
        }
        Ok(())
    }

    /// Validate and convert into an unlabeled raw record
    pub fn into_listing(self) -> Result<RawListing> {
        self.validate()?;
        Ok(RawListing {
            address: self.address,
            neighborhood_id: self.neighborhood_id,
            year_built: self.year_built,
            area: self.area,
            rooms: self.rooms,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            balcony: self.balcony,
            storage: self.storage,
            parking: self.parking,
            furnished: self.furnished,
            garage: self.garage,
            garden: self.garden,
            rent: None,
        })
    }
}

/// Response body of an estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentEstimate {
    #[serde(rename = "estimated rent")]
    pub estimated_rent: u32,
}

impl From<u32> for RentEstimate {
    fn from(estimated_rent: u32) -> Self {
        Self { estimated_rent }
    }
}
