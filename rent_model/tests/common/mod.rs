#![allow(dead_code)]

use rent_model::config::Config;
use rent_model::data::RawListing;
use std::path::Path;

fn flag(on: bool) -> String {
    if on { "yes" } else { "no" }.to_string()
}

/// Deterministic corpus whose rent is driven by area, neighborhood, bedrooms
/// and a couple of amenities
pub fn synthetic_corpus(n: usize) -> Vec<RawListing> {
    (0..n)
        .map(|i| {
            let neighborhood_id = (i % 8) as i64 + 1;
            let area = 30.0 + ((i * 37) % 120) as f64;
            let bedrooms = 1 + (i % 4) as i64;
            let balcony = i % 2 == 0;
            let garage = i % 4 == 1;
            let rent = 12.0 * area
                + 40.0 * neighborhood_id as f64
                + 100.0 * bedrooms as f64
                + if balcony { 150.0 } else { 0.0 }
                + if garage { 200.0 } else { 0.0 };

            RawListing {
                address: Some(format!("Prinsengracht {}", i + 1)),
                neighborhood_id,
                year_built: 1900 + ((i * 13) % 120) as i64,
                area,
                rooms: bedrooms + 1,
                bedrooms,
                bathrooms: 1.0 + (i % 2) as f64,
                balcony: flag(balcony),
                storage: flag(i % 3 == 0),
                parking: flag(i % 5 == 0),
                furnished: flag(i % 7 < 3),
                garage: flag(garage),
                garden: if i % 3 == 0 {
                    "Not present".to_string()
                } else {
                    format!("{} m²", (i * 7) % 60 + 1)
                },
                rent: Some(rent.round() as i64),
            }
        })
        .collect()
}

/// Seeded configuration writing its artifacts under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.data.seed = Some(42);
    config.paths.model = dir.join("artifacts").join("model.json");
    config.paths.database = dir.join("rentals.db");
    config.paths.raw_data = dir.join("raw.csv");
    config
}

/// An unlabeled listing in a neighborhood of [`synthetic_corpus`]
pub fn query_listing(neighborhood_id: i64) -> RawListing {
    let mut listing = synthetic_corpus(1).remove(0);
    listing.neighborhood_id = neighborhood_id;
    listing.area = 75.0;
    listing.garden = "12 m²".to_string();
    listing.rent = None;
    listing
}
