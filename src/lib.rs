//! # Rent Estimator
//!
//! Workspace facade re-exporting the member crates.
//!
//! - [`boost_math`]: gradient-boosted regression trees
//! - [`rent_model`]: listing features, training and inference
//!
//! ## Example
//!
//! ```
//! use rent_estimator_workspace::rent_model::features::parse_garden_size;
//!
//! assert_eq!(parse_garden_size("Not present").unwrap(), 0);
//! assert_eq!(parse_garden_size("25 m²").unwrap(), 25);
//! ```

pub use boost_math;
pub use rent_model;
