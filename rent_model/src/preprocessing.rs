//! Raw corpus to ML-ready data

use crate::config::DataConfig;
use crate::error::{RentError, Result};
use crate::features::{parse_garden_feature, BinaryEncoder};
use polars::prelude::*;
use tracing::{debug, info};

/// Output of [`preprocess_data`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Null-free, duplicate-free, all boolean/numeric frame of the configured
    /// features followed by the target
    pub frame: DataFrame,
    /// Binary levels learned from the corpus, replayed at serving time
    pub encoder: BinaryEncoder,
}

/// Validate, clean and encode the raw corpus.
///
/// Stages: binary encoding of the configured feature columns, garden
/// parsing, feature/target selection, duplicate removal (first occurrence
/// kept), removal of rows without a target. The result is checked against the
/// ML-ready invariants before it is returned.
pub fn preprocess_data(raw: &DataFrame, config: &DataConfig) -> Result<PreparedData> {
    info!(
        rows = raw.height(),
        "Validating, pre-processing, and transforming the raw data into ML-ready features and targets"
    );

    let encoder = BinaryEncoder::fit_columns(raw, &config.features)?;
    let encoded = encoder.transform(raw)?;
    let parsed = parse_garden_feature(&encoded)?;

    let mut output_columns = config.features.clone();
    output_columns.push(config.target.clone());
    let selected = parsed.select(&output_columns).map_err(|e| {
        RentError::DataError(format!("Cannot select configured columns: {}", e))
    })?;

    let deduplicated = selected.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let frame = deduplicated.drop_nulls(Some(std::slice::from_ref(&config.target)))?;
    debug!(
        selected = selected.height(),
        deduplicated = deduplicated.height(),
        with_target = frame.height(),
        "dropped duplicate and unlabeled rows"
    );

    check_ml_ready(&frame)?;
    Ok(PreparedData { frame, encoder })
}

/// Assert the ML-ready invariants: no nulls, no duplicate rows, only boolean
/// or numeric columns
pub fn check_ml_ready(df: &DataFrame) -> Result<()> {
    let with_nulls: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| s.null_count() > 0)
        .map(|s| format!("{} ({})", s.name(), s.null_count()))
        .collect();
    if !with_nulls.is_empty() {
        return Err(RentError::InvariantViolation(format!(
            "Missing values in columns: {}",
            with_nulls.join(", ")
        )));
    }

    let unique_rows = df.unique_stable(None, UniqueKeepStrategy::First, None)?.height();
    if unique_rows != df.height() {
        return Err(RentError::InvariantViolation(format!(
            "{} duplicate rows remain",
            df.height() - unique_rows
        )));
    }

    let non_numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| !(s.dtype().is_numeric() || matches!(s.dtype(), DataType::Boolean)))
        .map(|s| format!("{} ({})", s.name(), s.dtype()))
        .collect();
    if !non_numeric.is_empty() {
        return Err(RentError::InvariantViolation(format!(
            "Columns are neither boolean nor numeric: {}",
            non_numeric.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{listing, with_flags};
    use crate::data::records_to_frame;

    #[test]
    fn test_duplicates_and_unlabeled_rows_removed() {
        let records = vec![
            listing(1, 50.0, "Not present", Some(1500)),
            listing(1, 50.0, "Not present", Some(1500)),
            with_flags(listing(2, 70.0, "10 m²", None), "no"),
            with_flags(listing(2, 90.0, "10 m²", Some(2500)), "no"),
        ];
        let raw = records_to_frame(&records).unwrap();

        let prepared = preprocess_data(&raw, &DataConfig::default()).unwrap();
        assert_eq!(prepared.frame.height(), 2);
        assert_eq!(prepared.frame.width(), 12);
        assert_eq!(prepared.frame.get_column_names().last(), Some(&"rent"));

        // Only configured feature columns are binary encoded
        let levels = prepared.encoder.levels();
        assert_eq!(levels.len(), 5);
        assert!(levels.contains_key("balcony"));
        assert!(!levels.contains_key("garden"));
        assert!(!levels.contains_key("address"));
    }

    #[test]
    fn test_preprocessing_is_deterministic() {
        let records = vec![
            listing(1, 50.0, "Not present", Some(1500)),
            with_flags(listing(2, 90.0, "10 m²", Some(2500)), "no"),
            listing(3, 65.0, "5 m²", Some(1800)),
        ];
        let raw = records_to_frame(&records).unwrap();
        let config = DataConfig::default();

        let first = preprocess_data(&raw, &config).unwrap();
        let second = preprocess_data(&raw, &config).unwrap();
        assert!(first.frame.frame_equal_missing(&second.frame));
        assert_eq!(first.encoder, second.encoder);
    }

    #[test]
    fn test_single_valued_flag_fails_type_check() {
        let records = vec![
            listing(1, 50.0, "Not present", Some(1500)),
            listing(2, 90.0, "10 m²", Some(2500)),
        ];
        let raw = records_to_frame(&records).unwrap();
        assert!(matches!(
            preprocess_data(&raw, &DataConfig::default()),
            Err(RentError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_non_numeric_column_violates_invariant() {
        let df = DataFrame::new(vec![
            Series::new("area", vec![1.0, 2.0]),
            Series::new("energy", vec!["A", "B"]),
        ])
        .unwrap();
        assert!(matches!(
            check_ml_ready(&df),
            Err(RentError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_nulls_violate_invariant() {
        let df = DataFrame::new(vec![Series::new("area", vec![Some(1.0), None])]).unwrap();
        let err = check_ml_ready(&df).unwrap_err();
        assert!(err.to_string().contains("area"));
    }
}
