//! Per-column feature transforms: garden size parsing and binary encoding

use crate::data::columns;
use crate::error::{RentError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Garden value meaning "no garden"
pub const NO_GARDEN: &str = "Not present";

/// Unit symbol that shows up in garden sizes ("25 m²")
const AREA_UNIT: char = '²';

/// Parse a free-text garden field into a size in square metres.
///
/// `"Not present"` is 0. Otherwise whitespace, punctuation, letters and the
/// `²` unit are discarded and what remains must be a non-empty run of digits.
pub fn parse_garden_size(text: &str) -> Result<i64> {
    if text == NO_GARDEN {
        return Ok(0);
    }

    let digits: String = text
        .chars()
        .filter(|c| {
            !(c.is_whitespace() || c.is_ascii_punctuation() || c.is_alphabetic() || *c == AREA_UNIT)
        })
        .collect();

    if digits.is_empty() {
        return Err(RentError::ValidationError(format!(
            "Garden value '{}' contains no size",
            text
        )));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RentError::ValidationError(format!(
            "Garden value '{}' contains unexpected characters '{}'",
            text, digits
        )));
    }

    digits.parse::<i64>().map_err(|e| {
        RentError::ValidationError(format!("Garden value '{}' is not a size: {}", text, e))
    })
}

/// Lenient digit extraction used by the corpus aggregate: every non-digit is
/// dropped and an empty result counts as 0. A digit run too large for `i64`
/// is a [`RentError::ValidationError`].
pub fn garden_digits(text: Option<&str>) -> Result<i64> {
    let text = text.unwrap_or_default();
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits.parse::<i64>().map_err(|e| {
        RentError::ValidationError(format!("Garden value '{}' is not a size: {}", text, e))
    })
}

/// Append a `garden_size` column parsed from the `garden` text column
pub fn parse_garden_feature(df: &DataFrame) -> Result<DataFrame> {
    let garden = df.column(columns::GARDEN)?;
    let garden = garden.utf8().map_err(|_| {
        RentError::ValidationError(format!(
            "Column '{}' must be text, found {}",
            columns::GARDEN,
            garden.dtype()
        ))
    })?;

    let sizes = garden
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or_else(|| {
                RentError::ValidationError(format!("Garden value missing at row {}", row))
            })?;
            parse_garden_size(value).map_err(|e| match e {
                RentError::ValidationError(msg) => {
                    RentError::ValidationError(format!("row {}: {}", row, msg))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<i64>>>()?;

    let mut out = df.clone();
    out.with_column(Series::new(columns::GARDEN_SIZE, sizes))?;
    Ok(out)
}

/// The two observed values of a binary column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryLevels {
    /// Encoded as `false` / 0
    pub negative: String,
    /// Encoded as `true` / 1
    pub positive: String,
}

impl BinaryLevels {
    pub fn encode(&self, column: &str, value: &str) -> Result<bool> {
        if value == self.positive {
            Ok(true)
        } else if value == self.negative {
            Ok(false)
        } else {
            Err(RentError::ValidationError(format!(
                "Column '{}' expects '{}' or '{}', got '{}'",
                column, self.negative, self.positive, value
            )))
        }
    }
}

/// Binary encoder for two-valued text columns.
///
/// A text column qualifies when it holds exactly two distinct non-null
/// values. A null counts as a value, so a column with nulls never qualifies
/// and stays text (the preprocessing type check then rejects it).
///
/// The lexically greater value maps to 1, so `"yes"` is 1 and `"no"` is 0.
/// The learned levels are kept so a single serving record can be encoded
/// with the training-time mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryEncoder {
    levels: BTreeMap<String, BinaryLevels>,
}

impl BinaryEncoder {
    /// Learn the levels of the qualifying text columns among `candidates`.
    /// Candidates absent from `df` are ignored.
    pub fn fit_columns<S: AsRef<str>>(df: &DataFrame, candidates: &[S]) -> Result<Self> {
        let mut levels = BTreeMap::new();

        for series in df.get_columns() {
            let candidate = candidates.iter().any(|c| c.as_ref() == series.name());
            if !candidate || !matches!(series.dtype(), DataType::Utf8) {
                continue;
            }

            let distinct: BTreeSet<Option<&str>> = series.utf8()?.into_iter().collect();
            if distinct.len() != 2 || distinct.contains(&None) {
                debug!(
                    column = series.name(),
                    cardinality = distinct.len(),
                    "column is not binary, leaving untouched"
                );
                continue;
            }

            let mut values = distinct.into_iter().flatten();
            if let (Some(negative), Some(positive)) = (values.next(), values.next()) {
                levels.insert(
                    series.name().to_string(),
                    BinaryLevels {
                        negative: negative.to_string(),
                        positive: positive.to_string(),
                    },
                );
            }
        }

        Ok(Self { levels })
    }

    /// Replace every learned column with a boolean column of the same name
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        for (column, levels) in &self.levels {
            let values = df.column(column)?.utf8()?;
            let encoded = values
                .into_iter()
                .map(|v| match v {
                    Some(v) => levels.encode(column, v),
                    None => Err(RentError::ValidationError(format!(
                        "Column '{}' has a missing value",
                        column
                    ))),
                })
                .collect::<Result<Vec<bool>>>()?;
            out.with_column(Series::new(column, encoded))?;
        }
        Ok(out)
    }

    /// Encode a single value of a learned column
    pub fn encode_value(&self, column: &str, value: &str) -> Result<bool> {
        self.levels
            .get(column)
            .ok_or_else(|| {
                RentError::ValidationError(format!("Column '{}' was not binary encoded", column))
            })?
            .encode(column, value)
    }

    pub fn levels(&self) -> &BTreeMap<String, BinaryLevels> {
        &self.levels
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Not present", 0)]
    #[case("25 m²", 25)]
    #[case("Present (120 m²)", 120)]
    #[case("  7m²", 7)]
    #[case("1.250 m²", 1250)]
    fn test_parse_garden_size(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(parse_garden_size(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("Present")]
    #[case("m²")]
    #[case("not present")]
    fn test_parse_garden_size_without_digits(#[case] input: &str) {
        assert!(matches!(
            parse_garden_size(input),
            Err(RentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_garden_size_rejects_other_symbols() {
        assert!(parse_garden_size("30 m³").is_err());
    }

    #[test]
    fn test_garden_digits_is_lenient() {
        assert_eq!(garden_digits(Some("Not present")).unwrap(), 0);
        assert_eq!(garden_digits(Some("30 m²")).unwrap(), 30);
        assert_eq!(garden_digits(Some("Present (1.250 m³)")).unwrap(), 1250);
        assert_eq!(garden_digits(None).unwrap(), 0);
    }

    #[test]
    fn test_garden_digits_overflow_is_an_error() {
        assert!(matches!(
            garden_digits(Some("99999999999999999999 m²")),
            Err(RentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_garden_feature_reports_row() {
        let df = DataFrame::new(vec![Series::new(
            columns::GARDEN,
            vec!["Not present", "12 m²", "unknown"],
        )])
        .unwrap();
        let err = parse_garden_feature(&df).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_binary_encoding_maps_greater_value_to_one() {
        let df = DataFrame::new(vec![
            Series::new("balcony", vec!["yes", "no", "yes"]),
            Series::new("energy", vec!["A", "B", "C"]),
            Series::new("area", vec![10.0, 20.0, 30.0]),
        ])
        .unwrap();

        let encoder = BinaryEncoder::fit_columns(&df, &df.get_column_names()).unwrap();
        let encoded = encoder.transform(&df).unwrap();
        let balcony: Vec<Option<bool>> = encoded
            .column("balcony")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(balcony, vec![Some(true), Some(false), Some(true)]);

        // Three-valued and numeric columns stay as they were
        assert_eq!(encoded.column("energy").unwrap().dtype(), &DataType::Utf8);
        assert_eq!(encoded.column("area").unwrap().dtype(), &DataType::Float64);
        assert_eq!(encoder.levels().len(), 1);

        assert!(encoder.encode_value("balcony", "no").is_ok());
        assert!(encoder.encode_value("balcony", "maybe").is_err());
        assert!(encoder.encode_value("energy", "A").is_err());
    }

    #[test]
    fn test_single_valued_column_not_encoded() {
        let df = DataFrame::new(vec![Series::new("garage", vec!["no", "no"])]).unwrap();
        let encoder = BinaryEncoder::fit_columns(&df, &["garage"]).unwrap();
        assert!(encoder.is_empty());
    }
}
