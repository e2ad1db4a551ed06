//! Metrics for evaluating rent predictions

use crate::error::{RentError, Result};

/// Test-set scores of a trained model and of the constant-mean baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationResult {
    pub test_r_squared: f64,
    pub baseline_r_squared: f64,
}

impl EvaluationResult {
    /// True when the model strictly beats the baseline
    pub fn beats_baseline(&self) -> bool {
        self.test_r_squared > self.baseline_r_squared
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(RentError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Coefficient of determination `1 - SSE/SST`, rounded to two decimals.
///
/// A target with zero variance scores 1.0 when predicted exactly and 0.0
/// otherwise.
pub fn compute_r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let y_mean = mean(actual);
    let sse: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let sst: f64 = actual.iter().map(|y| (y - y_mean).powi(2)).sum();

    let r_squared = if sst == 0.0 {
        if sse == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - sse / sst
    };

    Ok((r_squared * 100.0).round() / 100.0)
}

/// R² of always predicting the mean of `actual`
pub fn baseline_r_squared(actual: &[f64]) -> Result<f64> {
    if actual.is_empty() {
        return Err(RentError::ValidationError(
            "Baseline needs at least one value".to_string(),
        ));
    }
    let constant = vec![mean(actual); actual.len()];
    compute_r_squared(actual, &constant)
}

/// Score predictions against the baseline on the same targets
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationResult> {
    Ok(EvaluationResult {
        test_r_squared: compute_r_squared(actual, predicted)?,
        baseline_r_squared: baseline_r_squared(actual)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_variance_target() {
        assert_eq!(compute_r_squared(&[3.0, 3.0], &[3.0, 3.0]).unwrap(), 1.0);
        assert_eq!(compute_r_squared(&[3.0, 3.0], &[2.0, 4.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // SSE = 1, SST = 35
        let r2 = compute_r_squared(&[1.0, 3.0, 5.0, 9.0], &[1.0, 3.0, 5.0, 8.0]).unwrap();
        assert_relative_eq!(r2, 0.97);
    }

    #[test]
    fn test_exact_and_mean_predictions() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(compute_r_squared(&y, &y).unwrap(), 1.0);
        assert_eq!(compute_r_squared(&y, &[2.5; 4]).unwrap(), 0.0);
        assert_eq!(baseline_r_squared(&y).unwrap(), 0.0);
    }

    #[test]
    fn test_worse_than_mean_is_negative() {
        let r2 = compute_r_squared(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]).unwrap();
        assert_relative_eq!(r2, -3.0);
        let result = evaluate(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!(!result.beats_baseline());
    }
}
