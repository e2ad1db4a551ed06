//! Train/validation/test partitioning

use crate::data::column_as_f64;
use crate::error::{RentError, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// The three partitions of an ML-ready frame
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: DataFrame,
    pub x_val: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Vec<f64>,
    pub y_val: Vec<f64>,
    pub y_test: Vec<f64>,
    /// Source row positions of each partition, in partition order
    pub train_rows: Vec<usize>,
    pub val_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

impl DataSplit {
    /// Total number of rows across the three partitions
    pub fn len(&self) -> usize {
        self.train_rows.len() + self.val_rows.len() + self.test_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of (train, validation, test) rows for `n` rows.
///
/// Both cuts round half to even: the train cut is `round(train_size * n)` and
/// validation takes `round((n - train) / 2)` of the remainder.
pub fn split_sizes(n: usize, train_size: f64) -> Result<(usize, usize, usize)> {
    if !(train_size > 0.0 && train_size < 1.0) {
        return Err(RentError::InvalidParameter(format!(
            "train_size must be in (0, 1), got {}",
            train_size
        )));
    }

    let train = ((train_size * n as f64).round_ties_even() as usize).min(n);
    let rest = n - train;
    let val = (rest as f64 / 2.0).round_ties_even() as usize;
    Ok((train, val, rest - val))
}

/// Shuffle the rows of `df` and cut them into train, validation and test
/// partitions. Passing a seed makes the shuffle reproducible.
pub fn split_data(
    df: &DataFrame,
    target: &str,
    train_size: f64,
    seed: Option<u64>,
) -> Result<DataSplit> {
    let n = df.height();
    let (n_train, n_val, n_test) = split_sizes(n, train_size)?;
    if n_train == 0 || n_val == 0 || n_test == 0 {
        return Err(RentError::DataError(format!(
            "{} rows cannot fill train/validation/test partitions ({}/{}/{})",
            n, n_train, n_val, n_test
        )));
    }

    let targets = column_as_f64(df, target)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                RentError::DataError(format!("Target '{}' is null at row {}", target, row))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    let features = df.drop(target)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut rows: Vec<usize> = (0..n).collect();
    rows.shuffle(&mut rng);

    let test_rows = rows.split_off(n_train + n_val);
    let val_rows = rows.split_off(n_train);
    let train_rows = rows;

    let take = |positions: &[usize]| -> Result<(DataFrame, Vec<f64>)> {
        let idx = IdxCa::from_vec("", positions.iter().map(|&i| i as IdxSize).collect());
        let x = features.take(&idx)?;
        let y = positions.iter().map(|&i| targets[i]).collect();
        Ok((x, y))
    };
    let (x_train, y_train) = take(&train_rows)?;
    let (x_val, y_val) = take(&val_rows)?;
    let (x_test, y_test) = take(&test_rows)?;

    debug!(
        train = n_train,
        validation = n_val,
        test = n_test,
        "split rows"
    );

    Ok(DataSplit {
        x_train,
        x_val,
        x_test,
        y_train,
        y_val,
        y_test,
        train_rows,
        val_rows,
        test_rows,
    })
}
