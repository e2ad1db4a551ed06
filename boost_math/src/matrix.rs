//! Dense row-major feature matrix

use crate::{BoostError, Result};

/// Row-major matrix of `f64` features.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl DenseMatrix {
    /// Create a matrix from a flat row-major buffer
    pub fn new(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(BoostError::InvalidInput(format!(
                "Buffer length ({}) doesn't match {} rows x {} columns",
                data.len(),
                n_rows,
                n_cols
            )));
        }

        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(BoostError::InvalidInput(format!(
                "Non-finite feature value at row {}, column {}",
                pos / n_cols.max(1),
                pos % n_cols.max(1)
            )));
        }

        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// Create a matrix from a list of equally sized rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_cols) {
            return Err(BoostError::InvalidInput(format!(
                "Row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                n_cols
            )));
        }

        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(data, rows.len(), n_cols)
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Borrow a single row
    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    /// Single cell value
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let m = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.get(0, 1), 2.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(DenseMatrix::new(vec![1.0, f64::NAN], 1, 2).is_err());
        assert!(DenseMatrix::new(vec![1.0, 2.0, 3.0], 1, 2).is_err());
    }
}
