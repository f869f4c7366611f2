//! Spectrogram table structures

use crate::error::TableError;
use serde::Serialize;

/// Cell delimiter of the on-disk table
pub const DELIMITER: char = ',';

/// Label written in the top-left header cell
pub const INDEX_LABEL: &str = "frequency";

/// Magnitude grid indexed by frequency (rows) and time (columns)
///
/// Rows are stored contiguously, so `row(f)` is a plain slice over all
/// time columns of frequency bin `f`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrogramTable {
    /// Row labels (Hz)
    frequencies: Vec<f64>,
    /// Column labels (milliseconds)
    times: Vec<f64>,
    /// Row-major magnitudes, `frequencies.len() * times.len()` values
    magnitudes: Vec<f64>,
}

impl SpectrogramTable {
    /// Build a table from row labels, column labels and one magnitude row per frequency.
    ///
    /// Zero rows or zero columns are accepted here; consumers decide whether
    /// an empty grid is usable.
    pub fn new(
        frequencies: Vec<f64>,
        times: Vec<f64>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        if rows.len() != frequencies.len() {
            return Err(TableError::Shape(format!(
                "{} frequency labels but {} magnitude rows",
                frequencies.len(),
                rows.len()
            )));
        }
        if let Some(label) = frequencies.iter().chain(times.iter()).find(|v| !v.is_finite()) {
            return Err(TableError::Shape(format!("non-finite axis label {}", label)));
        }

        let mut magnitudes = Vec::with_capacity(frequencies.len() * times.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != times.len() {
                return Err(TableError::Shape(format!(
                    "row {} has {} values but there are {} time labels",
                    row_idx,
                    row.len(),
                    times.len()
                )));
            }
            for (col_idx, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(TableError::InvalidMagnitude {
                        row: row_idx,
                        column: col_idx,
                        value,
                    });
                }
            }
            magnitudes.extend(row);
        }

        Ok(Self {
            frequencies,
            times,
            magnitudes,
        })
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn num_rows(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_cols(&self) -> usize {
        self.times.len()
    }

    /// True when the grid has no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0 || self.num_cols() == 0
    }

    /// Magnitudes of one frequency row across all time columns
    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.num_cols();
        &self.magnitudes[row * width..(row + 1) * width]
    }

    /// Iterate `(frequency, row)` pairs in row order
    pub fn rows(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.frequencies
            .iter()
            .enumerate()
            .map(move |(idx, &freq)| (freq, self.row(idx)))
    }
}
