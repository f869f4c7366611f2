//! Errors raised while building or parsing a spectrogram table

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table is empty (no header line)")]
    Empty,

    #[error("line {line}, column {column}: time label `{value}` is not a number")]
    TimeLabel {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("line {line}: frequency label `{value}` is not a number")]
    FrequencyLabel { line: usize, value: String },

    #[error("line {line}, column {column}: magnitude `{value}` is not a number")]
    NonNumericCell {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("line {line}: expected {expected} cells, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("magnitude at row {row}, column {column} must be finite and >= 0 (got {value})")]
    InvalidMagnitude { row: usize, column: usize, value: f64 },

    #[error("shape mismatch: {0}")]
    Shape(String),
}
