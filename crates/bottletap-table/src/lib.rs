//! Spectrogram table format library
//!
//! In-memory frequency-by-time magnitude grid plus the delimited text
//! format produced by the preprocessing step.

pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use error::TableError;
pub use format::{SpectrogramTable, DELIMITER, INDEX_LABEL};
pub use reader::TableReader;
pub use writer::TableWriter;
