//! Delimited spectrogram table writer

use crate::error::TableError;
use crate::format::{SpectrogramTable, DELIMITER, INDEX_LABEL};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct TableWriter {}

impl TableWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Write table to disk in the format `TableReader` parses
    pub fn write(&self, path: &Path, table: &SpectrogramTable) -> Result<(), TableError> {
        let io_err = |source| TableError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.to_string(table).as_bytes())
            .map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        Ok(())
    }

    /// Render table as text
    pub fn to_string(&self, table: &SpectrogramTable) -> String {
        let mut out = String::from(INDEX_LABEL);
        for time in table.times() {
            // Writing into a String cannot fail
            let _ = write!(out, "{}{}", DELIMITER, time);
        }
        out.push('\n');

        for (freq, row) in table.rows() {
            let _ = write!(out, "{}", freq);
            for value in row {
                let _ = write!(out, "{}{}", DELIMITER, value);
            }
            out.push('\n');
        }

        out
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}
