//! Delimited spectrogram table reader

use crate::error::TableError;
use crate::format::{SpectrogramTable, DELIMITER};
use std::path::Path;

pub struct TableReader;

impl TableReader {
    /// Read a spectrogram table from disk
    pub fn read(path: &Path) -> Result<SpectrogramTable, TableError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse table text.
    ///
    /// Header: index label followed by numeric time labels. Each further
    /// non-blank line: numeric frequency label followed by magnitudes.
    pub fn parse(text: &str) -> Result<SpectrogramTable, TableError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_line, header) = lines.next().ok_or(TableError::Empty)?;
        let times = Self::parse_header(header_line, header)?;
        let expected = times.len() + 1;

        let mut frequencies = Vec::new();
        let mut rows = Vec::new();

        for (line_no, line) in lines {
            let cells: Vec<&str> = split_cells(line).collect();
            if cells.len() != expected {
                return Err(TableError::Ragged {
                    line: line_no,
                    expected,
                    found: cells.len(),
                });
            }

            let freq = parse_number(cells[0]).ok_or_else(|| TableError::FrequencyLabel {
                line: line_no,
                value: cells[0].to_string(),
            })?;

            let row = cells[1..]
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    parse_number(cell).ok_or_else(|| TableError::NonNumericCell {
                        line: line_no,
                        column: col + 2,
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;

            frequencies.push(freq);
            rows.push(row);
        }

        SpectrogramTable::new(frequencies, times, rows)
    }

    fn parse_header(line_no: usize, header: &str) -> Result<Vec<f64>, TableError> {
        split_cells(header)
            .enumerate()
            // first cell is the free-text index label
            .skip(1)
            .map(|(col, cell)| {
                parse_number(cell).ok_or_else(|| TableError::TimeLabel {
                    line: line_no,
                    column: col + 1,
                    value: cell.to_string(),
                })
            })
            .collect()
    }
}

fn split_cells(line: &str) -> impl Iterator<Item = &str> {
    line.split(DELIMITER).map(|cell| {
        let cell = cell.trim();
        cell.strip_prefix('"')
            .and_then(|c| c.strip_suffix('"'))
            .unwrap_or(cell)
            .trim()
    })
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
