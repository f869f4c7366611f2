//! Logger setup shared by the binaries
//!
//! Lines go to stderr, and optionally to a timestamped log file in the
//! working directory, as `2024-05-01 12:00:00,123 - INFO - message`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use env_logger::{Builder, Target};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// `analysis_YYYYmmdd_HHMMSS.log`
pub fn log_file_name(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(now.format("analysis_%Y%m%d_%H%M%S.log").to_string())
}

/// Writes every line to stderr and, when present, to a file
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Debug with `verbose`, Info otherwise; `RUST_LOG` overrides either
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let file = match log_file {
        Some(path) => Some(
            File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?,
        ),
        None => None,
    };

    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .context("Logger already initialized")?;

    if let Some(path) = log_file {
        log::debug!("Logging to {}", path.display());
    }
    Ok(())
}
