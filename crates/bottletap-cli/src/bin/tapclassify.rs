//! tapclassify - Classify every spectrogram in a directory
//!
//! Usage:
//!   tapclassify <directory>                     # Uses bottletap.toml or defaults
//!   tapclassify --config <path> <directory>     # Uses custom config
//!   tapclassify -o predictions.json <directory> # Also writes the JSON to a file

use anyhow::{Context, Result};
use bottletap_cli::batch::BatchRunner;
use bottletap_cli::output::predictions_json;
use bottletap_cli::{load_config, logging};
use bottletap_core::Pipeline;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tapclassify")]
#[command(about = "Classify bottle tap spectrograms as top or bottom", long_about = None)]
struct Args {
    /// Directory containing preprocessed spectrogram .csv files
    directory: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write predictions JSON to this file as well as stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not write an analysis_<timestamp>.log file
    #[arg(long)]
    no_log_file: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = (!args.no_log_file).then(|| logging::log_file_name(chrono::Local::now()));
    logging::init(args.verbose, log_file.as_deref())?;

    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build classifier")?;

    let report = BatchRunner::new(&pipeline).run(&args.directory)?;
    let json = predictions_json(&report)?;
    println!("{}", json);

    if let Some(path) = &args.output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Predictions written to: {}", path.display());
    }

    Ok(())
}
