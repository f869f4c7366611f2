//! tapinspect - Compare one spectrogram's features with both references
//!
//! Usage: tapinspect [--json] <query.csv>

use anyhow::{Context, Result};
use bottletap_cli::output::{print_json, render_comparison};
use bottletap_cli::{load_config, logging};
use bottletap_core::{FeatureComparison, Pipeline};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tapinspect")]
#[command(about = "Show a feature-by-feature comparison against the references", long_about = None)]
struct Args {
    /// Preprocessed spectrogram .csv file
    query: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    query: &'a PathBuf,
    comparison: &'a FeatureComparison,
    prediction: &'a bottletap_core::Prediction,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, None)?;

    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build classifier")?;

    let features = pipeline
        .extract_file(&args.query)
        .with_context(|| format!("Failed to extract features: {}", args.query.display()))?;
    let comparison = FeatureComparison::new(pipeline.classifier().store(), &features)?;
    let prediction = pipeline.classifier().classify(&features)?;

    if args.json {
        print_json(&InspectOutput {
            query: &args.query,
            comparison: &comparison,
            prediction: &prediction,
        });
    } else {
        print!("{}", render_comparison(&comparison, Some(&prediction)));
    }

    Ok(())
}
