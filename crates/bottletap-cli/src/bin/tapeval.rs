//! tapeval - Score directory predictions against an answer key
//!
//! Usage: tapeval <directory> <answer_key.json>
//!
//! The answer key maps file stems to "top" or "bottom". The report is
//! printed and written to evaluation_results.txt (or --output).

use anyhow::{Context, Result};
use bottletap_cli::batch::BatchRunner;
use bottletap_cli::output::render_evaluation;
use bottletap_cli::{load_config, logging};
use bottletap_core::evaluation::parse_answer_key;
use bottletap_core::{Evaluation, Pipeline};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tapeval")]
#[command(about = "Evaluate tap classification against an answer key", long_about = None)]
struct Args {
    /// Directory containing preprocessed spectrogram .csv files
    directory: PathBuf,

    /// JSON answer key mapping file stem to "top" or "bottom"
    answer_key: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the text report
    #[arg(short, long, default_value = "evaluation_results.txt")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, None)?;

    let key_text = std::fs::read_to_string(&args.answer_key)
        .with_context(|| format!("Failed to read answer key: {}", args.answer_key.display()))?;
    let key = parse_answer_key(&key_text)
        .with_context(|| format!("Invalid answer key: {}", args.answer_key.display()))?;
    log::info!("Answer key has {} entries", key.len());

    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build classifier")?;
    let report = BatchRunner::new(&pipeline).run(&args.directory)?;

    let evaluation = Evaluation::new(&report.outcome_map(), &key);
    let text = render_evaluation(&evaluation);
    print!("{}", text);

    std::fs::write(&args.output, &text)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    log::info!("Evaluation written to: {}", args.output.display());

    Ok(())
}
