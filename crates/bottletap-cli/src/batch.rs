//! Directory batch classification
//!
//! Every `*.csv` file in a directory is classified in parallel against one
//! shared pipeline. A file that fails is recorded with its error kind and
//! the rest of the batch carries on.

use anyhow::{bail, Context, Result};
use bottletap_core::{ErrorKind, Label, Outcome, Pipeline, Prediction};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Result for one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counts over a whole batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub top: usize,
    pub bottom: usize,
    pub undecided: usize,
    pub failed: BTreeMap<ErrorKind, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub directory: PathBuf,
    /// Keyed by file stem
    pub outcomes: BTreeMap<String, FileOutcome>,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            files: self.outcomes.len(),
            ..BatchSummary::default()
        };
        for file in self.outcomes.values() {
            match file.outcome {
                Outcome::Decided(decision) => match decision.label() {
                    Some(Label::Top) => summary.top += 1,
                    Some(Label::Bottom) => summary.bottom += 1,
                    None => summary.undecided += 1,
                },
                Outcome::Failed(kind) => *summary.failed.entry(kind).or_insert(0) += 1,
            }
        }
        summary
    }

    /// Outcome per stem, the shape evaluation expects
    pub fn outcome_map(&self) -> BTreeMap<String, Outcome> {
        self.outcomes
            .iter()
            .map(|(stem, file)| (stem.clone(), file.outcome))
            .collect()
    }
}

pub struct BatchRunner<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> BatchRunner<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Sorted `*.csv` files directly inside `directory`
    pub fn list_inputs(directory: &Path) -> Result<Vec<PathBuf>> {
        if !directory.exists() {
            bail!("Directory does not exist: {}", directory.display());
        }
        if !directory.is_dir() {
            bail!("Path is not a directory: {}", directory.display());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
            .with_context(|| format!("Failed to read directory: {}", directory.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|s| s.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("csv"))
                        .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn run(&self, directory: &Path) -> Result<BatchReport> {
        log::info!("Starting analysis on directory: {}", directory.display());
        let files = Self::list_inputs(directory)?;
        log::debug!("Found {} spectrogram files", files.len());

        let start = std::time::Instant::now();
        let results: Vec<(String, FileOutcome)> = files
            .par_iter()
            .map(|path| (stem_of(path), self.classify_one(path)))
            .collect();

        let mut outcomes = BTreeMap::new();
        for (stem, outcome) in results {
            if outcomes.contains_key(&stem) {
                log::warn!(
                    "Skipping {}: stem '{}' already classified",
                    outcome.path.display(),
                    stem
                );
                continue;
            }
            outcomes.insert(stem, outcome);
        }

        let report = BatchReport {
            directory: directory.to_path_buf(),
            outcomes,
        };
        let summary = report.summary();
        log::info!(
            "Analysis completed in {:.2}s: {} files, {} top, {} bottom, {} undecided, {} failed",
            start.elapsed().as_secs_f64(),
            summary.files,
            summary.top,
            summary.bottom,
            summary.undecided,
            summary.failed.values().sum::<usize>()
        );
        Ok(report)
    }

    fn classify_one(&self, path: &Path) -> FileOutcome {
        let result = self.pipeline.classify_file(path);
        let outcome = Outcome::from_result(&result);
        match result {
            Ok(prediction) => {
                log::debug!(
                    "{}: {} (top {:.4}, bottom {:.4})",
                    path.display(),
                    prediction.decision,
                    prediction.top_score,
                    prediction.bottom_score
                );
                FileOutcome {
                    path: path.to_path_buf(),
                    outcome,
                    prediction: Some(prediction),
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("Failed to classify {}: {}", path.display(), e);
                FileOutcome {
                    path: path.to_path_buf(),
                    outcome,
                    prediction: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
