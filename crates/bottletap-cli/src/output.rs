//! JSON and text output formatting

use crate::batch::{BatchReport, BatchSummary, FileOutcome};
use bottletap_core::comparison::FeatureComparison;
use bottletap_core::evaluation::{CombinationCount, Evaluation};
use bottletap_core::Prediction;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

#[derive(Serialize)]
struct PredictionsOutput<'a> {
    directory: &'a Path,
    predictions: &'a BTreeMap<String, FileOutcome>,
    summary: BatchSummary,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Batch predictions with a summary, as pretty JSON
pub fn predictions_json(report: &BatchReport) -> serde_json::Result<String> {
    let output = PredictionsOutput {
        directory: &report.directory,
        predictions: &report.outcomes,
        summary: report.summary(),
    };
    serde_json::to_string_pretty(&output)
}

/// Plain-text evaluation report: per-group tallies then every
/// (type, actual, predicted) combination in padded columns
pub fn render_evaluation(evaluation: &Evaluation) -> String {
    let mut out = String::from("Top-line results:\n");
    for (group, counts) in &evaluation.groups {
        let _ = write!(
            out,
            "{}: {} correct, {} incorrect, {} undecided, {} failed",
            group, counts.correct, counts.incorrect, counts.undecided, counts.failed
        );
        if counts.missing > 0 {
            let _ = write!(out, ", {} missing", counts.missing);
        }
        if counts.unscored > 0 {
            let _ = write!(out, ", {} unscored", counts.unscored);
        }
        out.push('\n');
    }

    out.push_str("\nAll combination counts:\n");
    out.push_str("TYPE\t\tACTUAL\tPRED\tCOUNT\n");
    for row in padded_combinations(&evaluation.combinations) {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// Each column padded on the right to one past its widest cell
fn padded_combinations(combinations: &[CombinationCount]) -> Vec<Vec<String>> {
    let cells: Vec<[String; 4]> = combinations
        .iter()
        .map(|c| {
            [
                c.group.clone(),
                c.actual.clone(),
                c.predicted.clone(),
                c.count.to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 4];
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    cells
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{:<w$}", cell, w = width + 1))
                .collect()
        })
        .collect()
}

/// Feature-by-feature table of a query against both references
pub fn render_comparison(
    comparison: &FeatureComparison,
    prediction: Option<&Prediction>,
) -> String {
    let nearer = comparison.nearer_per_feature();
    let width = comparison
        .rows
        .iter()
        .map(|row| row.feature.len())
        .max()
        .unwrap_or(0)
        .max("FEATURE".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<w$}  {:>12}  {:>12}  {:>12}  {:>7}  {:>7}  {:>7}  NEARER",
        "FEATURE",
        "QUERY",
        "TOP",
        "BOTTOM",
        "Q/MAX",
        "T/MAX",
        "B/MAX",
        w = width
    );
    for (row, nearer) in comparison.rows.iter().zip(nearer) {
        let _ = writeln!(
            out,
            "{:<w$}  {:>12.4}  {:>12.4}  {:>12.4}  {:>7.3}  {:>7.3}  {:>7.3}  {}",
            row.feature,
            row.query,
            row.top,
            row.bottom,
            row.query_scaled,
            row.top_scaled,
            row.bottom_scaled,
            nearer.map(|l| l.as_str()).unwrap_or("-"),
            w = width
        );
    }

    if let Some(prediction) = prediction {
        let _ = writeln!(
            out,
            "\nDecision: {} (top {:.4}, bottom {:.4})",
            prediction.decision, prediction.top_score, prediction.bottom_score
        );
    }
    out
}
