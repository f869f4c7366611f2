//! Bottletap Core - spectrogram feature extraction and tap-position classification
//!
//! Reduces a preprocessed frequency-by-time magnitude table to a short
//! feature vector and assigns it to the nearer of two reference classes
//! (`top` / `bottom`), abstaining when the call is too close.

pub mod classifier;
pub mod comparison;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod pipeline;
pub mod reference;

pub use bottletap_table::SpectrogramTable;
pub use classifier::{Classifier, Decision, Label, Metric, Prediction, Strategy};
pub use comparison::FeatureComparison;
pub use config::BottletapConfig;
pub use error::{ClassifyError, ErrorKind, Result};
pub use evaluation::{AnswerKey, Evaluation, Outcome};
pub use features::{Band, FeatureExtractor, FeatureSchema, FeatureVector};
pub use pipeline::Pipeline;
pub use reference::{Normalization, ReferenceStore};

use bottletap_table::TableReader;
use std::path::Path;

/// Load a spectrogram table, reporting parse failures as `ClassifyError::Load`
pub fn load_table(path: &Path) -> Result<SpectrogramTable> {
    TableReader::read(path).map_err(|source| ClassifyError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Classify one spectrogram file
pub fn classify_file(path: &Path, pipeline: &Pipeline) -> Result<Prediction> {
    pipeline.classify_file(path)
}
