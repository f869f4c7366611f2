//! End-to-end classification: load, extract, score

use crate::classifier::{Classifier, Prediction};
use crate::config::BottletapConfig;
use crate::error::{ClassifyError, Result};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::load_table;
use bottletap_table::SpectrogramTable;
use std::path::Path;

/// Feature extractor paired with a classifier whose references use the same schema
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: FeatureExtractor,
    classifier: Classifier,
}

impl Pipeline {
    pub fn new(extractor: FeatureExtractor, classifier: Classifier) -> Result<Self> {
        let names = extractor.schema().names();
        if names.as_slice() != classifier.store().feature_names() {
            return Err(ClassifyError::Configuration(format!(
                "extractor produces {} features but references were built with {}",
                names.len(),
                classifier.store().len()
            )));
        }
        Ok(Self {
            extractor,
            classifier,
        })
    }

    /// Build references and classifier once; configuration errors are fatal
    pub fn from_config(config: &BottletapConfig) -> Result<Self> {
        let extractor = FeatureExtractor::new(config.schema());
        let classifier = Classifier::from_config(config)?;
        Self::new(extractor, classifier)
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Extract features of a file
    pub fn extract_file(&self, path: &Path) -> Result<FeatureVector> {
        let table = load_table(path)?;
        self.extractor.extract(&table)
    }

    pub fn classify_table(&self, table: &SpectrogramTable) -> Result<Prediction> {
        let features = self.extractor.extract(table)?;
        self.classifier.classify(&features)
    }

    /// Classify one spectrogram file
    pub fn classify_file(&self, path: &Path) -> Result<Prediction> {
        let table = load_table(path)?;
        log::debug!(
            "Loaded {}: {} frequency rows x {} time columns",
            path.display(),
            table.num_rows(),
            table.num_cols()
        );
        self.classify_table(&table)
    }
}
