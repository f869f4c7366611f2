//! Reference prototypes for the two known classes
//!
//! Built once at startup and shared read-only by every classification.

use crate::classifier::Label;
use crate::config::BottletapConfig;
use crate::error::{ClassifyError, Result};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::load_table;
use bottletap_table::SpectrogramTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-feature standardization statistics and discriminative weights.
///
/// Derived offline from labeled data and supplied as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Normalization {
    /// Check cardinality against the schema and that every `std` is positive
    pub fn validate(&self, expected: usize) -> Result<()> {
        let tables = [
            ("mean", &self.mean),
            ("std", &self.std),
            ("weights", &self.weights),
        ];
        for (name, values) in tables {
            if values.len() != expected {
                return Err(ClassifyError::Configuration(format!(
                    "normalization.{} has {} entries, feature schema has {}",
                    name,
                    values.len(),
                    expected
                )));
            }
            if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
                return Err(ClassifyError::Configuration(format!(
                    "normalization.{}[{}] is not finite",
                    name, idx
                )));
            }
        }

        if let Some((idx, std)) = self.std.iter().enumerate().find(|(_, &s)| s <= 0.0) {
            return Err(ClassifyError::Configuration(format!(
                "normalization.std[{}] must be > 0 (got {})",
                idx, std
            )));
        }

        Ok(())
    }

    /// Standardize then weight: `(x - mean) / std * weight`
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(&self.mean)
            .zip(&self.std)
            .zip(&self.weights)
            .map(|(((x, mean), std), weight)| (x - mean) / std * weight)
            .collect()
    }
}

/// Immutable class prototypes sharing one feature layout
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    feature_names: Vec<String>,
    top: FeatureVector,
    bottom: FeatureVector,
    normalization: Option<Normalization>,
}

impl ReferenceStore {
    /// Build a store from precomputed prototype vectors, one name per feature
    pub fn new(
        feature_names: Vec<String>,
        top: FeatureVector,
        bottom: FeatureVector,
        normalization: Option<Normalization>,
    ) -> Result<Self> {
        let expected = feature_names.len();
        if expected == 0 {
            return Err(ClassifyError::Configuration(
                "reference prototypes need at least one feature".to_string(),
            ));
        }
        for (label, prototype) in [(Label::Top, &top), (Label::Bottom, &bottom)] {
            if prototype.len() != expected {
                return Err(ClassifyError::Configuration(format!(
                    "{} prototype has {} features, schema has {}",
                    label,
                    prototype.len(),
                    expected
                )));
            }
            if let Some(idx) = prototype.values().iter().position(|v| !v.is_finite()) {
                return Err(ClassifyError::Configuration(format!(
                    "{} prototype feature `{}` is not finite",
                    label, feature_names[idx]
                )));
            }
        }
        if let Some(normalization) = &normalization {
            normalization.validate(expected)?;
        }

        Ok(Self {
            feature_names,
            top,
            bottom,
            normalization,
        })
    }

    /// Build a store by extracting features from one reference table per class.
    ///
    /// Any failure here is a configuration problem: without both references
    /// nothing can be classified.
    pub fn from_tables(
        extractor: &FeatureExtractor,
        top: &SpectrogramTable,
        bottom: &SpectrogramTable,
        normalization: Option<Normalization>,
    ) -> Result<Self> {
        let extract = |label: Label, table: &SpectrogramTable| {
            extractor.extract(table).map_err(|e| {
                ClassifyError::Configuration(format!("{} reference unusable: {}", label, e))
            })
        };
        let top = extract(Label::Top, top)?;
        let bottom = extract(Label::Bottom, bottom)?;
        Self::new(extractor.schema().names(), top, bottom, normalization)
    }

    /// Build the store described by a configuration
    pub fn from_config(config: &BottletapConfig) -> Result<Self> {
        config.validate()?;
        let schema = config.schema();
        let normalization = config.normalization.clone();

        if let Some((top, bottom)) = config.references.inline_prototypes() {
            log::info!("Using inline reference prototypes ({} features)", schema.len());
            return Self::new(
                schema.names(),
                FeatureVector::new(top.to_vec()),
                FeatureVector::new(bottom.to_vec()),
                normalization,
            );
        }

        let (top_path, bottom_path) = config.references.files().ok_or_else(|| {
            ClassifyError::Configuration("no reference files configured".to_string())
        })?;
        log::info!(
            "Loading references: top={}, bottom={}",
            top_path.display(),
            bottom_path.display()
        );

        let top = load_reference(Label::Top, top_path)?;
        let bottom = load_reference(Label::Bottom, bottom_path)?;
        Self::from_tables(&FeatureExtractor::new(schema), &top, &bottom, normalization)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of features per prototype
    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    pub fn prototype(&self, label: Label) -> &FeatureVector {
        match label {
            Label::Top => &self.top,
            Label::Bottom => &self.bottom,
        }
    }

    pub fn normalization(&self) -> Option<&Normalization> {
        self.normalization.as_ref()
    }

    /// Same store with the top and bottom roles exchanged
    pub fn swapped(&self) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            top: self.bottom.clone(),
            bottom: self.top.clone(),
            normalization: self.normalization.clone(),
        }
    }
}

fn load_reference(label: Label, path: &Path) -> Result<SpectrogramTable> {
    load_table(path)
        .map_err(|e| ClassifyError::Configuration(format!("{} reference unusable: {}", label, e)))
}
