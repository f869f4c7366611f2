//! Configuration for feature extraction, references and scoring
//!
//! Defaults reproduce the reference setup: three bands split at 500 Hz and
//! 2 kHz, Euclidean scoring with a 5% abstention margin, and reference
//! spectrograms under `data/preprocessed/`.

use crate::classifier::Strategy;
use crate::error::{ClassifyError, Result};
use crate::features::{AttackOnset, Band, FeatureSchema};
use crate::reference::Normalization;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BottletapConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub references: ReferenceConfig,
    /// Per-feature statistics and weights, required by `weighted_cosine`
    #[serde(default)]
    pub normalization: Option<Normalization>,
}

/// Feature schema parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    #[serde(default = "default_bands")]
    pub bands: Vec<Band>,
    #[serde(default)]
    pub include_timing: bool,
    #[serde(default)]
    pub attack_onset: AttackOnset,
    #[serde(default = "default_decay_epsilon")]
    pub decay_epsilon: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            include_timing: false,
            attack_onset: AttackOnset::default(),
            decay_epsilon: default_decay_epsilon(),
        }
    }
}

fn default_bands() -> Vec<Band> {
    vec![
        Band::new("low", None, Some(500.0)),
        Band::new("mid", Some(500.0), Some(2000.0)),
        Band::new("high", Some(2000.0), None),
    ]
}

fn default_decay_epsilon() -> f64 {
    1e-6
}

/// Scoring parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub strategy: Strategy,
    /// Euclidean abstention: undecided when the distance gap is below
    /// this fraction of the larger distance
    #[serde(default = "default_margin_fraction")]
    pub margin_fraction: f64,
    /// Cosine abstention: undecided when the similarity gap is below this
    #[serde(default)]
    pub similarity_gap: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            margin_fraction: default_margin_fraction(),
            similarity_gap: 0.0,
        }
    }
}

fn default_margin_fraction() -> f64 {
    0.05
}

/// Where the class prototypes come from.
///
/// Inline prototypes take precedence over reference files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_top_path")]
    pub top: Option<PathBuf>,
    #[serde(default = "default_bottom_path")]
    pub bottom: Option<PathBuf>,
    #[serde(default)]
    pub top_prototype: Option<Vec<f64>>,
    #[serde(default)]
    pub bottom_prototype: Option<Vec<f64>>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            top: default_top_path(),
            bottom: default_bottom_path(),
            top_prototype: None,
            bottom_prototype: None,
        }
    }
}

fn default_top_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/preprocessed/top.csv"))
}

fn default_bottom_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/preprocessed/bottom.csv"))
}

impl ReferenceConfig {
    /// Inline prototypes, if both are configured
    pub fn inline_prototypes(&self) -> Option<(&[f64], &[f64])> {
        match (&self.top_prototype, &self.bottom_prototype) {
            (Some(top), Some(bottom)) => Some((top, bottom)),
            _ => None,
        }
    }

    /// Reference file paths, if both are configured
    pub fn files(&self) -> Option<(&Path, &Path)> {
        match (&self.top, &self.bottom) {
            (Some(top), Some(bottom)) => Some((top, bottom)),
            _ => None,
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.top, &mut self.bottom].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl BottletapConfig {
    /// Load and validate a TOML configuration file.
    ///
    /// Relative reference paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClassifyError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.references.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse and validate TOML text without touching the filesystem
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClassifyError::Configuration(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Feature schema shared by query and reference extraction
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::from_config(&self.features)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        validate_bands(&self.features.bands)?;

        let eps = self.features.decay_epsilon;
        if !eps.is_finite() || eps < 0.0 {
            return Err(ClassifyError::Configuration(format!(
                "decay_epsilon must be finite and >= 0 (got {})",
                eps
            )));
        }

        let margin = self.classifier.margin_fraction;
        if !margin.is_finite() || !(0.0..1.0).contains(&margin) {
            return Err(ClassifyError::Configuration(format!(
                "margin_fraction must be in [0, 1) (got {})",
                margin
            )));
        }

        let gap = self.classifier.similarity_gap;
        if !gap.is_finite() || gap < 0.0 {
            return Err(ClassifyError::Configuration(format!(
                "similarity_gap must be finite and >= 0 (got {})",
                gap
            )));
        }

        let expected = self.schema().len();
        if let Some(normalization) = &self.normalization {
            normalization.validate(expected)?;
        } else if self.classifier.strategy == Strategy::WeightedCosine {
            return Err(ClassifyError::Configuration(
                "weighted_cosine strategy requires a [normalization] section".to_string(),
            ));
        }

        let refs = &self.references;
        if refs.top_prototype.is_some() != refs.bottom_prototype.is_some() {
            return Err(ClassifyError::Configuration(
                "top_prototype and bottom_prototype must be given together".to_string(),
            ));
        }
        if let Some((top, bottom)) = refs.inline_prototypes() {
            for (label, values) in [("top", top), ("bottom", bottom)] {
                if values.len() != expected {
                    return Err(ClassifyError::Configuration(format!(
                        "{}_prototype has {} values, feature schema has {}",
                        label,
                        values.len(),
                        expected
                    )));
                }
            }
        } else if refs.files().is_none() {
            return Err(ClassifyError::Configuration(
                "references need either top/bottom files or top_prototype/bottom_prototype"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_bands(bands: &[Band]) -> Result<()> {
    if bands.is_empty() {
        return Err(ClassifyError::Configuration(
            "at least one frequency band is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for (idx, band) in bands.iter().enumerate() {
        if band.name.trim().is_empty() {
            return Err(ClassifyError::Configuration(format!("band {} has no name", idx)));
        }
        if !names.insert(band.name.as_str()) {
            return Err(ClassifyError::Configuration(format!(
                "duplicate band name `{}`",
                band.name
            )));
        }
        if band.min_hz.iter().chain(band.max_hz.iter()).any(|v| !v.is_finite()) {
            return Err(ClassifyError::Configuration(format!(
                "band `{}` has a non-finite edge",
                band.name
            )));
        }
        if let (Some(min), Some(max)) = (band.min_hz, band.max_hz) {
            if min >= max {
                return Err(ClassifyError::Configuration(format!(
                    "band `{}`: min_hz {} must be < max_hz {}",
                    band.name, min, max
                )));
            }
        }
    }

    for pair in bands.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        match (lower.max_hz, upper.min_hz) {
            (Some(max), Some(min)) if max <= min => {}
            _ => {
                return Err(ClassifyError::Configuration(format!(
                    "bands `{}` and `{}` overlap or are out of order",
                    lower.name, upper.name
                )))
            }
        }
    }

    Ok(())
}
