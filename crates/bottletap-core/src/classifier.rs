//! Nearest-prototype classification with abstention
//!
//! Two scoring strategies:
//! - `Euclidean`: raw-space distance to each prototype, undecided when the
//!   distance gap is below `margin_fraction` of the larger distance.
//! - `WeightedCosine`: standardize and weight query and prototypes, then
//!   compare cosine similarities, undecided when the gap is below
//!   `similarity_gap`.

use crate::config::{BottletapConfig, ClassifierConfig};
use crate::error::{ClassifyError, Result};
use crate::features::FeatureVector;
use crate::reference::ReferenceStore;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;


/// Known classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Top,
    Bottom,
}

impl Label {
    /// Integer class id: top = 0, bottom = 1
    pub fn index(&self) -> u8 {
        match self {
            Label::Top => 0,
            Label::Bottom => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Top => "top",
            Label::Bottom => "bottom",
        }
    }

    pub fn other(&self) -> Label {
        match self {
            Label::Top => Label::Bottom,
            Label::Bottom => Label::Top,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "0" => Ok(Label::Top),
            "bottom" | "1" => Ok(Label::Bottom),
            other => Err(format!("unknown label `{}`", other)),
        }
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Class(Label),
    /// Prototypes too close to call
    Undecided,
}

impl Decision {
    pub fn label(&self) -> Option<Label> {
        match self {
            Decision::Class(label) => Some(*label),
            Decision::Undecided => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Class(label) => label.as_str(),
            Decision::Undecided => "undecided",
        }
    }

    /// Same decision with the class roles exchanged
    pub fn flipped(&self) -> Decision {
        match self {
            Decision::Class(label) => Decision::Class(label.other()),
            Decision::Undecided => Decision::Undecided,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Scoring strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Euclidean,
    WeightedCosine,
}

/// What the per-class scores measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Lower is closer
    EuclideanDistance,
    /// Higher is closer
    CosineSimilarity,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::EuclideanDistance => "euclidean_distance",
            Metric::CosineSimilarity => "cosine_similarity",
        }
    }
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub decision: Decision,
    pub top_score: f64,
    pub bottom_score: f64,
    pub metric: Metric,
}

/// Nearest-prototype classifier over a read-only reference store
#[derive(Debug, Clone)]
pub struct Classifier {
    store: ReferenceStore,
    settings: ClassifierConfig,
    /// Prototypes after standardization and weighting (cosine strategy only)
    weighted_prototypes: Option<(Vec<f64>, Vec<f64>)>,
}

impl Classifier {
    pub fn new(store: ReferenceStore, settings: ClassifierConfig) -> Result<Self> {
        let margin = settings.margin_fraction;
        if !margin.is_finite() || !(0.0..1.0).contains(&margin) {
            return Err(ClassifyError::Configuration(format!(
                "margin_fraction must be in [0, 1) (got {})",
                margin
            )));
        }
        let gap = settings.similarity_gap;
        if !gap.is_finite() || gap < 0.0 {
            return Err(ClassifyError::Configuration(format!(
                "similarity_gap must be finite and >= 0 (got {})",
                gap
            )));
        }

        let weighted_prototypes = match settings.strategy {
            Strategy::Euclidean => None,
            Strategy::WeightedCosine => {
                let normalization = store.normalization().ok_or_else(|| {
                    ClassifyError::Configuration(
                        "weighted_cosine strategy requires normalization statistics".to_string(),
                    )
                })?;
                let top = normalization.apply(store.prototype(Label::Top).values());
                let bottom = normalization.apply(store.prototype(Label::Bottom).values());
                for (label, weighted) in [(Label::Top, &top), (Label::Bottom, &bottom)] {
                    let n = norm(weighted);
                    if n == 0.0 || !n.is_finite() {
                        return Err(ClassifyError::Configuration(format!(
                            "weighted {} prototype norm is zero or not finite",
                            label
                        )));
                    }
                }
                Some((top, bottom))
            }
        };

        Ok(Self {
            store,
            settings,
            weighted_prototypes,
        })
    }

    /// Build references and classifier from configuration
    pub fn from_config(config: &BottletapConfig) -> Result<Self> {
        let store = ReferenceStore::from_config(config)?;
        Self::new(store, config.classifier.clone())
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    pub fn settings(&self) -> &ClassifierConfig {
        &self.settings
    }

    /// Classify a feature vector
    pub fn classify(&self, query: &FeatureVector) -> Result<Prediction> {
        self.check_query(query)?;

        let prediction = match &self.weighted_prototypes {
            None => {
                let prototype = |label| self.store.prototype(label).values();
                let top = euclidean(query.values(), prototype(Label::Top));
                let bottom = euclidean(query.values(), prototype(Label::Bottom));
                Prediction {
                    decision: decide_by_distance(top, bottom, self.settings.margin_fraction),
                    top_score: top,
                    bottom_score: bottom,
                    metric: Metric::EuclideanDistance,
                }
            }
            Some((top_proto, bottom_proto)) => {
                let normalization = self.store.normalization().ok_or_else(|| {
                    ClassifyError::Configuration("normalization statistics missing".to_string())
                })?;
                let weighted = normalization.apply(query.values());
                let query_norm = norm(&weighted);
                if query_norm == 0.0 || !query_norm.is_finite() {
                    return Err(ClassifyError::undefined(
                        "weighted_query",
                        "standardized query has zero norm, cosine similarity is undefined",
                    ));
                }
                let top = cosine(&weighted, query_norm, top_proto);
                let bottom = cosine(&weighted, query_norm, bottom_proto);
                Prediction {
                    decision: decide_by_similarity(top, bottom, self.settings.similarity_gap),
                    top_score: top,
                    bottom_score: bottom,
                    metric: Metric::CosineSimilarity,
                }
            }
        };

        if !prediction.top_score.is_finite() || !prediction.bottom_score.is_finite() {
            return Err(ClassifyError::undefined(
                prediction.metric.as_str(),
                format!(
                    "score is not finite (top {}, bottom {})",
                    prediction.top_score, prediction.bottom_score
                ),
            ));
        }

        log::debug!(
            "top={:.6}, bottom={:.6} ({:?}) -> {}",
            prediction.top_score,
            prediction.bottom_score,
            prediction.metric,
            prediction.decision
        );

        Ok(prediction)
    }

    fn check_query(&self, query: &FeatureVector) -> Result<()> {
        let names = self.store.feature_names();
        if query.len() != names.len() {
            return Err(ClassifyError::MalformedInput(format!(
                "query has {} features, references have {}",
                query.len(),
                names.len()
            )));
        }
        if let Some(idx) = query.values().iter().position(|v| !v.is_finite()) {
            return Err(ClassifyError::undefined(
                names[idx].clone(),
                format!("value is {}", query.values()[idx]),
            ));
        }
        Ok(())
    }
}

/// Nearer prototype wins unless the gap is within `margin_fraction` of the larger distance
fn decide_by_distance(top: f64, bottom: f64, margin_fraction: f64) -> Decision {
    let gap = (top - bottom).abs();
    if gap == 0.0 || gap < margin_fraction * top.max(bottom) {
        Decision::Undecided
    } else if top < bottom {
        Decision::Class(Label::Top)
    } else {
        Decision::Class(Label::Bottom)
    }
}

/// More similar prototype wins unless the gap is below `min_gap`
fn decide_by_similarity(top: f64, bottom: f64, min_gap: f64) -> Decision {
    let gap = (top - bottom).abs();
    if gap == 0.0 || gap < min_gap {
        Decision::Undecided
    } else if top > bottom {
        Decision::Class(Label::Top)
    } else {
        Decision::Class(Label::Bottom)
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn cosine(query: &[f64], query_norm: f64, prototype: &[f64]) -> f64 {
    let dot: f64 = query.iter().zip(prototype).map(|(a, b)| a * b).sum();
    dot / (query_norm * norm(prototype))
}
