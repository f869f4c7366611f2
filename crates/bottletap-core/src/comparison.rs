//! Side-by-side view of a query against both reference prototypes
//!
//! Each feature is scaled by its largest value across the three vectors so
//! features with very different ranges can be eyeballed together.

use crate::classifier::Label;
use crate::error::{ClassifyError, Result};
use crate::features::FeatureVector;
use crate::reference::ReferenceStore;
use serde::Serialize;

/// One feature across query and references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub feature: String,
    pub query: f64,
    pub top: f64,
    pub bottom: f64,
    pub query_scaled: f64,
    pub top_scaled: f64,
    pub bottom_scaled: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureComparison {
    pub rows: Vec<ComparisonRow>,
}

impl FeatureComparison {
    pub fn new(store: &ReferenceStore, query: &FeatureVector) -> Result<Self> {
        if query.len() != store.len() {
            return Err(ClassifyError::MalformedInput(format!(
                "query has {} features, references have {}",
                query.len(),
                store.len()
            )));
        }

        let top = store.prototype(Label::Top).values();
        let bottom = store.prototype(Label::Bottom).values();

        let rows = store
            .feature_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (q, t, b) = (query.values()[i], top[i], bottom[i]);
                let mut scale = q.max(t).max(b);
                if scale == 0.0 {
                    scale = 1.0;
                }
                ComparisonRow {
                    feature: name.clone(),
                    query: q,
                    top: t,
                    bottom: b,
                    query_scaled: q / scale,
                    top_scaled: t / scale,
                    bottom_scaled: b / scale,
                }
            })
            .collect();

        Ok(Self { rows })
    }

    /// Label whose prototype is nearer on the scaled axis, per feature
    pub fn nearer_per_feature(&self) -> Vec<Option<Label>> {
        self.rows
            .iter()
            .map(|row| {
                let to_top = (row.query_scaled - row.top_scaled).abs();
                let to_bottom = (row.query_scaled - row.bottom_scaled).abs();
                if to_top < to_bottom {
                    Some(Label::Top)
                } else if to_bottom < to_top {
                    Some(Label::Bottom)
                } else {
                    None
                }
            })
            .collect()
    }
}
