//! Feature extraction from spectrogram tables
//!
//! Reduces a frequency-by-time magnitude grid to a short fixed-length
//! descriptor. Query and reference tables must go through the same
//! `FeatureSchema`, otherwise their vectors are not comparable.
//!
//! Feature order:
//! 1. `overall_mean`
//! 2. `band_mean_<band>` for each band
//! 3. `peak_frequency`
//! 4. `decay_slope`
//! 5. `spectral_centroid`
//! 6. `attack_ms_<band>`, `release_ms_<band>` for each band (timing schemas only)

use crate::config::FeatureConfig;
use crate::error::{ClassifyError, Result};
use bottletap_table::SpectrogramTable;
use serde::{Deserialize, Serialize};

/// Fraction of the band peak below which the signal counts as silent before the attack
pub const ATTACK_FLOOR: f64 = 0.01;

/// Fraction of the band peak above which the signal still counts as ringing
pub const RELEASE_FLOOR: f64 = 0.10;

/// Contiguous frequency range `[min_hz, max_hz)`; a missing edge is unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_hz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hz: Option<f64>,
}

impl Band {
    pub fn new(name: impl Into<String>, min_hz: Option<f64>, max_hz: Option<f64>) -> Self {
        Self {
            name: name.into(),
            min_hz,
            max_hz,
        }
    }

    pub fn contains(&self, freq: f64) -> bool {
        self.min_hz.map_or(true, |min| freq >= min) && self.max_hz.map_or(true, |max| freq < max)
    }
}

/// Where the attack starts when no column before the peak drops below
/// `ATTACK_FLOOR`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOnset {
    /// Measure from the first time column
    #[default]
    FirstColumn,
    /// Report a zero attack time
    Peak,
}

/// Layout and parameters of the feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    bands: Vec<Band>,
    include_timing: bool,
    attack_onset: AttackOnset,
    decay_epsilon: f64,
}

impl FeatureSchema {
    /// overall mean, peak frequency, decay slope, spectral centroid
    const SCALAR_FEATURES: usize = 4;

    pub fn new(bands: Vec<Band>, include_timing: bool) -> Self {
        let defaults = FeatureConfig::default();
        Self {
            bands,
            include_timing,
            attack_onset: defaults.attack_onset,
            decay_epsilon: defaults.decay_epsilon,
        }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self {
            bands: config.bands.clone(),
            include_timing: config.include_timing,
            attack_onset: config.attack_onset,
            decay_epsilon: config.decay_epsilon,
        }
    }

    pub fn with_attack_onset(mut self, attack_onset: AttackOnset) -> Self {
        self.attack_onset = attack_onset;
        self
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn include_timing(&self) -> bool {
        self.include_timing
    }

    /// Number of values in every vector of this schema
    pub fn len(&self) -> usize {
        let timing = if self.include_timing { 2 * self.bands.len() } else { 0 };
        Self::SCALAR_FEATURES + self.bands.len() + timing
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature names in vector order
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.len());
        names.push("overall_mean".to_string());
        names.extend(self.bands.iter().map(|b| format!("band_mean_{}", b.name)));
        names.push("peak_frequency".to_string());
        names.push("decay_slope".to_string());
        names.push("spectral_centroid".to_string());
        if self.include_timing {
            for band in &self.bands {
                names.push(format!("attack_ms_{}", band.name));
                names.push(format!("release_ms_{}", band.name));
            }
        }
        names
    }

    /// Name of the feature at `index`, if any
    pub fn name(&self, index: usize) -> Option<String> {
        self.names().into_iter().nth(index)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}

/// Fixed-length descriptor of one spectrogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Feature extractor
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Extract the feature vector of a table
    pub fn extract(&self, table: &SpectrogramTable) -> Result<FeatureVector> {
        if table.num_rows() == 0 {
            return Err(ClassifyError::MalformedInput(
                "spectrogram has zero frequency rows".to_string(),
            ));
        }
        if table.num_cols() == 0 {
            return Err(ClassifyError::MalformedInput(
                "spectrogram has zero time columns".to_string(),
            ));
        }

        let freqs = table.frequencies();
        let times = table.times();
        let num_cols = table.num_cols() as f64;

        // Power per frequency row, summed across time
        let row_power: Vec<f64> = table.rows().map(|(_, row)| row.iter().sum()).collect();
        // Power per time column, summed across frequency
        let column_power = column_sums(table, |_| true);
        let total_power: f64 = row_power.iter().sum();

        let mut values = Vec::with_capacity(self.schema.len());

        values.push(total_power / (table.num_rows() as f64 * num_cols));

        for band in &self.schema.bands {
            values.push(band_mean(&row_power, freqs, band, num_cols));
        }

        let peak_row = stable_argmax(&row_power);
        values.push(freqs[peak_row]);

        values.push(decay_slope(times, &column_power, self.schema.decay_epsilon));

        if total_power <= 0.0 {
            return Err(ClassifyError::undefined(
                "spectral_centroid",
                "total spectral power is zero",
            ));
        }
        let weighted: f64 = freqs.iter().zip(&row_power).map(|(f, p)| f * p).sum();
        values.push(weighted / total_power);

        if self.schema.include_timing {
            for band in &self.schema.bands {
                let series = column_sums(table, |freq| band.contains(freq));
                let (attack, release) = attack_release(&series, times, self.schema.attack_onset);
                values.push(attack);
                values.push(release);
            }
        }

        debug_assert_eq!(values.len(), self.schema.len());
        log::trace!("Extracted {} features: {:?}", values.len(), values);

        Ok(FeatureVector::new(values))
    }
}

/// Sum magnitudes of the selected rows per time column
fn column_sums(table: &SpectrogramTable, include: impl Fn(f64) -> bool) -> Vec<f64> {
    let mut sums = vec![0.0; table.num_cols()];
    for (_, row) in table.rows().filter(|(freq, _)| include(*freq)) {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
    }
    sums
}

/// Mean magnitude over every cell of the band's rows; an empty band is 0
fn band_mean(row_power: &[f64], freqs: &[f64], band: &Band, num_cols: f64) -> f64 {
    let (sum, rows) = freqs
        .iter()
        .zip(row_power)
        .filter(|(freq, _)| band.contains(**freq))
        .fold((0.0, 0usize), |(sum, rows), (_, power)| (sum + power, rows + 1));

    if rows == 0 {
        0.0
    } else {
        sum / (rows as f64 * num_cols)
    }
}

/// Index of the largest value; ties resolve to the first occurrence
fn stable_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

/// Least-squares slope of `ln(power + eps)` against time.
///
/// Fewer than two distinct time labels leave the slope at 0.
fn decay_slope(times: &[f64], column_power: &[f64], eps: f64) -> f64 {
    let n = times.len() as f64;
    if times.len() < 2 {
        return 0.0;
    }

    let log_power: Vec<f64> = column_power.iter().map(|p| (p + eps).ln()).collect();
    let mean_t = times.iter().sum::<f64>() / n;
    let mean_y = log_power.iter().sum::<f64>() / n;

    let (sxy, sxx) = times
        .iter()
        .zip(&log_power)
        .fold((0.0, 0.0), |(sxy, sxx), (t, y)| {
            let dt = t - mean_t;
            (sxy + dt * (y - mean_y), sxx + dt * dt)
        });

    if sxx <= 0.0 || !sxy.is_finite() {
        return 0.0;
    }
    sxy / sxx
}

/// Attack and release times (in time-label units) of one band's power series
fn attack_release(series: &[f64], times: &[f64], onset: AttackOnset) -> (f64, f64) {
    if series.is_empty() {
        return (0.0, 0.0);
    }

    let peak_idx = stable_argmax(series);
    let peak = series[peak_idx];
    if peak <= 0.0 {
        return (0.0, 0.0);
    }

    let onset_idx = series[..peak_idx]
        .iter()
        .rposition(|&p| p < ATTACK_FLOOR * peak)
        .unwrap_or(match onset {
            AttackOnset::FirstColumn => 0,
            AttackOnset::Peak => peak_idx,
        });

    // The peak itself always exceeds the release floor
    let release_idx = series
        .iter()
        .rposition(|&p| p > RELEASE_FLOOR * peak)
        .unwrap_or(peak_idx);

    (
        times[peak_idx] - times[onset_idx],
        times[release_idx] - times[peak_idx],
    )
}
