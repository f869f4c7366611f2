//! Error kinds surfaced to callers of the classifier
//!
//! Abstention is not an error: an undecided prediction is a normal
//! `Ok` result. Everything here means the input or setup was broken.

use bottletap_table::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Input could not be parsed into a spectrogram table
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    /// Parsed table is empty or otherwise degenerate
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A feature hit a mathematical singularity
    #[error("feature `{feature}` is undefined: {reason}")]
    UndefinedFeature { feature: String, reason: String },

    /// Reference or normalization tables are unusable; fatal at startup
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClassifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifyError::Load { .. } => ErrorKind::Load,
            ClassifyError::MalformedInput(_) => ErrorKind::MalformedInput,
            ClassifyError::UndefinedFeature { .. } => ErrorKind::UndefinedFeature,
            ClassifyError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn undefined(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        ClassifyError::UndefinedFeature {
            feature: feature.into(),
            reason: reason.into(),
        }
    }
}

/// Error category used when aggregating batch results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Load,
    MalformedInput,
    UndefinedFeature,
    Configuration,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::Load,
        ErrorKind::MalformedInput,
        ErrorKind::UndefinedFeature,
        ErrorKind::Configuration,
    ];

    /// Only configuration problems abort a whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Load => "load",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::UndefinedFeature => "undefined_feature",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            ClassifyError::Load {
                path: PathBuf::from("a.csv"),
                source: TableError::Empty,
            },
            ClassifyError::MalformedInput("zero columns".to_string()),
            ClassifyError::undefined("spectral_centroid", "zero total power"),
            ClassifyError::Configuration("std must be > 0".to_string()),
        ];
        let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, ErrorKind::ALL.to_vec());
    }

    #[test]
    fn test_only_configuration_is_fatal() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.is_fatal(), kind == ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_display_includes_path_and_feature() {
        let err = ClassifyError::Load {
            path: PathBuf::from("data/x.csv"),
            source: TableError::Empty,
        };
        assert!(err.to_string().contains("data/x.csv"));

        let err = ClassifyError::undefined("spectral_centroid", "zero total power");
        assert!(err.to_string().contains("spectral_centroid"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UndefinedFeature).unwrap();
        assert_eq!(json, "\"undefined_feature\"");
    }
}
