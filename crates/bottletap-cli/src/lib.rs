//! Bottletap CLI - batch classification, evaluation and inspection tools

pub mod batch;
pub mod logging;
pub mod output;

use anyhow::{Context, Result};
use bottletap_core::BottletapConfig;
use std::path::Path;

/// Configuration file picked up from the working directory when `-c` is absent
pub const DEFAULT_CONFIG: &str = "bottletap.toml";

/// Load the given config, else `bottletap.toml` if present, else defaults
pub fn load_config(path: Option<&Path>) -> Result<BottletapConfig> {
    let fallback = Path::new(DEFAULT_CONFIG);
    let path = match path {
        Some(path) => Some(path),
        None if fallback.is_file() => Some(fallback),
        None => None,
    };

    match path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path.display());
            BottletapConfig::load(path)
                .with_context(|| format!("Invalid configuration: {}", path.display()))
        }
        None => {
            log::info!("No configuration file, using defaults");
            let config = BottletapConfig::default();
            config.validate().context("Invalid default configuration")?;
            Ok(config)
        }
    }
}
