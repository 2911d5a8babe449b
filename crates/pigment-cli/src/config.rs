//! Optional YAML configuration.
//!
//! ```yaml
//! fit:
//!   reference_white: titanium white
//!   consistency_tolerance: 0.005
//! search:
//!   max_pigments: 3
//!   error_space: lab
//! ```
//!
//! Every key is optional; command-line flags override the file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pigment_mixing::FitOptions;
use pigment_recipe::SearchConfig;
use serde::{Deserialize, Serialize};

/// Settings shared by all commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model fitting.
    pub fit: FitOptions,
    /// Recipe search.
    pub search: SearchConfig,
}

impl Config {
    /// Reads `path`, or returns defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.search.validate().context("invalid search settings")?;
        Ok(config)
    }
}
