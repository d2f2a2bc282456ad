//! Planner settings read from a TOML file.
//!
//! ```toml
//! engine = "gbfs-hadd"
//! max_expansions = 500000
//! log_level = "debug"
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::planner::engine::{Engine, DEFAULT_MAX_EXPANSIONS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn default_max_expansions() -> usize {
    DEFAULT_MAX_EXPANSIONS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// Overrides the engine each puzzle picks for itself.
    #[serde(default)]
    pub engine: Option<Engine>,

    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { engine: None, max_expansions: DEFAULT_MAX_EXPANSIONS, log_level: None }
    }
}

impl PlannerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}
