//! CLI configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use camdir_core::MatchPolicy;
use serde::Deserialize;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "CAMDIR_CONFIG";

/// Log filter used when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "camdir=info,camdir_core=info";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Scoring weights for best-match selection
    pub policy: MatchPolicy,
    /// `tracing` filter directive, e.g. `camdir_core=debug`
    pub log_filter: Option<String>,
    /// Clockwise mounting rotation in degrees, keyed by device id
    pub orientations: BTreeMap<String, u32>,
}

impl CliConfig {
    /// Default config file location: `$CAMDIR_CONFIG`, else
    /// `<config dir>/camdir/config.json`.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("camdir")
            .join("config.json")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .policy
            .validate()
            .with_context(|| format!("Invalid match policy in {}", path.display()))?;
        Ok(config)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
