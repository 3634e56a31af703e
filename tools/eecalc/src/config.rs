//! CLI configuration: built-in defaults < `eecalc.toml` < `EECALC_*` env

use anyhow::{Context, Result};
use clap::ValueEnum;
use common::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "EECALC_";
pub const PARAM_ENV_PREFIX: &str = "EECALC_PARAM_";
pub const DEFAULT_CONFIG_FILE: &str = "eecalc.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Decimal places for text output
    pub precision: usize,
    /// Output format used when `--format` is not given
    pub format: OutputFormat,
    pub log: LogConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            format: OutputFormat::Text,
            log: LogConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load with an explicit file, or `./eecalc.toml` when present
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file: Option<PathBuf> = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.exists().then_some(fallback)
            },
        };

        common::config::load_layered(Self::default(), file.as_deref(), ENV_PREFIX)
            .context("failed to load eecalc configuration")
    }
}
