//! Logging initialisation for command-line tools
//!
//! Output goes to stderr so that results printed on stdout stay machine
//! readable. `RUST_LOG` always wins over the configured level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as tfmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Error, Result};

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!("unknown log format '{}'", other))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
    /// ANSI colours on text output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            ansi: true,
        }
    }
}

/// Raise the configured level by the number of `-v` flags
pub fn level_for_verbosity(configured: &str, verbosity: u8) -> &str {
    match verbosity {
        0 => configured,
        1 => "debug",
        _ => "trace",
    }
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Error::logging(format!("invalid log level '{}': {}", level, e))),
    }
}

/// Install the global subscriber
pub fn init_with_config(config: &LogConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Text => registry
            .with(
                tfmt::layer()
                    .with_target(false)
                    .with_ansi(config.ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(tfmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    installed.map_err(|e| Error::logging(e.to_string()))
}

/// Install a text subscriber at `level`
pub fn init(level: &str) -> Result<()> {
    init_with_config(&LogConfig {
        level: level.to_string(),
        ..Default::default()
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_overrides_level() {
        assert_eq!(level_for_verbosity("warn", 0), "warn");
        assert_eq!(level_for_verbosity("warn", 1), "debug");
        assert_eq!(level_for_verbosity("info", 4), "trace");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_second_init_is_an_error() {
        // Either call may be first depending on test ordering; only one can win
        let first = init("info");
        let second = init("info");
        assert!(first.is_err() || second.is_err());
    }
}
