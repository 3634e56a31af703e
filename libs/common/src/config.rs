//! Layered configuration loading
//!
//! Priority (highest to lowest):
//! 1. Environment variables (prefixed)
//! 2. Config file (format chosen by extension)
//! 3. Default values

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// Figment reading a single file, format picked by extension
pub fn file_figment(path: &Path) -> Result<Figment> {
    if !path.exists() {
        return Err(Error::config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::config("config file must have an extension"))?;

    let figment = match extension {
        "toml" => Figment::new().merge(Toml::file(path)),
        "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
        "json" => Figment::new().merge(Json::file(path)),
        other => {
            return Err(Error::config(format!(
                "unsupported config file format: {}",
                other
            )))
        },
    };
    Ok(figment)
}

/// Load a value from one file
pub fn load_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    file_figment(path)?
        .extract()
        .map_err(|e| Error::config(format!("failed to load {}: {}", path.display(), e)))
}

/// Defaults < optional file < `{prefix}*` environment variables
///
/// Env keys are lowercased with the prefix stripped, so `EECALC_PRECISION`
/// with prefix `EECALC_` sets `precision`.
pub fn load_layered<T>(defaults: T, file: Option<&Path>, env_prefix: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut figment = Figment::from(Serialized::defaults(defaults));
    if let Some(path) = file {
        debug!(path = %path.display(), "loading config file");
        figment = figment.merge(file_figment(path)?);
    }
    figment = figment.merge(Env::prefixed(env_prefix));

    figment
        .extract()
        .map_err(|e| Error::config(format!("failed to load configuration: {}", e)))
}

/// Optional file < `{prefix}*` environment variables, no defaults layer
///
/// Used for flat maps where absent keys mean "use the built-in default".
pub fn load_overrides<T>(file: Option<&Path>, env_prefix: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut figment = Figment::new();
    if let Some(path) = file {
        figment = figment.merge(file_figment(path)?);
    }
    figment = figment.merge(Env::prefixed(env_prefix));

    figment
        .extract()
        .map_err(|e| Error::config(format!("failed to load overrides: {}", e)))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct ToolConfig {
        precision: usize,
        color: bool,
        label: String,
    }

    impl Default for ToolConfig {
        fn default() -> Self {
            Self {
                precision: 4,
                color: true,
                label: "default".to_string(),
            }
        }
    }

    #[test]
    fn test_defaults_when_nothing_given() {
        let config = load_layered(ToolConfig::default(), None, "COMMON_TEST_NONE_").unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.toml");
        fs::write(&path, "precision = 2\n").unwrap();

        let config =
            load_layered(ToolConfig::default(), Some(&path), "COMMON_TEST_TOML_").unwrap();
        assert_eq!(config.precision, 2);
        assert!(config.color);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.yaml");
        fs::write(&path, "precision: 2\nlabel: file\n").unwrap();
        std::env::set_var("COMMON_TEST_ENV_LABEL", "env");

        let config =
            load_layered(ToolConfig::default(), Some(&path), "COMMON_TEST_ENV_").unwrap();
        assert_eq!(config.precision, 2);
        assert_eq!(config.label, "env");

        std::env::remove_var("COMMON_TEST_ENV_LABEL");
    }

    #[test]
    fn test_overrides_map_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"vin": 12.5, "loop": true}"#).unwrap();

        let map: BTreeMap<String, serde_json::Value> =
            load_overrides(Some(&path), "COMMON_TEST_MAP_").unwrap();
        assert_eq!(map["vin"], serde_json::json!(12.5));
        assert_eq!(map["loop"], serde_json::json!(true));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.ini");
        fs::write(&path, "vin=1").unwrap();
        assert!(matches!(load_file::<ToolConfig, _>(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_file::<ToolConfig, _>("/nonexistent/eecalc.toml");
        assert!(result.is_err());
    }
}
