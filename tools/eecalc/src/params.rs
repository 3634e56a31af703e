//! Parameter collection for `run` and `explain-payload`
//!
//! Layering: calculator defaults < parameter file < `EECALC_PARAM_*` env <
//! `--set key=value`. Defaults are applied by the calculator itself, so only
//! the overrides are gathered here.

use anyhow::{bail, Context, Result};
use ee_calc::{ParamValue, ParameterSet};
use std::path::Path;
use tracing::debug;

use crate::config::PARAM_ENV_PREFIX;

/// Parse one `key=value` override
pub fn parse_assignment(raw: &str) -> Result<(String, ParamValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected key=value, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty parameter name in '{}'", raw);
    }
    Ok((key.to_string(), ParamValue::parse(value.trim())))
}

pub fn collect(file: Option<&Path>, assignments: &[String]) -> Result<ParameterSet> {
    let mut set: ParameterSet = common::config::load_overrides(file, PARAM_ENV_PREFIX)
        .context("failed to read parameters")?;

    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        set.insert(key, value);
    }

    debug!(count = set.len(), "parameters collected");
    Ok(set)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_assignment() {
        let (k, v) = parse_assignment("vin = 12.5").unwrap();
        assert_eq!(k, "vin");
        assert_eq!(v, ParamValue::Number(12.5));

        let (_, v) = parse_assignment("topology=inverting").unwrap();
        assert_eq!(v, ParamValue::Text("inverting".to_string()));

        let (_, v) = parse_assignment("loop=false").unwrap();
        assert_eq!(v, ParamValue::Flag(false));

        assert!(parse_assignment("vin").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_set_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ct.yaml");
        fs::write(&path, "ip: 80\nifault: 1000\n").unwrap();

        let set = collect(Some(&path), &["ifault=2500".to_string()]).unwrap();
        assert_eq!(set.get("ip"), Some(&ParamValue::Number(80.0)));
        assert_eq!(set.get("ifault"), Some(&ParamValue::Number(2500.0)));
    }

    #[test]
    fn test_no_sources_gives_empty_set() {
        let set = collect(None, &[]).unwrap();
        assert!(set.is_empty());
    }
}
