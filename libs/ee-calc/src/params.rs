//! Parameter sets
//!
//! A [`ParameterSet`] is the flat `name -> value` mapping handed to a
//! calculator. Values are numbers, flags or text choices. Missing names fall
//! back to the calculator's defaults; present values are checked on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CalcError, Result};

/// One raw parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl ParamValue {
    /// Parse a `--set key=value` style literal
    ///
    /// Numbers win over flags, flags over text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(number) = trimmed.parse::<f64>() {
            return Self::Number(number);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Self::Flag(true),
            "false" | "no" | "off" => Self::Flag(false),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Flag(_) => "flag",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Flag(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Flat mapping of named parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `other` on top of this set; `other` wins on collisions
    pub fn merge(&mut self, other: ParameterSet) {
        self.values.extend(other.values);
    }

    /// Read a numeric parameter
    ///
    /// Non-finite numbers are rejected here so no `NaN`/`inf` ever reaches a
    /// calculation.
    pub fn number(&self, name: &str, default: f64) -> Result<f64> {
        match self.values.get(name) {
            None => Ok(default),
            Some(ParamValue::Number(v)) if v.is_finite() => Ok(*v),
            Some(ParamValue::Number(v)) => Err(CalcError::invalid_parameter(
                name,
                format!("must be a finite number, got {}", v),
            )),
            Some(other) => Err(CalcError::invalid_parameter(
                name,
                format!("expected a number, got {} '{}'", other.kind(), other),
            )),
        }
    }

    /// Read a flag; numbers count as `true` when non-zero
    pub fn flag(&self, name: &str, default: bool) -> Result<bool> {
        match self.values.get(name) {
            None => Ok(default),
            Some(ParamValue::Flag(v)) => Ok(*v),
            Some(ParamValue::Number(v)) if v.is_finite() => Ok(*v != 0.0),
            Some(other) => Err(CalcError::invalid_parameter(
                name,
                format!("expected a flag, got {} '{}'", other.kind(), other),
            )),
        }
    }

    /// Read a text choice parsed through `FromStr`
    ///
    /// Whole numbers are accepted as their integer text, so `--set mode=3`
    /// reaches a choice spelled `"3"`.
    pub fn choice<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let parse = |raw: &str| {
            raw.parse()
                .map_err(|e: T::Err| CalcError::invalid_parameter(name, e.to_string()))
        };
        match self.values.get(name) {
            None => Ok(default),
            Some(ParamValue::Text(s)) => parse(s),
            Some(ParamValue::Number(v)) if v.is_finite() && v.fract() == 0.0 => {
                parse(&format!("{}", v))
            },
            Some(other) => Err(CalcError::invalid_parameter(
                name,
                format!("expected a text choice, got {} '{}'", other.kind(), other),
            )),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Default value advertised in a parameter catalogue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamDefault {
    Number(f64),
    Flag(bool),
    Choice(String),
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Flag(v) => write!(f, "{}", v),
            Self::Choice(s) => f.write_str(s),
        }
    }
}

/// Catalogue entry describing one accepted parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub unit: &'static str,
    pub default: ParamDefault,
    pub description: &'static str,
}

impl ParameterSpec {
    pub fn number(
        name: &'static str,
        unit: &'static str,
        default: f64,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            unit,
            default: ParamDefault::Number(default),
            description,
        }
    }

    pub fn flag(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            unit: "",
            default: ParamDefault::Flag(default),
            description,
        }
    }

    pub fn choice(
        name: &'static str,
        default: impl fmt::Display,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            unit: "",
            default: ParamDefault::Choice(default.to_string()),
            description,
        }
    }
}
