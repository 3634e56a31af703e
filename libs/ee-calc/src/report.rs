//! Common result shape shared by every calculator
//!
//! A successful evaluation is a [`Report`]: named output fields, the
//! assessments that classify the result, and any raised limit flags.
//! Input errors are carried separately as [`crate::CalcError`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::engine::CalculatorKind;
use crate::numeric::finite;

/// Ordered three-tier risk classification: `Ok < Caution < Danger`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Ok,
    Caution,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Caution => "caution",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calculator-specific status that maps onto a [`RiskLevel`]
///
/// `level()` is `None` when the status could not be determined (for example
/// an SNR check with no usable noise figure); such a status does not take
/// part in the overall classification.
pub trait Status {
    fn level(&self) -> Option<RiskLevel>;

    /// Short human-readable description of the status
    fn label(&self) -> &'static str;
}

impl Status for RiskLevel {
    fn level(&self) -> Option<RiskLevel> {
        Some(*self)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Ok => "within limits",
            Self::Caution => "reduced margin",
            Self::Danger => "limit exceeded",
        }
    }
}

/// A single output value
///
/// `Undefined` stands for a quantity that is mathematically undefined for the
/// given inputs (division by zero, log of zero). It renders as "—" and
/// serialises as `null`, never as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
    Undefined,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Render for display with a fixed number of decimals for floats
    pub fn render(&self, precision: usize) -> String {
        match self {
            Self::Number(v) => format!("{:.*}", precision, v),
            Self::Integer(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Undefined => "—".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            other => f.write_str(&other.render(0)),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        finite(value).map_or(Self::Undefined, Self::Number)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::from)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One classified aspect of a result (operating scenario, inrush, SNR, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub name: String,
    pub status: String,
    pub level: Option<RiskLevel>,
}

/// Successful evaluation payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub calculator: CalculatorKind,
    pub fields: BTreeMap<String, FieldValue>,
    /// Highest level across all assessments; `None` for magnitude-only calculators
    pub classification: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assessments: Vec<Assessment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Report {
    pub fn new(calculator: CalculatorKind) -> Self {
        Self {
            calculator,
            fields: BTreeMap::new(),
            classification: None,
            assessments: Vec::new(),
            flags: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn assess(mut self, name: &str, status: &impl Status) -> Self {
        let level = status.level();
        self.assessments.push(Assessment {
            name: name.to_string(),
            status: status.label().to_string(),
            level,
        });
        if let Some(level) = level {
            self.classification = Some(self.classification.map_or(level, |c| c.max(level)));
        }
        self
    }

    pub fn flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric value of a field, `None` if missing or undefined
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    pub fn assessment(&self, name: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.name == name)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Ok < RiskLevel::Caution);
        assert!(RiskLevel::Caution < RiskLevel::Danger);
        assert_eq!(
            [RiskLevel::Caution, RiskLevel::Danger, RiskLevel::Ok]
                .into_iter()
                .max(),
            Some(RiskLevel::Danger)
        );
    }

    #[test]
    fn test_non_finite_becomes_undefined() {
        assert_eq!(FieldValue::from(f64::NAN), FieldValue::Undefined);
        assert_eq!(FieldValue::from(f64::INFINITY), FieldValue::Undefined);
        assert_eq!(FieldValue::from(None::<f64>), FieldValue::Undefined);
        assert_eq!(FieldValue::from(1.5), FieldValue::Number(1.5));
    }

    #[test]
    fn test_render() {
        assert_eq!(FieldValue::Number(2.0).render(3), "2.000");
        assert_eq!(FieldValue::Undefined.render(3), "—");
        assert_eq!(FieldValue::Integer(4095).render(3), "4095");
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let json = serde_json::to_value(FieldValue::Undefined).unwrap();
        assert!(json.is_null());
    }

    #[test]
    fn test_classification_is_max_of_assessments() {
        let report = Report::new(CalculatorKind::Ct)
            .assess("a", &RiskLevel::Caution)
            .assess("b", &RiskLevel::Ok);
        assert_eq!(report.classification, Some(RiskLevel::Caution));

        let empty = Report::new(CalculatorKind::PowerQuality);
        assert_eq!(empty.classification, None);
    }
}
