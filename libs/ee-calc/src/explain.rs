//! Snapshot handed to an external "explain this result" service
//!
//! The snapshot is read-only: it carries the effective inputs (defaults
//! included), the computed outputs and the overall classification. Only a
//! successful [`Report`] can produce one, so nothing can be explained before
//! it has been evaluated.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::CalculatorKind;
use crate::error::{CalcError, Result};
use crate::params::{ParamDefault, ParameterSet};
use crate::report::Report;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExplainRequest(Map<String, Value>);

impl ExplainRequest {
    /// Build `{moduleType, ...inputs, ...outputs, classification}`.
    ///
    /// Outputs override inputs on a key collision.
    pub fn new(kind: CalculatorKind, inputs: &ParameterSet, report: &Report) -> Result<Self> {
        if report.calculator != kind {
            return Err(CalcError::invalid_input(format!(
                "report was produced by '{}', not '{}'",
                report.calculator, kind
            )));
        }

        let mut map = Map::new();
        map.insert("moduleType".to_string(), Value::from(kind.as_str()));

        for spec in kind.parameters() {
            let value = match inputs.get(spec.name) {
                Some(v) => serde_json::to_value(v)?,
                None => match spec.default {
                    ParamDefault::Number(n) => Value::from(n),
                    ParamDefault::Flag(b) => Value::from(b),
                    ParamDefault::Choice(s) => Value::from(s),
                },
            };
            map.insert(spec.name.to_string(), value);
        }

        for (name, value) in &report.fields {
            map.insert(name.clone(), serde_json::to_value(value)?);
        }
        for assessment in &report.assessments {
            map.insert(
                format!("{}_status", assessment.name),
                Value::from(assessment.status.clone()),
            );
        }
        if !report.flags.is_empty() {
            map.insert("flags".to_string(), serde_json::to_value(&report.flags)?);
        }
        map.insert(
            "classification".to_string(),
            serde_json::to_value(report.classification)?,
        );

        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::engine::CalcEngine;

    #[test]
    fn test_snapshot_contains_inputs_outputs_and_classification() {
        let set = ParameterSet::new().with("ifault", 2000.0);
        let report = CalcEngine::new().evaluate(CalculatorKind::Ct, &set).unwrap();
        let request = ExplainRequest::new(CalculatorKind::Ct, &set, &report).unwrap();

        assert_eq!(request.get("moduleType"), Some(&Value::from("ct")));
        assert_eq!(request.get("ifault"), Some(&Value::from(2000.0)));
        // default filled in for an input that was not supplied
        assert_eq!(request.get("vk"), Some(&Value::from(20.0)));
        assert!(request.get("margin_fault").is_some());
        assert_eq!(request.get("classification"), Some(&Value::from("danger")));
    }

    #[test]
    fn test_undefined_output_is_null() {
        let set = ParameterSet::new().with("fund", 0.0);
        let report = CalcEngine::new()
            .evaluate(CalculatorKind::PowerQuality, &set)
            .unwrap();
        let request = ExplainRequest::new(CalculatorKind::PowerQuality, &set, &report).unwrap();
        assert_eq!(request.get("thd_pct"), Some(&Value::Null));
        assert_eq!(request.get("classification"), Some(&Value::Null));
    }

    #[test]
    fn test_mismatched_report_is_rejected() {
        let set = ParameterSet::new();
        let report = CalcEngine::new()
            .evaluate(CalculatorKind::Divider, &set)
            .unwrap();
        assert!(ExplainRequest::new(CalculatorKind::Ct, &set, &report).is_err());
    }
}
