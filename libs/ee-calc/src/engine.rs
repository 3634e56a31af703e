//! CalcEngine - dispatch from a calculator name and a parameter set to a report
//!
//! Every calculator implements [`Calculator`]: read typed params from a
//! [`ParameterSet`], evaluate them, and flatten the typed output into a
//! [`Report`]. The engine itself holds no state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{CalcError, Result};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::Report;
use crate::{ct, divider, field, opamp, power, power_quality, protection, scaling};

/// Identifies one calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    Ct,
    Opamp,
    Power,
    PowerQuality,
    Protection,
    Field,
    Scaling,
    Divider,
}

impl CalculatorKind {
    pub const ALL: [CalculatorKind; 8] = [
        Self::Ct,
        Self::Opamp,
        Self::Power,
        Self::PowerQuality,
        Self::Protection,
        Self::Field,
        Self::Scaling,
        Self::Divider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ct => "ct",
            Self::Opamp => "opamp",
            Self::Power => "power",
            Self::PowerQuality => "power_quality",
            Self::Protection => "protection",
            Self::Field => "field",
            Self::Scaling => "scaling",
            Self::Divider => "divider",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ct => "CT saturation check against the knee voltage",
            Self::Opamp => "Op-amp gain with rail, bandwidth and slew-rate output limits",
            Self::Power => "Single/three-phase power, unbalance and energy with THD derating",
            Self::PowerQuality => "THD and harmonic share of total RMS",
            Self::Protection => "Thermal derating, trip margins and inrush I²t budget",
            Self::Field => "Temperature, wiring drop and SNR field corrections",
            Self::Scaling => "Divider + amplifier + ADC worst-case measurement budget",
            Self::Divider => "Plain resistive voltage divider",
        }
    }

    /// Parameter catalogue with units and defaults
    pub fn parameters(&self) -> Vec<ParameterSpec> {
        match self {
            Self::Ct => ct::CtCalculator::parameters(),
            Self::Opamp => opamp::OpampCalculator::parameters(),
            Self::Power => power::PowerCalculator::parameters(),
            Self::PowerQuality => power_quality::ThdCalculator::parameters(),
            Self::Protection => protection::ProtectionCalculator::parameters(),
            Self::Field => field::FieldCalculator::parameters(),
            Self::Scaling => scaling::ScalingCalculator::parameters(),
            Self::Divider => divider::DividerCalculator::parameters(),
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculatorKind {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "ct" => Ok(Self::Ct),
            "opamp" | "op_amp" => Ok(Self::Opamp),
            "power" => Ok(Self::Power),
            "power_quality" | "pq" | "thd" => Ok(Self::PowerQuality),
            "protection" => Ok(Self::Protection),
            "field" => Ok(Self::Field),
            "scaling" => Ok(Self::Scaling),
            "divider" => Ok(Self::Divider),
            _ => Err(CalcError::unknown_calculator(s)),
        }
    }
}

/// A single-shot calculator
pub trait Calculator {
    const KIND: CalculatorKind;
    type Params: Default;
    type Output;

    fn parameters() -> Vec<ParameterSpec>;

    /// Read typed parameters, falling back to defaults for missing names
    fn read(set: &ParameterSet) -> Result<Self::Params>;

    fn evaluate(params: &Self::Params) -> Result<Self::Output>;

    fn report(output: &Self::Output) -> Report;
}

/// Stateless dispatcher over all calculators
#[derive(Debug, Clone, Copy, Default)]
pub struct CalcEngine;

impl CalcEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a calculator against a parameter set
    pub fn evaluate(&self, kind: CalculatorKind, set: &ParameterSet) -> Result<Report> {
        let result = match kind {
            CalculatorKind::Ct => run::<ct::CtCalculator>(set),
            CalculatorKind::Opamp => run::<opamp::OpampCalculator>(set),
            CalculatorKind::Power => run::<power::PowerCalculator>(set),
            CalculatorKind::PowerQuality => run::<power_quality::ThdCalculator>(set),
            CalculatorKind::Protection => run::<protection::ProtectionCalculator>(set),
            CalculatorKind::Field => run::<field::FieldCalculator>(set),
            CalculatorKind::Scaling => run::<scaling::ScalingCalculator>(set),
            CalculatorKind::Divider => run::<divider::DividerCalculator>(set),
        };

        match &result {
            Ok(report) => debug!(
                calculator = %kind,
                classification = ?report.classification,
                flags = report.flags.len(),
                "evaluate"
            ),
            Err(e) => warn!(calculator = %kind, error = %e, "input rejected"),
        }

        result
    }

    /// Evaluate a calculator given by name
    pub fn evaluate_named(&self, name: &str, set: &ParameterSet) -> Result<Report> {
        self.evaluate(name.parse()?, set)
    }
}

fn run<C: Calculator>(set: &ParameterSet) -> Result<Report> {
    let known = C::parameters();
    for (name, _) in set.iter() {
        if !known.iter().any(|spec| spec.name == name) {
            warn!(calculator = %C::KIND, parameter = %name, "unknown parameter ignored");
        }
    }

    let params = C::read(set)?;
    let output = C::evaluate(&params)?;
    Ok(C::report(&output))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in CalculatorKind::ALL {
            assert_eq!(kind.as_str().parse::<CalculatorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(
            "PQ".parse::<CalculatorKind>().unwrap(),
            CalculatorKind::PowerQuality
        );
        assert_eq!(
            "op-amp".parse::<CalculatorKind>().unwrap(),
            CalculatorKind::Opamp
        );
        assert!(matches!(
            "relay".parse::<CalculatorKind>(),
            Err(CalcError::UnknownCalculator(_))
        ));
    }

    #[test]
    fn test_every_calculator_runs_on_defaults() {
        let engine = CalcEngine::new();
        let empty = ParameterSet::new();
        for kind in CalculatorKind::ALL {
            let report = engine.evaluate(kind, &empty).unwrap();
            assert_eq!(report.calculator, kind);
            assert!(!report.fields.is_empty(), "{} produced no fields", kind);
        }
    }

    #[test]
    fn test_every_catalogue_is_non_empty() {
        for kind in CalculatorKind::ALL {
            assert!(!kind.parameters().is_empty());
        }
    }

    #[test]
    fn test_serde_name_matches_display() {
        let json = serde_json::to_string(&CalculatorKind::PowerQuality).unwrap();
        assert_eq!(json, "\"power_quality\"");
    }

    #[traced_test]
    #[test]
    fn test_rejected_input_is_logged() {
        let engine = CalcEngine::new();
        let set = ParameterSet::new().with("vk", 0.0);
        assert!(engine.evaluate(CalculatorKind::Ct, &set).is_err());
        assert!(logs_contain("input rejected"));
    }

    #[traced_test]
    #[test]
    fn test_misspelled_parameter_is_logged() {
        let engine = CalcEngine::new();
        let set = ParameterSet::new().with("ifualt", 2500.0);
        let report = engine.evaluate(CalculatorKind::Ct, &set).unwrap();
        // default fault current is used
        assert_eq!(report.number("isec_fault"), Some(50.0));
        assert!(logs_contain("unknown parameter ignored"));
        assert!(logs_contain("ifualt"));
    }
}
