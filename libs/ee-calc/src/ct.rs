//! CT saturation check
//!
//! Required secondary voltage `Vreq = Isec × (Rb + Rs + Rwire)` is compared
//! against the datasheet knee voltage for both the operating and the fault
//! current. This is a conservative knee-point check, not a magnetising-curve
//! model: DC offset, remanence and frequency are not taken into account.

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::{CalcError, Result};
use crate::numeric::require_finite;
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::{Report, RiskLevel, Status};

/// Fraction of Vk up to which the margin is considered ample
const COMFORT_FRACTION: f64 = 0.6;
/// Fraction of Vk above which saturation is considered likely
const SATURATION_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtParams {
    /// Primary rating (A)
    pub ratio_p: f64,
    /// Secondary rating (A)
    pub ratio_s: f64,
    /// Operating primary current (A)
    pub ip: f64,
    /// Fault primary current (A)
    pub ifault: f64,
    /// Burden resistance (Ω)
    pub rb: f64,
    /// Secondary winding resistance (Ω)
    pub rs: f64,
    /// Cable loop resistance (Ω)
    pub rwire: f64,
    /// Knee voltage (V)
    pub vk: f64,
    /// System frequency (Hz), informational only
    pub freq: f64,
}

impl Default for CtParams {
    fn default() -> Self {
        Self {
            ratio_p: 100.0,
            ratio_s: 5.0,
            ip: 80.0,
            ifault: 1000.0,
            rb: 1.0,
            rs: 0.2,
            rwire: 0.05,
            vk: 20.0,
            freq: 60.0,
        }
    }
}

/// Saturation risk of one current scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationRisk {
    /// `Vreq ≤ 0.6·Vk`
    Ample,
    /// `0.6·Vk < Vreq ≤ 0.8·Vk`
    Reduced,
    /// `Vreq > 0.8·Vk`
    Saturation,
}

impl SaturationRisk {
    pub fn classify(v_required: f64, vk: f64) -> Self {
        if v_required <= COMFORT_FRACTION * vk {
            Self::Ample
        } else if v_required <= SATURATION_FRACTION * vk {
            Self::Reduced
        } else {
            Self::Saturation
        }
    }
}

impl Status for SaturationRisk {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::Ample => RiskLevel::Ok,
            Self::Reduced => RiskLevel::Caution,
            Self::Saturation => RiskLevel::Danger,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Ample => "ample margin to knee voltage",
            Self::Reduced => "reduced margin to knee voltage",
            Self::Saturation => "saturation likely, measurement/protection unreliable",
        }
    }
}

/// Result for a single current scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtScenario {
    /// Secondary current (A)
    pub isec: f64,
    /// Required secondary voltage (V)
    pub v_required: f64,
    /// `0.8·Vk − Vreq` (V), negative when past the saturation threshold
    pub margin: f64,
    pub risk: SaturationRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtOutput {
    /// Total burden impedance (Ω)
    pub z_total: f64,
    pub operating: CtScenario,
    pub fault: CtScenario,
    pub vk: f64,
    pub freq: f64,
}

impl CtOutput {
    /// Worst of the two scenarios
    pub fn worst_risk(&self) -> SaturationRisk {
        self.operating.risk.max(self.fault.risk)
    }
}

pub fn evaluate(params: &CtParams) -> Result<CtOutput> {
    if params.ratio_p <= 0.0 || params.ratio_s <= 0.0 {
        return Err(CalcError::invalid_input(
            "CT ratio ratings must be greater than zero",
        ));
    }
    if params.vk <= 0.0 {
        return Err(CalcError::invalid_input(
            "knee voltage must be greater than zero",
        ));
    }

    let ratio = require_finite("CT ratio", params.ratio_s / params.ratio_p)?;
    let z_total = require_finite("burden impedance", params.rb + params.rs + params.rwire)?;

    let scenario = |primary: f64| -> Result<CtScenario> {
        let isec = require_finite("secondary current", primary * ratio)?;
        let v_required = require_finite("required secondary voltage", isec * z_total)?;
        Ok(CtScenario {
            isec,
            v_required,
            margin: SATURATION_FRACTION * params.vk - v_required,
            risk: SaturationRisk::classify(v_required, params.vk),
        })
    };

    Ok(CtOutput {
        z_total,
        operating: scenario(params.ip)?,
        fault: scenario(params.ifault)?,
        vk: params.vk,
        freq: params.freq,
    })
}

pub struct CtCalculator;

impl Calculator for CtCalculator {
    const KIND: CalculatorKind = CalculatorKind::Ct;
    type Params = CtParams;
    type Output = CtOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = CtParams::default();
        vec![
            ParameterSpec::number("ratio_p", "A", d.ratio_p, "CT primary rating"),
            ParameterSpec::number("ratio_s", "A", d.ratio_s, "CT secondary rating"),
            ParameterSpec::number("ip", "A", d.ip, "Operating primary current"),
            ParameterSpec::number("ifault", "A", d.ifault, "Fault primary current"),
            ParameterSpec::number("rb", "Ω", d.rb, "Burden resistance"),
            ParameterSpec::number("rs", "Ω", d.rs, "Secondary winding resistance"),
            ParameterSpec::number("rwire", "Ω", d.rwire, "Cable loop resistance"),
            ParameterSpec::number("vk", "V", d.vk, "Knee voltage (datasheet)"),
            ParameterSpec::number("freq", "Hz", d.freq, "System frequency (informational)"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<CtParams> {
        let d = CtParams::default();
        Ok(CtParams {
            ratio_p: set.number("ratio_p", d.ratio_p)?,
            ratio_s: set.number("ratio_s", d.ratio_s)?,
            ip: set.number("ip", d.ip)?,
            ifault: set.number("ifault", d.ifault)?,
            rb: set.number("rb", d.rb)?,
            rs: set.number("rs", d.rs)?,
            rwire: set.number("rwire", d.rwire)?,
            vk: set.number("vk", d.vk)?,
            freq: set.number("freq", d.freq)?,
        })
    }

    fn evaluate(params: &CtParams) -> Result<CtOutput> {
        evaluate(params)
    }

    fn report(out: &CtOutput) -> Report {
        Report::new(Self::KIND)
            .field("z_total", out.z_total)
            .field("isec", out.operating.isec)
            .field("v_required", out.operating.v_required)
            .field("margin", out.operating.margin)
            .field("isec_fault", out.fault.isec)
            .field("v_required_fault", out.fault.v_required)
            .field("margin_fault", out.fault.margin)
            .field("vk", out.vk)
            .field("freq", out.freq)
            .assess("operating", &out.operating.risk)
            .assess("fault", &out.fault.risk)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_operating_point() {
        let params = CtParams {
            ip: 80.0,
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert!(close(out.operating.isec, 4.0));
        assert!(close(out.z_total, 1.25));
        assert!(close(out.operating.v_required, 5.0));
        assert_eq!(out.operating.risk, SaturationRisk::Ample);
        assert!(close(out.operating.margin, 11.0));
    }

    #[test]
    fn test_fault_scenario_saturates() {
        // 1000 A fault -> 50 A secondary -> 62.5 V against 16 V threshold
        let out = evaluate(&CtParams::default()).unwrap();
        assert!(close(out.fault.isec, 50.0));
        assert!(close(out.fault.v_required, 62.5));
        assert_eq!(out.fault.risk, SaturationRisk::Saturation);
        assert!(out.fault.margin < 0.0);
        assert_eq!(out.worst_risk(), SaturationRisk::Saturation);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        assert_eq!(SaturationRisk::classify(12.0, 20.0), SaturationRisk::Ample);
        assert_eq!(SaturationRisk::classify(12.1, 20.0), SaturationRisk::Reduced);
        assert_eq!(SaturationRisk::classify(16.0, 20.0), SaturationRisk::Reduced);
        assert_eq!(
            SaturationRisk::classify(16.1, 20.0),
            SaturationRisk::Saturation
        );
    }

    #[test]
    fn test_invalid_ratio() {
        let params = CtParams {
            ratio_s: 0.0,
            ..Default::default()
        };
        let err = evaluate(&params).unwrap_err();
        assert_eq!(
            err,
            CalcError::invalid_input("CT ratio ratings must be greater than zero")
        );
    }

    #[test]
    fn test_invalid_knee_voltage() {
        let params = CtParams {
            vk: -1.0,
            ..Default::default()
        };
        assert!(matches!(evaluate(&params), Err(CalcError::InvalidInput(_))));
    }

    #[test]
    fn test_report_classification_is_worst_scenario() {
        let out = evaluate(&CtParams::default()).unwrap();
        let report = CtCalculator::report(&out);
        assert_eq!(report.classification, Some(RiskLevel::Danger));
        assert_eq!(
            report.assessment("operating").and_then(|a| a.level),
            Some(RiskLevel::Ok)
        );
    }

    #[test]
    fn test_overflowing_secondary_current_is_rejected() {
        let params = CtParams {
            ratio_p: 1e-10,
            ratio_s: 1e10,
            ip: 1e300,
            ..Default::default()
        };
        assert!(matches!(evaluate(&params), Err(CalcError::InvalidInput(_))));
    }
}
