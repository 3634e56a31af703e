//! Field corrections: resistor temperature coefficient, wiring voltage drop
//! and signal-to-noise ratio

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::Result;
use crate::numeric::{amplitude_db, ppm_temperature_factor, require_finite};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::{Report, RiskLevel, Status};

const DROP_CAUTION_V: f64 = 0.5;
const DROP_LARGE_V: f64 = 2.0;
const SNR_NOISY_DB: f64 = 20.0;
const SNR_CLEAN_DB: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Value at the 25 °C reference
    pub value25: f64,
    /// Actual temperature (°C)
    pub temp: f64,
    /// Temperature coefficient (ppm/°C)
    pub tcr: f64,
    /// Current through the wiring (A)
    pub current: f64,
    /// One-way cable length (m)
    pub length_m: f64,
    /// Resistance per conductor per metre (Ω/m)
    pub r_per_m: f64,
    /// Out-and-back loop (two conductors) instead of a single conductor
    #[serde(rename = "loop")]
    pub loop_wiring: bool,
    pub signal_rms: f64,
    pub noise_rms: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            value25: 100.0,
            temp: 60.0,
            tcr: 200.0,
            current: 10.0,
            length_m: 50.0,
            r_per_m: 0.005,
            loop_wiring: true,
            signal_rms: 1.0,
            noise_rms: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringStatus {
    Normal,
    /// 0.5 V < drop ≤ 2 V
    Caution,
    /// drop > 2 V
    LargeDrop,
}

impl WiringStatus {
    pub fn classify(drop_v: f64) -> Self {
        if drop_v > DROP_LARGE_V {
            Self::LargeDrop
        } else if drop_v > DROP_CAUTION_V {
            Self::Caution
        } else {
            Self::Normal
        }
    }
}

impl Status for WiringStatus {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::Normal => RiskLevel::Ok,
            Self::Caution => RiskLevel::Caution,
            Self::LargeDrop => RiskLevel::Danger,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal range",
            Self::Caution => "voltage drop should be accounted for",
            Self::LargeDrop => "large voltage drop, shorten run or increase conductor size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseStatus {
    Normal,
    /// 20 dB ≤ SNR < 40 dB
    Caution,
    /// SNR < 20 dB
    ExcessiveNoise,
    /// SNR could not be computed from the inputs
    Indeterminate,
}

impl NoiseStatus {
    pub fn classify(snr_db: Option<f64>) -> Self {
        match snr_db {
            None => Self::Indeterminate,
            Some(snr) if snr < SNR_NOISY_DB => Self::ExcessiveNoise,
            Some(snr) if snr < SNR_CLEAN_DB => Self::Caution,
            Some(_) => Self::Normal,
        }
    }
}

impl Status for NoiseStatus {
    fn level(&self) -> Option<RiskLevel> {
        match self {
            Self::Normal => Some(RiskLevel::Ok),
            Self::Caution => Some(RiskLevel::Caution),
            Self::ExcessiveNoise => Some(RiskLevel::Danger),
            Self::Indeterminate => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Caution => "environmental noise may affect readings",
            Self::ExcessiveNoise => "excessive noise, shielding/grounding/filtering needed",
            Self::Indeterminate => "SNR cannot be computed, check inputs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutput {
    pub corrected: f64,
    /// Wiring resistance (Ω)
    pub wire_resistance: f64,
    /// Voltage drop across the wiring (V)
    pub voltage_drop: f64,
    /// SNR (dB), `None` unless both signal and noise are positive
    pub snr_db: Option<f64>,
    pub wiring: WiringStatus,
    pub noise: NoiseStatus,
}

pub fn evaluate(params: &FieldParams) -> Result<FieldOutput> {
    let corrected = require_finite(
        "corrected value",
        params.value25 * ppm_temperature_factor(params.tcr, params.temp),
    )?;

    let conductors = if params.loop_wiring { 2.0 } else { 1.0 };
    let wire_resistance =
        require_finite("wiring resistance", params.length_m * params.r_per_m * conductors)?;
    let voltage_drop = require_finite("voltage drop", params.current * wire_resistance)?;

    let snr_db = amplitude_db(params.signal_rms, params.noise_rms);

    Ok(FieldOutput {
        corrected,
        wire_resistance,
        voltage_drop,
        snr_db,
        wiring: WiringStatus::classify(voltage_drop),
        noise: NoiseStatus::classify(snr_db),
    })
}

pub struct FieldCalculator;

impl Calculator for FieldCalculator {
    const KIND: CalculatorKind = CalculatorKind::Field;
    type Params = FieldParams;
    type Output = FieldOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = FieldParams::default();
        vec![
            ParameterSpec::number("value25", "", d.value25, "Value at 25 °C"),
            ParameterSpec::number("temp", "°C", d.temp, "Actual temperature"),
            ParameterSpec::number("tcr", "ppm/°C", d.tcr, "Temperature coefficient"),
            ParameterSpec::number("current", "A", d.current, "Current through wiring"),
            ParameterSpec::number("length_m", "m", d.length_m, "One-way cable length"),
            ParameterSpec::number("r_per_m", "Ω/m", d.r_per_m, "Resistance per conductor"),
            ParameterSpec::flag("loop", d.loop_wiring, "Two-conductor loop"),
            ParameterSpec::number("signal_rms", "", d.signal_rms, "Signal RMS"),
            ParameterSpec::number("noise_rms", "", d.noise_rms, "Noise RMS"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<FieldParams> {
        let d = FieldParams::default();
        Ok(FieldParams {
            value25: set.number("value25", d.value25)?,
            temp: set.number("temp", d.temp)?,
            tcr: set.number("tcr", d.tcr)?,
            current: set.number("current", d.current)?,
            length_m: set.number("length_m", d.length_m)?,
            r_per_m: set.number("r_per_m", d.r_per_m)?,
            loop_wiring: set.flag("loop", d.loop_wiring)?,
            signal_rms: set.number("signal_rms", d.signal_rms)?,
            noise_rms: set.number("noise_rms", d.noise_rms)?,
        })
    }

    fn evaluate(params: &FieldParams) -> Result<FieldOutput> {
        evaluate(params)
    }

    fn report(out: &FieldOutput) -> Report {
        Report::new(Self::KIND)
            .field("corrected", out.corrected)
            .field("wire_resistance", out.wire_resistance)
            .field("voltage_drop", out.voltage_drop)
            .field("snr_db", out.snr_db)
            .assess("wiring", &out.wiring)
            .assess("noise", &out.noise)
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
    fn test_default_case() {
        let out = evaluate(&FieldParams::default()).unwrap();
        assert!(close(out.corrected, 100.7));
        // 50 m * 0.005 Ω/m * 2 = 0.5 Ω, 10 A -> 5 V
        assert!(close(out.wire_resistance, 0.5));
        assert!(close(out.voltage_drop, 5.0));
        assert_eq!(out.wiring, WiringStatus::LargeDrop);
        assert!(close(out.snr_db.unwrap(), 40.0));
    }

    #[test]
    fn test_quiet_signal_is_normal() {
        let params = FieldParams {
            noise_rms: 0.001,
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert!(close(out.snr_db.unwrap(), 60.0));
        assert_eq!(out.noise, NoiseStatus::Normal);
    }

    #[test]
    fn test_single_conductor_halves_resistance() {
        let params = FieldParams {
            loop_wiring: false,
            current: 1.0,
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert!(close(out.wire_resistance, 0.25));
        assert_eq!(out.wiring, WiringStatus::Normal);
    }

    #[test]
    fn test_wiring_boundaries() {
        assert_eq!(WiringStatus::classify(0.5), WiringStatus::Normal);
        assert_eq!(WiringStatus::classify(0.51), WiringStatus::Caution);
        assert_eq!(WiringStatus::classify(2.0), WiringStatus::Caution);
        assert_eq!(WiringStatus::classify(2.01), WiringStatus::LargeDrop);
    }

    #[test]
    fn test_snr_tiers() {
        assert_eq!(NoiseStatus::classify(Some(19.9)), NoiseStatus::ExcessiveNoise);
        assert_eq!(NoiseStatus::classify(Some(20.0)), NoiseStatus::Caution);
        assert_eq!(NoiseStatus::classify(Some(40.0)), NoiseStatus::Normal);
        assert_eq!(NoiseStatus::classify(None), NoiseStatus::Indeterminate);
    }

    #[test]
    fn test_zero_noise_snr_undefined() {
        let params = FieldParams {
            noise_rms: 0.0,
            current: 0.0,
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert_eq!(out.snr_db, None);
        assert_eq!(out.noise, NoiseStatus::Indeterminate);

        // Indeterminate SNR does not drive the classification
        let report = FieldCalculator::report(&out);
        assert!(report.get("snr_db").unwrap().is_undefined());
        assert_eq!(report.classification, Some(RiskLevel::Ok));
    }

    #[test]
    fn test_read_loop_flag_from_number() {
        let set = ParameterSet::new().with("loop", 0.0);
        let params = FieldCalculator::read(&set).unwrap();
        assert!(!params.loop_wiring);
    }

    #[test]
    fn test_overflowing_wiring_is_rejected() {
        let params = FieldParams {
            length_m: 1e308,
            r_per_m: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            evaluate(&params),
            Err(crate::error::CalcError::InvalidInput(_))
        ));
    }
}
