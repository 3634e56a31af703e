//! Power & energy
//!
//! Single-phase or per-phase three-phase S/P/Q, phase unbalance, and a
//! simplified harmonic derating of real power for the energy estimate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{Calculator, CalculatorKind};
use crate::error::Result;
use crate::numeric::{floor_at, percent_of, quadrature_remainder, require_finite};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::Report;

/// Sensitivity of the harmonic penalty to `(THD/100)²`
pub const HARMONIC_PENALTY_K: f64 = 0.03;
/// Real power is never derated below this fraction of its fundamental value
pub const HARMONIC_PENALTY_FLOOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseMode {
    Single,
    #[default]
    Three,
}

impl fmt::Display for PhaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Three => "three",
        })
    }
}

impl FromStr for PhaseMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(Self::Single),
            "three" | "3" => Ok(Self::Three),
            other => Err(format!(
                "unknown phase mode '{}', expected single or three",
                other
            )),
        }
    }
}

/// Voltage, current and power factor of one phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseInput {
    pub v: f64,
    pub i: f64,
    pub pf: f64,
}

impl Default for PhaseInput {
    fn default() -> Self {
        Self {
            v: 220.0,
            i: 10.0,
            pf: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhasePower {
    /// Apparent power (VA)
    pub s: f64,
    /// Real power (W)
    pub p: f64,
    /// Reactive power (var)
    pub q: f64,
}

impl PhasePower {
    pub fn from_input(phase: &PhaseInput) -> Self {
        let s = phase.v * phase.i;
        let p = s * phase.pf;
        Self {
            s,
            p,
            q: quadrature_remainder(s, p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerParams {
    pub mode: PhaseMode,
    /// Used in single-phase mode
    pub single: PhaseInput,
    /// Phases A/B/C, used in three-phase mode
    pub phases: [PhaseInput; 3],
    /// Voltage THD (%)
    pub thd_v: f64,
    /// Current THD (%)
    pub thd_i: f64,
    /// Operating hours for the energy estimate
    pub hours: f64,
}

impl Default for PowerParams {
    fn default() -> Self {
        Self {
            mode: PhaseMode::Three,
            single: PhaseInput::default(),
            phases: [PhaseInput::default(); 3],
            thd_v: 0.0,
            thd_i: 0.0,
            hours: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerOutput {
    pub mode: PhaseMode,
    /// Per-phase results (one entry in single-phase mode)
    pub phases: Vec<PhasePower>,
    pub s: f64,
    pub p: f64,
    pub q: f64,
    pub penalty: f64,
    pub p_adjusted: f64,
    /// Energy over `hours` (kWh)
    pub energy_kwh: f64,
    /// Voltage unbalance (%), `None` in single-phase mode or at zero average
    pub voltage_unbalance: Option<f64>,
    /// Current unbalance (%), `None` in single-phase mode or at zero average
    pub current_unbalance: Option<f64>,
    pub harmonic_derating_applied: bool,
}

/// `1 − k·((THDv/100)² + (THDi/100)²)`, floored at 0.8
pub fn harmonic_penalty(thd_v_pct: f64, thd_i_pct: f64) -> f64 {
    let v = thd_v_pct / 100.0;
    let i = thd_i_pct / 100.0;
    floor_at(
        1.0 - HARMONIC_PENALTY_K * (v * v + i * i),
        HARMONIC_PENALTY_FLOOR,
    )
}

/// Maximum deviation from the average as a percentage of the average
pub fn unbalance_pct(values: [f64; 3]) -> Option<f64> {
    let avg = values.iter().sum::<f64>() / 3.0;
    let max_dev = values
        .iter()
        .map(|x| (x - avg).abs())
        .fold(0.0_f64, f64::max);
    percent_of(max_dev, avg)
}

pub fn evaluate(params: &PowerParams) -> Result<PowerOutput> {
    let phases: Vec<PhasePower> = match params.mode {
        PhaseMode::Single => vec![PhasePower::from_input(&params.single)],
        PhaseMode::Three => params.phases.iter().map(PhasePower::from_input).collect(),
    };

    let s = require_finite("apparent power", phases.iter().map(|ph| ph.s).sum())?;
    let p = require_finite("real power", phases.iter().map(|ph| ph.p).sum())?;
    let q = require_finite("reactive power", phases.iter().map(|ph| ph.q).sum())?;

    let penalty = harmonic_penalty(params.thd_v, params.thd_i);
    let p_adjusted = p * penalty;
    let energy_kwh = require_finite("energy", p_adjusted * params.hours / 1000.0)?;

    let (voltage_unbalance, current_unbalance) = match params.mode {
        PhaseMode::Single => (None, None),
        PhaseMode::Three => {
            let [a, b, c] = params.phases;
            (
                unbalance_pct([a.v, b.v, c.v]),
                unbalance_pct([a.i, b.i, c.i]),
            )
        },
    };

    Ok(PowerOutput {
        mode: params.mode,
        phases,
        s,
        p,
        q,
        penalty,
        p_adjusted,
        energy_kwh,
        voltage_unbalance,
        current_unbalance,
        harmonic_derating_applied: params.thd_v > 0.0 || params.thd_i > 0.0,
    })
}

pub struct PowerCalculator;

const PHASE_NAMES: [&str; 3] = ["a", "b", "c"];

impl Calculator for PowerCalculator {
    const KIND: CalculatorKind = CalculatorKind::Power;
    type Params = PowerParams;
    type Output = PowerOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = PowerParams::default();
        let [a, b, c] = d.phases;
        vec![
            ParameterSpec::choice("mode", d.mode, "single | three"),
            ParameterSpec::number("v", "V", d.single.v, "Single-phase voltage"),
            ParameterSpec::number("i", "A", d.single.i, "Single-phase current"),
            ParameterSpec::number("pf", "", d.single.pf, "Single-phase power factor"),
            ParameterSpec::number("va", "V", a.v, "Phase A voltage"),
            ParameterSpec::number("vb", "V", b.v, "Phase B voltage"),
            ParameterSpec::number("vc", "V", c.v, "Phase C voltage"),
            ParameterSpec::number("ia", "A", a.i, "Phase A current"),
            ParameterSpec::number("ib", "A", b.i, "Phase B current"),
            ParameterSpec::number("ic", "A", c.i, "Phase C current"),
            ParameterSpec::number("pfa", "", a.pf, "Phase A power factor"),
            ParameterSpec::number("pfb", "", b.pf, "Phase B power factor"),
            ParameterSpec::number("pfc", "", c.pf, "Phase C power factor"),
            ParameterSpec::number("thd_v", "%", d.thd_v, "Voltage THD"),
            ParameterSpec::number("thd_i", "%", d.thd_i, "Current THD"),
            ParameterSpec::number("hours", "h", d.hours, "Operating hours for energy"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<PowerParams> {
        let d = PowerParams::default();
        let mut phases = d.phases;
        for (phase, name) in phases.iter_mut().zip(PHASE_NAMES) {
            phase.v = set.number(&format!("v{}", name), phase.v)?;
            phase.i = set.number(&format!("i{}", name), phase.i)?;
            phase.pf = set.number(&format!("pf{}", name), phase.pf)?;
        }
        Ok(PowerParams {
            mode: set.choice("mode", d.mode)?,
            single: PhaseInput {
                v: set.number("v", d.single.v)?,
                i: set.number("i", d.single.i)?,
                pf: set.number("pf", d.single.pf)?,
            },
            phases,
            thd_v: set.number("thd_v", d.thd_v)?,
            thd_i: set.number("thd_i", d.thd_i)?,
            hours: set.number("hours", d.hours)?,
        })
    }

    fn evaluate(params: &PowerParams) -> Result<PowerOutput> {
        evaluate(params)
    }

    fn report(out: &PowerOutput) -> Report {
        let mut report = Report::new(Self::KIND)
            .field("mode", out.mode.to_string())
            .field("s", out.s)
            .field("p", out.p)
            .field("q", out.q)
            .field("penalty", out.penalty)
            .field("p_adjusted", out.p_adjusted)
            .field("energy_kwh", out.energy_kwh)
            .field("voltage_unbalance_pct", out.voltage_unbalance)
            .field("current_unbalance_pct", out.current_unbalance);

        if out.mode == PhaseMode::Three {
            for (phase, name) in out.phases.iter().zip(PHASE_NAMES) {
                report = report
                    .field(&format!("s_{}", name), phase.s)
                    .field(&format!("p_{}", name), phase.p)
                    .field(&format!("q_{}", name), phase.q);
            }
        }

        report.note(match (out.harmonic_derating_applied, out.mode) {
            (true, _) => "real power conservatively derated for the given THD",
            (false, PhaseMode::Single) => "sinusoidal single-phase calculation",
            (false, PhaseMode::Three) => "sinusoidal per-phase sum",
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn single(v: f64, i: f64, pf: f64) -> PowerParams {
        PowerParams {
            mode: PhaseMode::Single,
            single: PhaseInput { v, i, pf },
            ..Default::default()
        }
    }

    #[test]
    fn test_single_phase_reference() {
        let out = evaluate(&single(220.0, 10.0, 0.9)).unwrap();
        assert!(close(out.s, 2200.0, 1e-9));
        assert!(close(out.p, 1980.0, 1e-9));
        assert!(close(out.q, 958.96, 1e-2));
        assert_eq!(out.voltage_unbalance, None);
        assert_eq!(out.current_unbalance, None);
        // No THD: no derating, 24 h
        assert_eq!(out.penalty, 1.0);
        assert!(close(out.energy_kwh, 47.52, 1e-9));
    }

    #[test]
    fn test_three_phase_sums_phases() {
        let params = PowerParams {
            phases: [
                PhaseInput {
                    v: 230.0,
                    i: 10.0,
                    pf: 1.0,
                },
                PhaseInput {
                    v: 220.0,
                    i: 12.0,
                    pf: 0.8,
                },
                PhaseInput {
                    v: 210.0,
                    i: 8.0,
                    pf: 0.9,
                },
            ],
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert_eq!(out.phases.len(), 3);
        assert!(close(out.s, 2300.0 + 2640.0 + 1680.0, 1e-9));
        assert!(close(out.p, 2300.0 + 2112.0 + 1512.0, 1e-9));
        // Voltage avg 220, max dev 10 -> 4.545 %
        assert!(close(out.voltage_unbalance.unwrap(), 100.0 / 22.0, 1e-9));
        // Current avg 10, max dev 2 -> 20 %
        assert!(close(out.current_unbalance.unwrap(), 20.0, 1e-9));
    }

    #[test]
    fn test_balanced_three_phase_has_zero_unbalance() {
        let out = evaluate(&PowerParams::default()).unwrap();
        assert_eq!(out.voltage_unbalance, Some(0.0));
        assert_eq!(out.current_unbalance, Some(0.0));
    }

    #[test]
    fn test_zero_average_unbalance_is_undefined() {
        let params = PowerParams {
            phases: [PhaseInput {
                v: 220.0,
                i: 0.0,
                pf: 0.9,
            }; 3],
            ..Default::default()
        };
        let out = evaluate(&params).unwrap();
        assert_eq!(out.current_unbalance, None);
        assert_eq!(out.voltage_unbalance, Some(0.0));

        let report = PowerCalculator::report(&out);
        assert!(report.get("current_unbalance_pct").unwrap().is_undefined());
    }

    #[test]
    fn test_harmonic_penalty() {
        assert_eq!(harmonic_penalty(0.0, 0.0), 1.0);
        // 1 - 0.03 * (0.01 + 0.09) = 0.997
        assert!(close(harmonic_penalty(10.0, 30.0), 0.997, 1e-12));
        // Extreme THD hits the floor
        assert_eq!(harmonic_penalty(300.0, 300.0), HARMONIC_PENALTY_FLOOR);
    }

    #[test]
    fn test_energy_uses_adjusted_power() {
        let params = PowerParams {
            thd_v: 10.0,
            thd_i: 30.0,
            hours: 10.0,
            ..single(220.0, 10.0, 0.9)
        };
        let out = evaluate(&params).unwrap();
        assert!(close(out.p_adjusted, 1980.0 * 0.997, 1e-9));
        assert!(close(out.energy_kwh, 1980.0 * 0.997 * 10.0 / 1000.0, 1e-9));
        assert!(out.harmonic_derating_applied);
    }

    #[test]
    fn test_read_phase_parameters() {
        let set = ParameterSet::new()
            .with("mode", "three")
            .with("vb", 200.0)
            .with("ic", 5.0);
        let params = PowerCalculator::read(&set).unwrap();
        assert_eq!(params.phases[1].v, 200.0);
        assert_eq!(params.phases[2].i, 5.0);
        assert_eq!(params.phases[0], PhaseInput::default());
    }

    #[test]
    fn test_overflowing_power_is_rejected() {
        let params = PowerParams {
            mode: PhaseMode::Single,
            single: PhaseInput {
                v: 1e300,
                i: 1e300,
                pf: 0.9,
            },
            ..Default::default()
        };
        assert!(matches!(
            evaluate(&params),
            Err(crate::error::CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_numeric_phase_mode() {
        let set = ParameterSet::new().with("mode", 1.0);
        assert_eq!(PowerCalculator::read(&set).unwrap().mode, PhaseMode::Single);
        let set = ParameterSet::new().with("mode", 3.0);
        assert_eq!(PowerCalculator::read(&set).unwrap().mode, PhaseMode::Three);
    }
}
