//! Op-amp closed-loop gain and output limits
//!
//! The ideal output of a non-inverting or inverting stage is checked against
//! three independent physical ceilings: supply rails (with output headroom),
//! closed-loop bandwidth (GBW / f) and full-power bandwidth from the slew
//! rate under a sinusoidal assumption.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::engine::{Calculator, CalculatorKind};
use crate::error::{CalcError, Result};
use crate::numeric::{floor_at, require_finite, LIMIT_EPSILON};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::{Report, RiskLevel, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    NonInverting,
    Inverting,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NonInverting => "non_inverting",
            Self::Inverting => "inverting",
        })
    }
}

impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "non_inverting" | "noninverting" => Ok(Self::NonInverting),
            "inverting" => Ok(Self::Inverting),
            other => Err(format!(
                "unknown topology '{}', expected non_inverting or inverting",
                other
            )),
        }
    }
}

/// Whether physical limits constrain the guaranteed output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// Unconstrained design target: guaranteed output equals the ideal output
    Idle,
    #[default]
    Active,
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Active => "active",
        })
    }
}

impl FromStr for EvalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "active" => Ok(Self::Active),
            other => Err(format!("unknown mode '{}', expected idle or active", other)),
        }
    }
}

/// Named output limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLimit {
    Rail,
    Bandwidth,
    SlewRate,
}

impl OutputLimit {
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Rail => "rail_limit",
            Self::Bandwidth => "bandwidth_limit",
            Self::SlewRate => "slew_rate_limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpampParams {
    pub topology: Topology,
    /// Input resistor (Ω)
    pub rin: f64,
    /// Feedback resistor (Ω)
    pub rf: f64,
    /// Peak input amplitude (V)
    pub vin_peak: f64,
    /// Signal frequency (Hz)
    pub freq: f64,
    /// Positive supply rail (V)
    pub vcc_pos: f64,
    /// Negative supply rail (V), normally below zero
    pub vcc_neg: f64,
    /// Output headroom to the positive rail (V)
    pub headroom_pos: f64,
    /// Output headroom to the negative rail (V)
    pub headroom_neg: f64,
    /// Gain-bandwidth product (Hz)
    pub gbw: f64,
    /// Slew rate (V/µs)
    pub slew_rate: f64,
    pub mode: EvalMode,
}

impl Default for OpampParams {
    fn default() -> Self {
        Self {
            topology: Topology::NonInverting,
            rin: 10_000.0,
            rf: 100_000.0,
            vin_peak: 0.2,
            freq: 1_000.0,
            vcc_pos: 15.0,
            vcc_neg: -15.0,
            headroom_pos: 1.5,
            headroom_neg: 1.5,
            gbw: 1e6,
            slew_rate: 0.5,
            mode: EvalMode::Active,
        }
    }
}

/// Overall status of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Unconstrained,
    Limited,
}

impl Status for OutputStatus {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::Unconstrained => RiskLevel::Ok,
            Self::Limited => RiskLevel::Caution,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Unconstrained => "ideal output achievable",
            Self::Limited => "ideal output exceeds a physical limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpampOutput {
    pub topology: Topology,
    pub mode: EvalMode,
    /// Closed-loop gain (negative for inverting)
    pub gain: f64,
    pub ideal_peak: f64,
    /// Largest symmetric swing the rails allow (V)
    pub rail_limit: f64,
    /// Closed-loop gain available at the signal frequency
    pub max_gain_at_freq: f64,
    pub bandwidth_limited_peak: f64,
    /// Largest undistorted sine peak the slew rate allows (V)
    pub slew_limited_peak: f64,
    pub guaranteed_peak: f64,
    /// Limits exceeded by the ideal output (active mode only)
    pub limits: Vec<OutputLimit>,
}

impl OpampOutput {
    pub fn status(&self) -> OutputStatus {
        if self.limits.is_empty() {
            OutputStatus::Unconstrained
        } else {
            OutputStatus::Limited
        }
    }
}

fn validate(params: &OpampParams) -> Result<()> {
    if params.rin <= 0.0 {
        return Err(CalcError::invalid_input("Rin must be greater than zero"));
    }
    if params.rf < 0.0 {
        return Err(CalcError::invalid_input("Rf must not be negative"));
    }
    if params.freq <= 0.0 {
        return Err(CalcError::invalid_input(
            "signal frequency must be greater than zero",
        ));
    }
    if params.gbw <= 0.0 {
        return Err(CalcError::invalid_input(
            "gain-bandwidth product must be greater than zero",
        ));
    }
    if params.slew_rate <= 0.0 {
        return Err(CalcError::invalid_input(
            "slew rate must be greater than zero",
        ));
    }
    Ok(())
}

pub fn evaluate(params: &OpampParams) -> Result<OpampOutput> {
    validate(params)?;

    let gain = require_finite(
        "closed-loop gain",
        match params.topology {
            Topology::NonInverting => 1.0 + params.rf / params.rin,
            Topology::Inverting => -params.rf / params.rin,
        },
    )?;
    let vin = params.vin_peak.abs();
    let ideal_peak = require_finite("ideal output peak", gain.abs() * vin)?;

    // Symmetric swing around zero: the tighter rail sets both sides
    let rail_limit = floor_at(
        (params.vcc_pos - params.headroom_pos).min(-(params.vcc_neg + params.headroom_neg)),
        0.0,
    );

    let max_gain_at_freq = params.gbw / params.freq;
    let bandwidth_ceiling = vin * max_gain_at_freq;
    let bandwidth_limited_peak = ideal_peak.min(bandwidth_ceiling);

    let slew_v_per_s = params.slew_rate * 1e6;
    let slew_limited_peak = slew_v_per_s / (2.0 * PI * params.freq);

    let (guaranteed_peak, limits) = match params.mode {
        EvalMode::Idle => (ideal_peak, Vec::new()),
        EvalMode::Active => {
            let limits = [
                (OutputLimit::Rail, rail_limit),
                (OutputLimit::Bandwidth, bandwidth_ceiling),
                (OutputLimit::SlewRate, slew_limited_peak),
            ]
            .into_iter()
            .filter(|(_, ceiling)| ideal_peak > ceiling + LIMIT_EPSILON)
            .map(|(limit, _)| limit)
            .collect();
            (
                rail_limit
                    .min(bandwidth_limited_peak)
                    .min(slew_limited_peak),
                limits,
            )
        },
    };

    Ok(OpampOutput {
        topology: params.topology,
        mode: params.mode,
        gain,
        ideal_peak,
        rail_limit,
        max_gain_at_freq,
        bandwidth_limited_peak,
        slew_limited_peak,
        guaranteed_peak,
        limits,
    })
}

pub struct OpampCalculator;

impl Calculator for OpampCalculator {
    const KIND: CalculatorKind = CalculatorKind::Opamp;
    type Params = OpampParams;
    type Output = OpampOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = OpampParams::default();
        vec![
            ParameterSpec::choice("topology", d.topology, "non_inverting | inverting"),
            ParameterSpec::number("rin", "Ω", d.rin, "Input resistor"),
            ParameterSpec::number("rf", "Ω", d.rf, "Feedback resistor"),
            ParameterSpec::number("vin_peak", "V", d.vin_peak, "Peak input amplitude"),
            ParameterSpec::number("freq", "Hz", d.freq, "Signal frequency"),
            ParameterSpec::number("vcc_pos", "V", d.vcc_pos, "Positive supply rail"),
            ParameterSpec::number("vcc_neg", "V", d.vcc_neg, "Negative supply rail"),
            ParameterSpec::number("headroom_pos", "V", d.headroom_pos, "Output headroom to V+"),
            ParameterSpec::number("headroom_neg", "V", d.headroom_neg, "Output headroom to V-"),
            ParameterSpec::number("gbw", "Hz", d.gbw, "Gain-bandwidth product"),
            ParameterSpec::number("slew_rate", "V/µs", d.slew_rate, "Slew rate"),
            ParameterSpec::choice("mode", d.mode, "idle | active"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<OpampParams> {
        let d = OpampParams::default();
        Ok(OpampParams {
            topology: set.choice("topology", d.topology)?,
            rin: set.number("rin", d.rin)?,
            rf: set.number("rf", d.rf)?,
            vin_peak: set.number("vin_peak", d.vin_peak)?,
            freq: set.number("freq", d.freq)?,
            vcc_pos: set.number("vcc_pos", d.vcc_pos)?,
            vcc_neg: set.number("vcc_neg", d.vcc_neg)?,
            headroom_pos: set.number("headroom_pos", d.headroom_pos)?,
            headroom_neg: set.number("headroom_neg", d.headroom_neg)?,
            gbw: set.number("gbw", d.gbw)?,
            slew_rate: set.number("slew_rate", d.slew_rate)?,
            mode: set.choice("mode", d.mode)?,
        })
    }

    fn evaluate(params: &OpampParams) -> Result<OpampOutput> {
        evaluate(params)
    }

    fn report(out: &OpampOutput) -> Report {
        Report::new(Self::KIND)
            .field("topology", out.topology.to_string())
            .field("mode", out.mode.to_string())
            .field("gain", out.gain)
            .field("ideal_peak", out.ideal_peak)
            .field("rail_limit", out.rail_limit)
            .field("max_gain_at_freq", out.max_gain_at_freq)
            .field("bandwidth_limited_peak", out.bandwidth_limited_peak)
            .field("slew_limited_peak", out.slew_limited_peak)
            .field("guaranteed_peak", out.guaranteed_peak)
            .assess("output", &out.status())
            .flags(out.limits.iter().map(OutputLimit::flag))
    }
}
