//! Measurement scaling worst-case budget
//!
//! Chain: resistive divider -> fixed-gain amplifier -> ADC. The nominal path
//! applies each resistor's own temperature coefficient; the worst-case path
//! adds resistor, gain and reference tolerances plus ADC INL/noise and a
//! half-LSB quantisation allowance.
//!
//! Code bounds pair the low signal corner with the high reference corner and
//! vice versa, so the reported code interval is the widest of the two
//! pairings rather than a derived joint worst case.

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::{CalcError, Result};
use crate::numeric::{
    clamp, corners, ppm_temperature_factor, require_finite, safe_div, tolerance_bounds,
};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::{Report, RiskLevel, Status};

/// Quantisation allowance added to INL and noise (LSB)
const QUANTIZATION_LSB: f64 = 0.5;
const MAX_ADC_BITS: f64 = 32.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingParams {
    /// Input voltage (V)
    pub vin: f64,
    /// Top divider resistor (Ω)
    pub r1: f64,
    /// Bottom divider resistor (Ω)
    pub r2: f64,
    pub gain: f64,
    /// Tolerances (%)
    pub r1_tol: f64,
    pub r2_tol: f64,
    pub gain_tol: f64,
    /// Operating temperature (°C)
    pub temp: f64,
    /// Resistor temperature coefficients (ppm/°C)
    pub tcr_r1: f64,
    pub tcr_r2: f64,
    /// ADC reference (V) and its tolerance (%)
    pub vref: f64,
    pub vref_tol: f64,
    pub bits: f64,
    /// Datasheet INL (LSB)
    pub adc_inl_lsb: f64,
    /// Effective noise margin (LSB)
    pub adc_noise_lsb: f64,
}

impl Default for ScalingParams {
    fn default() -> Self {
        Self {
            vin: 220.0,
            r1: 100_000.0,
            r2: 1_000.0,
            gain: 1.0,
            r1_tol: 1.0,
            r2_tol: 1.0,
            gain_tol: 0.5,
            temp: 25.0,
            tcr_r1: 50.0,
            tcr_r2: 50.0,
            vref: 3.3,
            vref_tol: 0.5,
            bits: 12.0,
            adc_inl_lsb: 2.0,
            adc_noise_lsb: 0.5,
        }
    }
}

/// One evaluated divider corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DividerCorner {
    pub r1: f64,
    pub r2: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    WithinRange,
    /// Only the worst-case maximum exceeds the minimum reference
    WorstCaseOverRange,
    /// Nominal amplified voltage already exceeds Vref
    NominalOverRange,
}

impl Status for RangeStatus {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::WithinRange => RiskLevel::Ok,
            Self::WorstCaseOverRange => RiskLevel::Caution,
            Self::NominalOverRange => RiskLevel::Danger,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::WithinRange => "signal within ADC range at all corners",
            Self::WorstCaseOverRange => "worst-case signal can exceed the minimum reference",
            Self::NominalOverRange => "nominal signal exceeds the ADC reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingOutput {
    pub r1_temp: f64,
    pub r2_temp: f64,
    pub v_div_nom: f64,
    pub v_amp_nom: f64,
    pub max_code: i64,
    pub code_nom: i64,
    /// Nominal LSB size (V)
    pub lsb: f64,
    /// INL + noise + quantisation expressed in volts
    pub adc_margin_v: f64,
    pub corners: Vec<DividerCorner>,
    pub divider_min: f64,
    pub divider_max: f64,
    pub vref_min: f64,
    pub vref_max: f64,
    pub v_amp_min: f64,
    pub v_amp_max: f64,
    pub code_min: i64,
    pub code_max: i64,
    /// Relative error of the worst-case bounds against nominal (%)
    pub err_minus_pct: Option<f64>,
    pub err_plus_pct: Option<f64>,
    pub over_vref_nominal: bool,
    pub over_vref_worst: bool,
}

impl ScalingOutput {
    pub fn status(&self) -> RangeStatus {
        if self.over_vref_nominal {
            RangeStatus::NominalOverRange
        } else if self.over_vref_worst {
            RangeStatus::WorstCaseOverRange
        } else {
            RangeStatus::WithinRange
        }
    }
}

fn validate(params: &ScalingParams) -> Result<()> {
    if params.bits.fract() != 0.0 || params.bits < 1.0 || params.bits > MAX_ADC_BITS {
        return Err(CalcError::invalid_input(format!(
            "ADC resolution must be a whole number of bits between 1 and {}",
            MAX_ADC_BITS
        )));
    }
    if params.vref <= 0.0 {
        return Err(CalcError::invalid_input(
            "reference voltage must be greater than zero",
        ));
    }
    if params.vref_tol >= 100.0 {
        return Err(CalcError::invalid_input(
            "reference tolerance must be below 100 %",
        ));
    }
    Ok(())
}

fn divider_ratio(r1: f64, r2: f64) -> Result<f64> {
    let total = r1 + r2;
    if total <= 0.0 {
        return Err(CalcError::invalid_input(
            "divider resistance R1 + R2 must be greater than zero",
        ));
    }
    safe_div(r2, total)
        .ok_or_else(|| CalcError::invalid_input("divider ratio is not a finite number"))
}

/// Convert a voltage to ADC code space: `v / vref × maxCode`
fn to_code_space(v: f64, vref: f64, max_code: f64) -> f64 {
    v / vref * max_code
}

pub fn evaluate(params: &ScalingParams) -> Result<ScalingOutput> {
    validate(params)?;

    let r1_temp = params.r1 * ppm_temperature_factor(params.tcr_r1, params.temp);
    let r2_temp = params.r2 * ppm_temperature_factor(params.tcr_r2, params.temp);
    let v_div_nom = params.vin * divider_ratio(r1_temp, r2_temp)?;
    let v_amp_nom = require_finite("nominal amplified voltage", v_div_nom * params.gain)?;

    let max_code_f = 2f64.powf(params.bits) - 1.0;
    let max_code = max_code_f as i64;
    let code_nom_f = to_code_space(v_amp_nom, params.vref, max_code_f).round();
    // Unclamped, so it must still fit an i64 without saturating
    if !code_nom_f.is_finite() || code_nom_f.abs() >= i64::MAX as f64 {
        return Err(CalcError::invalid_input(format!(
            "nominal ADC code {} is out of range",
            code_nom_f
        )));
    }
    let code_nom = code_nom_f as i64;

    let r1_bounds = tolerance_bounds(r1_temp, params.r1_tol);
    let r2_bounds = tolerance_bounds(r2_temp, params.r2_tol);
    let corners = corners([r1_bounds, r2_bounds])
        .map(|[r1, r2]| {
            Ok(DividerCorner {
                r1,
                r2,
                ratio: divider_ratio(r1, r2)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let divider_min = corners
        .iter()
        .map(|c| c.ratio)
        .fold(f64::INFINITY, f64::min);
    let divider_max = corners
        .iter()
        .map(|c| c.ratio)
        .fold(f64::NEG_INFINITY, f64::max);

    let (gain_min, gain_max) = tolerance_bounds(params.gain, params.gain_tol);
    let (vref_min, vref_max) = tolerance_bounds(params.vref, params.vref_tol);
    let v_amp_min = require_finite(
        "minimum amplified voltage",
        params.vin * divider_min * gain_min,
    )?;
    let v_amp_max = require_finite(
        "maximum amplified voltage",
        params.vin * divider_max * gain_max,
    )?;

    let lsb = params.vref / max_code_f;
    let adc_margin_v =
        (params.adc_inl_lsb.abs() + params.adc_noise_lsb.abs() + QUANTIZATION_LSB) * lsb;

    let code_min = clamp(
        to_code_space(v_amp_min - adc_margin_v, vref_max, max_code_f).floor(),
        0.0,
        max_code_f,
    ) as i64;
    let code_max = clamp(
        to_code_space(v_amp_max + adc_margin_v, vref_min, max_code_f).ceil(),
        0.0,
        max_code_f,
    ) as i64;

    let relative_pct = |bound: f64| safe_div(bound - v_amp_nom, v_amp_nom).map(|r| r * 100.0);

    Ok(ScalingOutput {
        r1_temp,
        r2_temp,
        v_div_nom,
        v_amp_nom,
        max_code,
        code_nom,
        lsb,
        adc_margin_v,
        corners,
        divider_min,
        divider_max,
        vref_min,
        vref_max,
        v_amp_min,
        v_amp_max,
        code_min,
        code_max,
        err_minus_pct: relative_pct(v_amp_min),
        err_plus_pct: relative_pct(v_amp_max),
        over_vref_nominal: v_amp_nom > params.vref,
        over_vref_worst: v_amp_max > vref_min,
    })
}

pub struct ScalingCalculator;

impl Calculator for ScalingCalculator {
    const KIND: CalculatorKind = CalculatorKind::Scaling;
    type Params = ScalingParams;
    type Output = ScalingOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = ScalingParams::default();
        vec![
            ParameterSpec::number("vin", "V", d.vin, "Input voltage"),
            ParameterSpec::number("r1", "Ω", d.r1, "Divider top resistor"),
            ParameterSpec::number("r2", "Ω", d.r2, "Divider bottom resistor"),
            ParameterSpec::number("gain", "V/V", d.gain, "Amplifier gain"),
            ParameterSpec::number("r1_tol", "%", d.r1_tol, "R1 tolerance"),
            ParameterSpec::number("r2_tol", "%", d.r2_tol, "R2 tolerance"),
            ParameterSpec::number("gain_tol", "%", d.gain_tol, "Gain tolerance"),
            ParameterSpec::number("temp", "°C", d.temp, "Operating temperature"),
            ParameterSpec::number("tcr_r1", "ppm/°C", d.tcr_r1, "R1 temperature coefficient"),
            ParameterSpec::number("tcr_r2", "ppm/°C", d.tcr_r2, "R2 temperature coefficient"),
            ParameterSpec::number("vref", "V", d.vref, "ADC reference"),
            ParameterSpec::number("vref_tol", "%", d.vref_tol, "Reference tolerance"),
            ParameterSpec::number("bits", "bit", d.bits, "ADC resolution"),
            ParameterSpec::number("adc_inl_lsb", "LSB", d.adc_inl_lsb, "ADC INL (worst)"),
            ParameterSpec::number("adc_noise_lsb", "LSB", d.adc_noise_lsb, "ADC noise margin"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<ScalingParams> {
        let d = ScalingParams::default();
        Ok(ScalingParams {
            vin: set.number("vin", d.vin)?,
            r1: set.number("r1", d.r1)?,
            r2: set.number("r2", d.r2)?,
            gain: set.number("gain", d.gain)?,
            r1_tol: set.number("r1_tol", d.r1_tol)?,
            r2_tol: set.number("r2_tol", d.r2_tol)?,
            gain_tol: set.number("gain_tol", d.gain_tol)?,
            temp: set.number("temp", d.temp)?,
            tcr_r1: set.number("tcr_r1", d.tcr_r1)?,
            tcr_r2: set.number("tcr_r2", d.tcr_r2)?,
            vref: set.number("vref", d.vref)?,
            vref_tol: set.number("vref_tol", d.vref_tol)?,
            bits: set.number("bits", d.bits)?,
            adc_inl_lsb: set.number("adc_inl_lsb", d.adc_inl_lsb)?,
            adc_noise_lsb: set.number("adc_noise_lsb", d.adc_noise_lsb)?,
        })
    }

    fn evaluate(params: &ScalingParams) -> Result<ScalingOutput> {
        evaluate(params)
    }

    fn report(out: &ScalingOutput) -> Report {
        Report::new(Self::KIND)
            .field("r1_temp", out.r1_temp)
            .field("r2_temp", out.r2_temp)
            .field("v_div_nom", out.v_div_nom)
            .field("v_amp_nom", out.v_amp_nom)
            .field("max_code", out.max_code)
            .field("code_nom", out.code_nom)
            .field("lsb", out.lsb)
            .field("adc_margin_v", out.adc_margin_v)
            .field("divider_min", out.divider_min)
            .field("divider_max", out.divider_max)
            .field("vref_min", out.vref_min)
            .field("vref_max", out.vref_max)
            .field("v_amp_min", out.v_amp_min)
            .field("v_amp_max", out.v_amp_max)
            .field("code_min", out.code_min)
            .field("code_max", out.code_max)
            .field("err_minus_pct", out.err_minus_pct)
            .field("err_plus_pct", out.err_plus_pct)
            .field("over_vref_nominal", out.over_vref_nominal)
            .field("over_vref_worst", out.over_vref_worst)
            .assess("range", &out.status())
    }
}
