//! Plain resistive voltage divider: `Vout = Vin × R2 / (R1 + R2)`

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::{CalcError, Result};
use crate::numeric::require_finite;
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::Report;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividerParams {
    pub vin: f64,
    pub r1: f64,
    pub r2: f64,
}

impl Default for DividerParams {
    fn default() -> Self {
        Self {
            vin: 10.0,
            r1: 1_000.0,
            r2: 1_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividerOutput {
    pub ratio: f64,
    pub vout: f64,
}

pub fn evaluate(params: &DividerParams) -> Result<DividerOutput> {
    let total = params.r1 + params.r2;
    if total <= 0.0 {
        return Err(CalcError::invalid_input(
            "R1 + R2 must be greater than zero",
        ));
    }
    let ratio = require_finite("divider ratio", params.r2 / total)?;
    Ok(DividerOutput {
        ratio,
        vout: params.vin * ratio,
    })
}

pub struct DividerCalculator;

impl Calculator for DividerCalculator {
    const KIND: CalculatorKind = CalculatorKind::Divider;
    type Params = DividerParams;
    type Output = DividerOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = DividerParams::default();
        vec![
            ParameterSpec::number("vin", "V", d.vin, "Input voltage"),
            ParameterSpec::number("r1", "Ω", d.r1, "Top resistor"),
            ParameterSpec::number("r2", "Ω", d.r2, "Bottom resistor"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<DividerParams> {
        let d = DividerParams::default();
        Ok(DividerParams {
            vin: set.number("vin", d.vin)?,
            r1: set.number("r1", d.r1)?,
            r2: set.number("r2", d.r2)?,
        })
    }

    fn evaluate(params: &DividerParams) -> Result<DividerOutput> {
        evaluate(params)
    }

    fn report(out: &DividerOutput) -> Report {
        Report::new(Self::KIND)
            .field("ratio", out.ratio)
            .field("vout", out.vout)
    }
}
