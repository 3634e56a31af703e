//! Power quality - THD from harmonic RMS magnitudes
//!
//! Magnitudes only. How the harmonic RMS values were obtained (sampling
//! synchronisation, windowing, IEC 61000-4-7 grouping, interharmonics) is up
//! to the measurement side and is not modelled here.

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::Result;
use crate::numeric::{percent_of, root_sum_square};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::Report;

/// Harmonic orders accepted as input
pub const HARMONIC_ORDERS: [u32; 4] = [3, 5, 7, 11];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThdParams {
    /// Fundamental RMS (V or A)
    pub fund: f64,
    /// RMS of the 3rd, 5th, 7th and 11th harmonics, in [`HARMONIC_ORDERS`] order
    pub harmonics: [f64; 4],
}

impl Default for ThdParams {
    fn default() -> Self {
        Self {
            fund: 100.0,
            harmonics: [0.0, 10.0, 5.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarmonicShare {
    pub order: u32,
    /// Share of total RMS (%), `None` when total RMS is zero
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThdOutput {
    /// THD (%), `None` when the fundamental is not positive
    pub thd_pct: Option<f64>,
    /// `sqrt(fund² + Σh²)`
    pub total_rms: f64,
    pub shares: Vec<HarmonicShare>,
}

pub fn evaluate(params: &ThdParams) -> Result<ThdOutput> {
    let harmonic_rms = root_sum_square(&params.harmonics);
    let total_rms = (params.fund * params.fund + harmonic_rms * harmonic_rms).sqrt();

    let shares = HARMONIC_ORDERS
        .iter()
        .zip(params.harmonics)
        .map(|(&order, h)| HarmonicShare {
            order,
            share_pct: percent_of(h, total_rms),
        })
        .collect();

    Ok(ThdOutput {
        thd_pct: percent_of(harmonic_rms, params.fund),
        total_rms,
        shares,
    })
}

pub struct ThdCalculator;

impl Calculator for ThdCalculator {
    const KIND: CalculatorKind = CalculatorKind::PowerQuality;
    type Params = ThdParams;
    type Output = ThdOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = ThdParams::default();
        vec![
            ParameterSpec::number("fund", "RMS", d.fund, "Fundamental RMS"),
            ParameterSpec::number("h3", "RMS", d.harmonics[0], "3rd harmonic RMS"),
            ParameterSpec::number("h5", "RMS", d.harmonics[1], "5th harmonic RMS"),
            ParameterSpec::number("h7", "RMS", d.harmonics[2], "7th harmonic RMS"),
            ParameterSpec::number("h11", "RMS", d.harmonics[3], "11th harmonic RMS"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<ThdParams> {
        let d = ThdParams::default();
        let mut harmonics = d.harmonics;
        for (value, order) in harmonics.iter_mut().zip(HARMONIC_ORDERS) {
            *value = set.number(&format!("h{}", order), *value)?;
        }
        Ok(ThdParams {
            fund: set.number("fund", d.fund)?,
            harmonics,
        })
    }

    fn evaluate(params: &ThdParams) -> Result<ThdOutput> {
        evaluate(params)
    }

    fn report(out: &ThdOutput) -> Report {
        out.shares.iter().fold(
            Report::new(Self::KIND)
                .field("thd_pct", out.thd_pct)
                .field("total_rms", out.total_rms),
            |report, share| report.field(&format!("share_h{}_pct", share.order), share.share_pct),
        )
    }
}
