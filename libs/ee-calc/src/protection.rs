//! Protection margins: linear thermal derating, trip setting checks and an
//! inrush I²t budget
//!
//! Inverse-time relay curves are out of scope; the checks here are the
//! first-pass sanity tests done before a coordination study.

use serde::{Deserialize, Serialize};

use crate::engine::{Calculator, CalculatorKind};
use crate::error::Result;
use crate::numeric::{floor_at, percent_of, require_finite, REFERENCE_TEMP_C};
use crate::params::{ParameterSet, ParameterSpec};
use crate::report::{Report, RiskLevel, Status};

/// Remaining I²t below this fraction of the limit is treated as insufficient
const I2T_RESERVE_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionParams {
    /// Rated current at 25 °C (A)
    pub rated25: f64,
    /// Ambient temperature (°C)
    pub ambient: f64,
    /// Linear derating coefficient (1/°C)
    pub k_temp: f64,
    /// Load current (A)
    pub load: f64,
    /// Trip setpoint (A)
    pub trip: f64,
    /// Inrush/start current (A)
    pub i_start: f64,
    /// Inrush duration (s)
    pub t_start: f64,
    /// Thermal withstand (A²·s)
    pub i2t_limit: f64,
}

impl Default for ProtectionParams {
    fn default() -> Self {
        Self {
            rated25: 100.0,
            ambient: 40.0,
            k_temp: 0.004,
            load: 80.0,
            trip: 120.0,
            i_start: 400.0,
            t_start: 0.2,
            i2t_limit: 50_000.0,
        }
    }
}

/// Trip-setting status, checked in declaration order; the first match wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// `load > trip`
    ImmediateTripRisk,
    /// `trip < derated rating`
    TripBelowDeratedRating,
    /// `load > derated rating`
    OverloadVsDerated,
    Nominal,
}

impl TripStatus {
    pub fn classify(load: f64, trip: f64, rated_t: f64) -> Self {
        if load > trip {
            Self::ImmediateTripRisk
        } else if trip < rated_t {
            Self::TripBelowDeratedRating
        } else if load > rated_t {
            Self::OverloadVsDerated
        } else {
            Self::Nominal
        }
    }
}

impl Status for TripStatus {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::ImmediateTripRisk | Self::OverloadVsDerated => RiskLevel::Danger,
            Self::TripBelowDeratedRating => RiskLevel::Caution,
            Self::Nominal => RiskLevel::Ok,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::ImmediateTripRisk => "load above trip setting, immediate trip risk",
            Self::TripBelowDeratedRating => "trip setting below derated rating, misoperation risk",
            Self::OverloadVsDerated => "load above temperature-derated rating",
            Self::Nominal => "nominal (review curves and start pattern separately)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InrushStatus {
    /// Inrush alone exceeds the I²t limit
    LimitExceeded,
    /// Less than 20 % of the limit left after inrush
    InsufficientMargin,
    Acceptable,
}

impl InrushStatus {
    pub fn classify(used: f64, limit: f64) -> Self {
        if used > limit {
            Self::LimitExceeded
        } else if limit - used < I2T_RESERVE_FRACTION * limit {
            Self::InsufficientMargin
        } else {
            Self::Acceptable
        }
    }
}

impl Status for InrushStatus {
    fn level(&self) -> Option<RiskLevel> {
        Some(match self {
            Self::LimitExceeded => RiskLevel::Danger,
            Self::InsufficientMargin => RiskLevel::Caution,
            Self::Acceptable => RiskLevel::Ok,
        })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::LimitExceeded => "I²t limit exceeded by inrush alone",
            Self::InsufficientMargin => "insufficient I²t margin, cumulative heating risk",
            Self::Acceptable => "inrush within I²t budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectionOutput {
    /// Derated rating at ambient, clamped at zero (A)
    pub rated_t: f64,
    /// `(trip − load)/load` (%), `None` when load ≤ 0
    pub trip_margin_pct: Option<f64>,
    /// `(ratedT − load)/ratedT` (%), `None` when ratedT ≤ 0
    pub rated_margin_pct: Option<f64>,
    pub i2t_used: f64,
    pub i2t_remaining: f64,
    pub status: TripStatus,
    pub inrush: InrushStatus,
}

pub fn evaluate(params: &ProtectionParams) -> Result<ProtectionOutput> {
    let rated_t = require_finite(
        "derated rating",
        floor_at(
            params.rated25 * (1.0 - params.k_temp * (params.ambient - REFERENCE_TEMP_C)),
            0.0,
        ),
    )?;

    let i2t_used = require_finite("inrush I²t", params.i_start * params.i_start * params.t_start)?;
    let i2t_remaining = require_finite("remaining I²t", params.i2t_limit - i2t_used)?;

    Ok(ProtectionOutput {
        rated_t,
        trip_margin_pct: percent_of(params.trip - params.load, params.load),
        rated_margin_pct: percent_of(rated_t - params.load, rated_t),
        i2t_used,
        i2t_remaining,
        status: TripStatus::classify(params.load, params.trip, rated_t),
        inrush: InrushStatus::classify(i2t_used, params.i2t_limit),
    })
}

pub struct ProtectionCalculator;

impl Calculator for ProtectionCalculator {
    const KIND: CalculatorKind = CalculatorKind::Protection;
    type Params = ProtectionParams;
    type Output = ProtectionOutput;

    fn parameters() -> Vec<ParameterSpec> {
        let d = ProtectionParams::default();
        vec![
            ParameterSpec::number("rated25", "A", d.rated25, "Rated current at 25 °C"),
            ParameterSpec::number("ambient", "°C", d.ambient, "Ambient temperature"),
            ParameterSpec::number("k_temp", "1/°C", d.k_temp, "Linear derating coefficient"),
            ParameterSpec::number("load", "A", d.load, "Load current"),
            ParameterSpec::number("trip", "A", d.trip, "Trip setpoint"),
            ParameterSpec::number("i_start", "A", d.i_start, "Inrush current"),
            ParameterSpec::number("t_start", "s", d.t_start, "Inrush duration"),
            ParameterSpec::number("i2t_limit", "A²s", d.i2t_limit, "Thermal I²t limit"),
        ]
    }

    fn read(set: &ParameterSet) -> Result<ProtectionParams> {
        let d = ProtectionParams::default();
        Ok(ProtectionParams {
            rated25: set.number("rated25", d.rated25)?,
            ambient: set.number("ambient", d.ambient)?,
            k_temp: set.number("k_temp", d.k_temp)?,
            load: set.number("load", d.load)?,
            trip: set.number("trip", d.trip)?,
            i_start: set.number("i_start", d.i_start)?,
            t_start: set.number("t_start", d.t_start)?,
            i2t_limit: set.number("i2t_limit", d.i2t_limit)?,
        })
    }

    fn evaluate(params: &ProtectionParams) -> Result<ProtectionOutput> {
        evaluate(params)
    }

    fn report(out: &ProtectionOutput) -> Report {
        Report::new(Self::KIND)
            .field("rated_t", out.rated_t)
            .field("trip_margin_pct", out.trip_margin_pct)
            .field("rated_margin_pct", out.rated_margin_pct)
            .field("i2t_used", out.i2t_used)
            .field("i2t_remaining", out.i2t_remaining)
            .assess("status", &out.status)
            .assess("inrush", &out.inrush)
    }
}
