//! ee-calc - Engineering calculators for electrical measurement and protection
//!
//! Each calculator is a pure function from a [`ParameterSet`] to a [`Report`]:
//! no I/O, no shared state, identical inputs give identical reports.
//!
//! # Calculators
//!
//! | Name | Purpose |
//! |------|---------|
//! | `ct` | CT secondary voltage vs knee voltage, operating and fault |
//! | `opamp` | Gain, rail / bandwidth / slew-rate output limits |
//! | `power` | Single or three-phase P/Q/S, unbalance, energy with THD derating |
//! | `power_quality` | THD and harmonic share of total RMS |
//! | `protection` | Thermal derating, trip margins, inrush I²t |
//! | `field` | Temperature, wiring drop and SNR corrections |
//! | `scaling` | Divider + amplifier + ADC worst-case budget |
//! | `divider` | Plain resistive divider |
//!
//! # Example
//!
//! ```rust
//! use ee_calc::{CalcEngine, CalculatorKind, ParameterSet, RiskLevel};
//!
//! let engine = CalcEngine::new();
//! let params = ParameterSet::new().with("ifault", 2000.0);
//! let report = engine.evaluate(CalculatorKind::Ct, &params).unwrap();
//!
//! assert_eq!(report.classification, Some(RiskLevel::Danger));
//! assert_eq!(report.number("isec_fault"), Some(100.0));
//! ```

pub mod ct;
pub mod divider;
pub mod engine;
pub mod error;
pub mod explain;
pub mod field;
pub mod numeric;
pub mod opamp;
pub mod params;
pub mod power;
pub mod power_quality;
pub mod protection;
pub mod report;
pub mod scaling;

pub use engine::{CalcEngine, Calculator, CalculatorKind};
pub use error::{CalcError, Result};
pub use explain::ExplainRequest;
pub use params::{ParamDefault, ParamValue, ParameterSet, ParameterSpec};
pub use report::{Assessment, FieldValue, Report, RiskLevel, Status};
