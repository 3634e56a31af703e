//! Shared ambient helpers for EE Calc binaries
//!
//! - logging initialisation on top of `tracing-subscriber`
//! - layered configuration loading with `figment`

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
