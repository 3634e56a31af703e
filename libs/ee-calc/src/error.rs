//! Error types for ee-calc

use thiserror::Error;

/// Calculation errors
///
/// Physically risky conditions (saturation, overload, Vref exceeded) are not
/// errors; they come back as a successful report with a Caution/Danger level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Input outside the calculator's domain (non-positive ratio, zero GBW, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single named parameter could not be read (non-finite, wrong type)
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown calculator: {0}")]
    UnknownCalculator(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalcError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_calculator(name: impl Into<String>) -> Self {
        Self::UnknownCalculator(name.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Human-readable reason without the category prefix
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::UnknownCalculator(msg) | Self::Serialization(msg) => {
                msg.clone()
            },
            Self::InvalidParameter { name, reason } => format!("{}: {}", name, reason),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
