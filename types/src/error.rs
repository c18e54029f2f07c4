//! Caller-facing validation errors shared across crates.

use crate::curve::CurveField;
use thiserror::Error;

/// Errors raised by stat-name validation, curve configuration and arithmetic.
///
/// Every variant is an invalid-argument class error: it is raised
/// synchronously at the public call, before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("stat name must not be blank")]
    BlankName,

    #[error("stat name '{0}' must not contain uppercase characters")]
    UppercaseName(String),

    #[error("stat name '{0}' must not contain whitespace")]
    WhitespaceName(String),

    #[error("stat '{0}' is already registered")]
    DuplicateStat(String),

    #[error("stat '{0}' is not registered")]
    UnknownStat(String),

    #[error("exponent must be non-negative, got {0}")]
    NegativeExponent(i32),

    #[error("invalid {field} for stat curve: {reason}")]
    InvalidCurve { field: CurveField, reason: String },
}
