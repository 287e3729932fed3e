//! Error types for affectsim.
//!
//! All errors are strongly typed using thiserror. The only hard,
//! caller-visible failure class is validation: a run either rejects before
//! sampling or completes. Evaluation-time faults degrade locally: a
//! malformed clause fails its own leaf, never the run.

use thiserror::Error;

/// Validation errors that occur before any sampling happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Sample count must be greater than zero")]
    ZeroSampleCount,

    #[error("Confidence level {value} is out of range (0.0, 1.0)")]
    ConfidenceLevelOutOfRange { value: f64 },

    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("Coverage bin count must be greater than zero")]
    ZeroBinCount,

    #[error("Expression id cannot be empty")]
    EmptyExpressionId,

    #[error("Unseeded variable paths: {}", paths.join(", "))]
    UnseededVariables { paths: Vec<String> },
}

/// Top-level error type for affectsim.
#[derive(Debug, Error)]
pub enum AffectSimError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AffectSimError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for affectsim operations.
pub type SimResult<T> = Result<T, AffectSimError>;
