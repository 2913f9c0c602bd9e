//! Sequence error types.

use thiserror::Error;

use super::number::{Period, Series};

/// Errors that can occur while allocating or reading document numbers.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Text is not a valid `YYYYMM` period.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Text is not a valid document number.
    #[error("Invalid document number: {0}")]
    InvalidNumber(String),

    /// Another writer committed the same number first.
    #[error("Document number conflict in {series} series for {period}")]
    Conflict {
        /// Series being allocated.
        series: Series,
        /// Period being allocated.
        period: Period,
    },

    /// Conflicts persisted through every retry.
    #[error("Could not allocate a document number after {attempts} attempts, please try again")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl SequenceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::InvalidNumber(_) => "INVALID_DOCUMENT_NUMBER",
            Self::Conflict { .. } => "SEQUENCE_CONFLICT",
            Self::Exhausted { .. } => "SEQUENCE_EXHAUSTED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod(_) | Self::InvalidNumber(_) => 400,
            Self::Conflict { .. } => 409,
            Self::Exhausted { .. } => 503,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
