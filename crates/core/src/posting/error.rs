//! Posting rule error types.

use tally_shared::types::AccountId;
use thiserror::Error;

use super::rules::SystemAccountRole;
use crate::documents::DocumentKind;

/// Errors that can occur while building postings.
#[derive(Debug, Error)]
pub enum PostingError {
    /// A configured system account is absent, inactive or a header.
    ///
    /// This is a setup problem and is never retried.
    #[error("System account {role} (code {code}) is missing or not postable")]
    MissingSystemAccount {
        /// Role the account plays in the rule.
        role: SystemAccountRole,
        /// Configured account code.
        code: String,
    },

    /// Selected cash/bank account is not an active postable asset.
    #[error("Account {0} cannot be used as a cash or bank account")]
    InvalidCashAccount(AccountId),

    /// Rule invoked with a document of the other kind.
    #[error("Posting rule expects a {expected}")]
    DocumentKindMismatch {
        /// Kind the rule handles.
        expected: DocumentKind,
    },
}

impl PostingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSystemAccount { .. } => "MISSING_SYSTEM_ACCOUNT",
            Self::InvalidCashAccount(_) => "INVALID_CASH_ACCOUNT",
            Self::DocumentKindMismatch { .. } => "DOCUMENT_KIND_MISMATCH",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidCashAccount(_) | Self::DocumentKindMismatch { .. } => 400,
            Self::MissingSystemAccount { .. } => 422,
        }
    }

    /// Returns true if this is a chart-of-accounts setup problem.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingSystemAccount { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_system_account_display() {
        let err = PostingError::MissingSystemAccount {
            role: SystemAccountRole::VatOutput,
            code: "21210".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "System account VAT Output (code 21210) is missing or not postable"
        );
        assert!(err.is_configuration());
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_invalid_cash_account() {
        let err = PostingError::InvalidCashAccount(AccountId::new());
        assert!(!err.is_configuration());
        assert_eq!(err.error_code(), "INVALID_CASH_ACCOUNT");
    }
}
