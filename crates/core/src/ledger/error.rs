//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur while validating, posting
//! or reversing journal entries.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry has no lines.
    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    /// A line carries a negative amount.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// 1-based line number.
        line: usize,
    },

    /// A line amount does not fit a stored amount.
    #[error("Line {line} amount is out of range")]
    AmountOutOfRange {
        /// 1-based line number.
        line: usize,
    },

    /// Entry totals do not fit a stored amount.
    #[error("Journal entry totals are out of range")]
    TotalOutOfRange,

    /// A line carries both a debit and a credit.
    #[error("Line {line} must specify either debit or credit, not both")]
    BothSides {
        /// 1-based line number.
        line: usize,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Entry totals are zero.
    #[error("Journal entry amount cannot be zero")]
    ZeroAmount,

    // ========== Account Errors ==========
    /// Account not found in the tenant.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Header accounts only group other accounts.
    #[error("Account {0} is a header account and cannot receive postings")]
    HeaderAccount(AccountId),

    // ========== Entry State Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// A reversal of this entry was already posted.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::AmountOutOfRange { .. } | Self::TotalOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::BothSides { .. } => "BOTH_SIDES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::HeaderAccount(_) => "HEADER_ACCOUNT",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::EmptyEntry
            | Self::NegativeAmount { .. }
            | Self::AmountOutOfRange { .. }
            | Self::TotalOutOfRange
            | Self::BothSides { .. }
            | Self::Unbalanced { .. }
            | Self::ZeroAmount
            | Self::AccountInactive(_)
            | Self::HeaderAccount(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::EntryNotFound(_) => 404,

            // 409 Conflict
            Self::AlreadyReversed(_) => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::EmptyEntry.error_code(), "EMPTY_ENTRY");
        assert_eq!(
            LedgerError::Unbalanced {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(LedgerError::ZeroAmount.error_code(), "ZERO_AMOUNT");
        assert_eq!(
            LedgerError::NegativeAmount { line: 1 }.error_code(),
            "NEGATIVE_AMOUNT"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::EmptyEntry.http_status_code(), 400);
        assert_eq!(
            LedgerError::HeaderAccount(AccountId::new()).http_status_code(),
            400
        );
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::AlreadyReversed(JournalEntryId::new()).http_status_code(),
            409
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(5000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 100.00, Credit: 50.00"
        );
        assert_eq!(
            LedgerError::BothSides { line: 2 }.to_string(),
            "Line 2 must specify either debit or credit, not both"
        );
    }
}
