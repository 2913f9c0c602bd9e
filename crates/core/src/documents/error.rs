//! Document lifecycle error types.

use rust_decimal::Decimal;
use tally_shared::types::{ContactId, DocumentId};
use thiserror::Error;

use super::types::{CounterpartyKind, DocumentAction, DocumentStatus};

/// Errors that can occur during document lifecycle operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    // ========== Validation Errors ==========
    /// Document has no items.
    #[error("Document must have at least one item")]
    NoItems,

    /// Item quantity is zero, negative or too large.
    #[error("Item {line} quantity must be positive and below 10^14")]
    InvalidQuantity {
        /// 1-based item number.
        line: usize,
    },

    /// Item unit price is negative or too large.
    #[error("Item {line} unit price must be between 0 and 10^14")]
    InvalidUnitPrice {
        /// 1-based item number.
        line: usize,
    },

    /// Document totals do not fit a stored amount.
    #[error("Document total is out of range")]
    AmountOutOfRange,

    /// Due date precedes the document date.
    #[error("Due date cannot be before the document date")]
    DueBeforeDocumentDate,

    /// Payment amount is zero or negative.
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Payment exceeds the amount still owed.
    #[error("Payment of {amount} exceeds outstanding amount {outstanding}")]
    Overpayment {
        /// Attempted payment amount.
        amount: Decimal,
        /// Amount still owed.
        outstanding: Decimal,
    },

    // ========== Counterparty Errors ==========
    /// Counterparty not found.
    #[error("Counterparty not found: {0}")]
    CounterpartyNotFound(ContactId),

    /// Counterparty is of the wrong kind for the document.
    #[error("Counterparty {id} must be a {expected}")]
    CounterpartyKindMismatch {
        /// The counterparty.
        id: ContactId,
        /// Kind the document requires.
        expected: CounterpartyKind,
    },

    /// Counterparty is inactive.
    #[error("Counterparty {0} is inactive")]
    CounterpartyInactive(ContactId),

    // ========== State Errors ==========
    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Document status does not permit the action.
    #[error("Cannot {action} a document in {from} status")]
    InvalidTransition {
        /// Current status.
        from: DocumentStatus,
        /// Requested action.
        action: DocumentAction,
    },
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoItems => "NO_ITEMS",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidUnitPrice { .. } => "INVALID_UNIT_PRICE",
            Self::AmountOutOfRange => "AMOUNT_OUT_OF_RANGE",
            Self::DueBeforeDocumentDate => "DUE_BEFORE_DOCUMENT_DATE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::CounterpartyNotFound(_) => "COUNTERPARTY_NOT_FOUND",
            Self::CounterpartyKindMismatch { .. } => "COUNTERPARTY_KIND_MISMATCH",
            Self::CounterpartyInactive(_) => "COUNTERPARTY_INACTIVE",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NoItems
            | Self::InvalidQuantity { .. }
            | Self::InvalidUnitPrice { .. }
            | Self::AmountOutOfRange
            | Self::DueBeforeDocumentDate
            | Self::InvalidAmount(_)
            | Self::CounterpartyKindMismatch { .. }
            | Self::CounterpartyInactive(_) => 400,

            // 404 Not Found
            Self::CounterpartyNotFound(_) | Self::DocumentNotFound(_) => 404,

            // 422 Unprocessable - state rules
            Self::Overpayment { .. } | Self::InvalidTransition { .. } => 422,
        }
    }
}
