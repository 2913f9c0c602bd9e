//! Document lifecycle rules.
//!
//! Every function here is a pure decision over the current state; the
//! repository applies the result inside one database transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{checked_sum, is_storable, round_money};

use super::error::DocumentError;
use super::types::{
    Counterparty, DocumentAction, DocumentItem, DocumentItemInput, DocumentKind, DocumentStatus,
    DocumentTotals,
};

/// Priced items and the resulting totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    /// Items with line numbers and amounts.
    pub items: Vec<DocumentItem>,
    /// Document totals.
    pub totals: DocumentTotals,
}

/// Result of applying a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplication {
    /// Paid amount after the payment.
    pub new_paid: Decimal,
    /// Status after the payment.
    pub new_status: DocumentStatus,
}

/// What voiding a document requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidAction {
    /// Nothing was posted; just mark the document voided.
    NoLedgerEffect,
    /// Post a reversal of the approval entry, then mark voided.
    ReverseEntry,
}

/// Exclusive bound on item quantities and unit prices (`NUMERIC(18,4)`).
const MAX_ITEM_VALUE: Decimal = Decimal::from_parts(276_447_232, 23_283, 0, false, 0);

/// Document lifecycle service.
pub struct DocumentLifecycle;

impl DocumentLifecycle {
    /// Checks if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: DocumentStatus, to: DocumentStatus) -> bool {
        use DocumentStatus::{Approved, Draft, Overdue, Paid, Partial, Voided};

        matches!(
            (from, to),
            (Draft, Approved | Voided)
                | (Approved, Partial | Overdue | Paid | Voided)
                | (Partial, Partial | Overdue | Paid)
                | (Overdue, Overdue | Paid | Voided)
        )
    }

    fn transition(
        from: DocumentStatus,
        to: DocumentStatus,
        action: DocumentAction,
    ) -> Result<DocumentStatus, DocumentError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(DocumentError::InvalidTransition { from, action })
        }
    }

    /// Validates items and computes amounts and totals.
    ///
    /// # Errors
    ///
    /// Returns `NoItems`, `InvalidQuantity`, `InvalidUnitPrice`, or
    /// `AmountOutOfRange` when an amount or the total cannot be stored.
    pub fn price_items(items: &[DocumentItemInput]) -> Result<PricedItems, DocumentError> {
        if items.is_empty() {
            return Err(DocumentError::NoItems);
        }

        let mut priced = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let line = index + 1;
            if item.quantity <= Decimal::ZERO || item.quantity >= MAX_ITEM_VALUE {
                return Err(DocumentError::InvalidQuantity { line });
            }
            if item.unit_price < Decimal::ZERO || item.unit_price >= MAX_ITEM_VALUE {
                return Err(DocumentError::InvalidUnitPrice { line });
            }
            let amount = item
                .quantity
                .checked_mul(item.unit_price)
                .map(round_money)
                .filter(|amount| is_storable(*amount))
                .ok_or(DocumentError::AmountOutOfRange)?;
            priced.push(DocumentItem {
                line_number: i32::try_from(line).unwrap_or(i32::MAX),
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                amount,
            });
        }

        let subtotal =
            checked_sum(priced.iter().map(|i| i.amount)).ok_or(DocumentError::AmountOutOfRange)?;
        let totals = DocumentTotals::from_subtotal(subtotal);
        if !is_storable(totals.total_amount) {
            return Err(DocumentError::AmountOutOfRange);
        }
        Ok(PricedItems {
            items: priced,
            totals,
        })
    }

    /// Checks document dates.
    ///
    /// # Errors
    ///
    /// Returns `DueBeforeDocumentDate` if `due_date < document_date`.
    pub fn validate_dates(document_date: NaiveDate, due_date: NaiveDate) -> Result<(), DocumentError> {
        if due_date < document_date {
            return Err(DocumentError::DueBeforeDocumentDate);
        }
        Ok(())
    }

    /// Checks that a counterparty may be used on a document of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `CounterpartyKindMismatch` or `CounterpartyInactive`.
    pub fn ensure_counterparty(
        kind: DocumentKind,
        counterparty: &Counterparty,
    ) -> Result<(), DocumentError> {
        let expected = kind.counterparty_kind();
        if counterparty.kind != expected {
            return Err(DocumentError::CounterpartyKindMismatch {
                id: counterparty.id,
                expected,
            });
        }
        if !counterparty.is_active {
            return Err(DocumentError::CounterpartyInactive(counterparty.id));
        }
        Ok(())
    }

    /// Approves a draft.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the document is a draft.
    pub fn approve(status: DocumentStatus) -> Result<DocumentStatus, DocumentError> {
        Self::transition(status, DocumentStatus::Approved, DocumentAction::Approve)
    }

    /// Applies a payment of `amount` to a document.
    ///
    /// The document becomes `Paid` once fully settled; otherwise an overdue
    /// document stays `Overdue` and any other becomes `Partial`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the status does not accept payments,
    /// `InvalidAmount` for non-positive amounts, and `Overpayment` if the
    /// paid amount would exceed the total.
    pub fn apply_payment(
        status: DocumentStatus,
        total_amount: Decimal,
        paid_amount: Decimal,
        amount: Decimal,
    ) -> Result<PaymentApplication, DocumentError> {
        if !status.accepts_payment() {
            return Err(DocumentError::InvalidTransition {
                from: status,
                action: DocumentAction::Pay,
            });
        }

        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(DocumentError::InvalidAmount(amount));
        }

        let outstanding = total_amount - paid_amount;
        let new_paid = match paid_amount.checked_add(amount) {
            Some(new_paid) if new_paid <= total_amount => new_paid,
            _ => return Err(DocumentError::Overpayment { amount, outstanding }),
        };

        let target = if new_paid >= total_amount {
            DocumentStatus::Paid
        } else if status == DocumentStatus::Overdue {
            DocumentStatus::Overdue
        } else {
            DocumentStatus::Partial
        };

        Ok(PaymentApplication {
            new_paid,
            new_status: Self::transition(status, target, DocumentAction::Pay)?,
        })
    }

    /// Decides how to void a document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for documents that are paid, partly paid
    /// or already voided.
    pub fn void(status: DocumentStatus, paid_amount: Decimal) -> Result<VoidAction, DocumentError> {
        let invalid = DocumentError::InvalidTransition {
            from: status,
            action: DocumentAction::Void,
        };
        if !paid_amount.is_zero() {
            return Err(invalid);
        }
        Self::transition(status, DocumentStatus::Voided, DocumentAction::Void)?;
        Ok(match status {
            DocumentStatus::Draft => VoidAction::NoLedgerEffect,
            _ => VoidAction::ReverseEntry,
        })
    }

    /// Returns true if the document should be flagged overdue as of `as_of`.
    #[must_use]
    pub fn is_overdue(status: DocumentStatus, due_date: NaiveDate, as_of: NaiveDate) -> bool {
        matches!(status, DocumentStatus::Approved | DocumentStatus::Partial) && due_date < as_of
    }
}
