//! Invoice and bill lifecycle.
//!
//! Invoices (sales) and bills (purchases) share one shape, the trade
//! document. This module holds their types, pricing and VAT arithmetic, and
//! the status transition rules applied by the repositories.

pub mod error;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use error::DocumentError;
pub use lifecycle::{DocumentLifecycle, PaymentApplication, PricedItems, VoidAction};
pub use types::{
    Counterparty, CounterpartyKind, DocumentAction, DocumentItem, DocumentItemInput,
    DocumentKind, DocumentStatus, DocumentTotals, Payment, PaymentMethod, PaymentType,
    TradeDocument,
};
