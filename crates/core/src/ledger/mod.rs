//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entry and line types
//! - Posting validation (balance, sides, accounts)
//! - Reversal entry construction
//! - Error types for ledger operations

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    AccountInfo, EntryStatus, EntryTotals, JournalEntry, JournalLine, JournalLineInput,
    JournalType, PostingRequest, ValidatedEntry, ValidatedLine,
};
