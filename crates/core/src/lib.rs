//! Core bookkeeping rules for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the `tally-db`
//! crate wraps them in transactions.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts types, hierarchy building, default chart
//! - `sequence` - Document number series and formatting
//! - `ledger` - Double-entry journal validation and reversal
//! - `posting` - Journal lines generated from business documents
//! - `documents` - Invoice and bill lifecycle rules
//! - `reports` - Trial balance and general ledger aggregation

pub mod accounts;
pub mod documents;
pub mod ledger;
pub mod posting;
pub mod reports;
pub mod sequence;
