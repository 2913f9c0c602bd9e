//! `SeaORM` entity definitions.
//!
//! One module per table, plus the Postgres enums shared between them.

pub mod prelude;

pub mod chart_of_accounts;
pub mod contacts;
pub mod document_sequences;
pub mod journal_entries;
pub mod journal_lines;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod trade_document_items;
pub mod trade_documents;
