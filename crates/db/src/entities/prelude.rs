//! `SeaORM` entity prelude.

pub use super::chart_of_accounts::Entity as ChartOfAccounts;
pub use super::contacts::Entity as Contacts;
pub use super::document_sequences::Entity as DocumentSequences;
pub use super::journal_entries::Entity as JournalEntries;
pub use super::journal_lines::Entity as JournalLines;
pub use super::payments::Entity as Payments;
pub use super::trade_document_items::Entity as TradeDocumentItems;
pub use super::trade_documents::Entity as TradeDocuments;
