//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every call runs in its own tenant-scoped transaction; the `*_in`
//! functions take an open connection so that several writes commit together.

pub mod account;
pub mod contact;
pub mod document;
pub mod journal;
pub mod report;
pub mod sequence;

pub use account::{
    AccountError, AccountRepository, CreateAccountInput, ParentRef, UpdateAccountInput,
};
pub use contact::{ContactError, ContactRepository, CreateContactInput};
pub use document::{
    CreateDocumentInput, DocumentRepoError, DocumentRepository, RecordPaymentInput,
};
pub use journal::{DEFAULT_SEQUENCE_ATTEMPTS, JournalError, JournalRepository};
pub use report::{ReportRepoError, ReportRepository};
pub use sequence::{SequenceRepoError, SequenceRepository, SequenceRetry, with_sequence_retry};
