//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Tenant-scoped (row-level security) transactions
//! - Repositories for accounts, contacts, journal entries, documents and reports
//! - The schema migration

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod rls;

pub use migration::Migrator;
pub use repositories::{
    AccountError, AccountRepository, ContactError, ContactRepository, DocumentRepoError,
    DocumentRepository, JournalError, JournalRepository, ReportRepoError, ReportRepository,
    SequenceRepoError, SequenceRepository,
};
pub use rls::RlsConnection;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
