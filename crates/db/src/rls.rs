//! Row-Level Security (RLS) context management.
//!
//! Every repository call opens a transaction and scopes it to the caller's
//! tenant through the `app.current_tenant_id` setting, which the
//! `tenant_isolation` policies compare against each row's `tenant_id`.
//!
//! # Usage
//!
//! ```ignore
//! use tally_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, ctx.tenant_id).await?;
//! let accounts = chart_of_accounts::Entity::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tally_shared::types::TenantId;

/// A database transaction scoped to one tenant.
///
/// `SET LOCAL` ties the setting to the transaction, so it disappears on
/// commit or rollback and never leaks to the next user of the pooled
/// connection. Dropping it without `commit` rolls the transaction back.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and sets the tenant context on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, tenant_id: TenantId) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, tenant_id).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }
}

async fn set_rls_context(txn: &DatabaseTransaction, tenant_id: TenantId) -> Result<(), DbErr> {
    txn.execute_unprepared(&rls_context_sql(tenant_id)).await?;
    Ok(())
}

// A typed UUID renders as hex and dashes only, so inlining it is safe.
fn rls_context_sql(tenant_id: TenantId) -> String {
    format!("SET LOCAL app.current_tenant_id = '{tenant_id}'")
}
