//! Contact repository for customers and vendors.
//!
//! Counterparty management lives outside the ledger; this repository only
//! provisions and reads the rows documents point at.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tally_core::documents::{Counterparty, CounterpartyKind};
use tally_shared::AppError;
use tally_shared::types::{ContactId, TenantId};

use crate::entities::{contacts, sea_orm_active_enums::ContactKind};
use crate::rls::RlsConnection;

/// Error types for contact operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// Contact code already exists for this kind in the tenant.
    #[error("Contact code '{0}' already exists")]
    DuplicateCode(String),

    /// Contact not found.
    #[error("Contact not found: {0}")]
    NotFound(ContactId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::DuplicateCode(_) => Self::Conflict(err.to_string()),
            ContactError::NotFound(_) => Self::NotFound(err.to_string()),
            ContactError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a contact.
#[derive(Debug, Clone)]
pub struct CreateContactInput {
    /// Customer or vendor.
    pub kind: CounterpartyKind,
    /// Contact code, unique per kind.
    pub code: String,
    /// Display name used in journal descriptions.
    pub name: String,
    /// Tax identification number.
    pub tax_id: Option<String>,
}

/// Contact repository.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken for this kind.
    pub async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateContactInput,
    ) -> Result<Counterparty, ContactError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let now = chrono::Utc::now().into();
        let code = input.code.clone();

        let model = contacts::ActiveModel {
            id: Set(ContactId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            kind: Set(input.kind.into()),
            code: Set(input.code),
            name: Set(input.name),
            tax_id: Set(input.tax_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(rls.transaction())
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ContactError::DuplicateCode(code),
            _ => ContactError::Database(err),
        })?;

        rls.commit().await?;
        Ok(model.into())
    }

    /// Finds a contact by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the contact does not exist in the tenant.
    pub async fn get(&self, tenant_id: TenantId, id: ContactId) -> Result<Counterparty, ContactError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let contact = find_contact(rls.transaction(), tenant_id, id)
            .await?
            .ok_or(ContactError::NotFound(id))?;
        rls.commit().await?;
        Ok(contact)
    }

    /// Lists contacts of one kind ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        kind: CounterpartyKind,
    ) -> Result<Vec<Counterparty>, ContactError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let models = contacts::Entity::find()
            .filter(contacts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(contacts::Column::Kind.eq(ContactKind::from(kind)))
            .order_by_asc(contacts::Column::Code)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

/// Loads a contact inside an existing transaction.
pub(crate) async fn find_contact<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: ContactId,
) -> Result<Option<Counterparty>, DbErr> {
    Ok(contacts::Entity::find_by_id(id.into_inner())
        .filter(contacts::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await?
        .map(Into::into))
}
