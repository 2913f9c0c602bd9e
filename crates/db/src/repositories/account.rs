//! Account repository for chart of accounts database operations.
//!
//! Accounts are soft-deactivated; once a journal line references an account
//! it can no longer be deactivated, deleted or turned into a header.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use tally_core::accounts::{
    Account, AccountNode, AccountType, NormalBalance, build_tree, default_chart,
};
use tally_shared::AppError;
use tally_shared::types::{AccountId, TenantId};

use crate::entities::{chart_of_accounts, journal_lines};
use crate::rls::RlsConnection;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account code already exists in the tenant.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Parent account not found in the tenant.
    #[error("Parent account not found: {0}")]
    ParentNotFound(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account with this code.
    #[error("Account code '{0}' not found")]
    CodeNotFound(String),

    /// Account is referenced by journal lines.
    #[error("Account {0} is referenced by journal lines")]
    AccountInUse(AccountId),

    /// Account still has child accounts.
    #[error("Account {0} has child accounts")]
    HasChildren(AccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::AccountNotFound(_) | Self::CodeNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::HasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::ParentNotFound(_) => 400,
            Self::AccountNotFound(_) | Self::CodeNotFound(_) => 404,
            Self::DuplicateCode(_) => 409,
            Self::AccountInUse(_) | Self::HasChildren(_) => 422,
            Self::Database(_) => 500,
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Database(e) => Self::Database(e.to_string()),
            other => Self::from_status(other.http_status_code(), other.to_string()),
        }
    }
}

/// Parent reference for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Parent by ID.
    Id(AccountId),
    /// Parent by account code.
    Code(String),
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account code (must be unique within the tenant).
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Explicit normal balance; derived from the type when absent.
    pub normal_balance: Option<NormalBalance>,
    /// Parent account for hierarchical structure.
    pub parent: Option<ParentRef>,
    /// Whether the account only groups children.
    pub is_header: bool,
}

impl CreateAccountInput {
    /// Creates a postable root account input.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            normal_balance: None,
            parent: None,
            is_header: false,
        }
    }

    /// Places the account under `parent`.
    #[must_use]
    pub fn under(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Marks the account as a header.
    #[must_use]
    pub const fn header(mut self) -> Self {
        self.is_header = true;
        self
    }
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New header flag.
    pub is_header: Option<bool>,
}

/// Account repository for chart of accounts operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new account with validation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Account code already exists in the tenant
    /// - Parent account does not exist in the tenant
    pub async fn create(
        &self,
        tenant_id: TenantId,
        input: CreateAccountInput,
    ) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let account = Self::insert_account(rls.transaction(), tenant_id, input).await?;
        rls.commit().await?;

        tracing::info!(%tenant_id, code = %account.code, "Created account");
        Ok(account)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist in the tenant.
    pub async fn get(&self, tenant_id: TenantId, id: AccountId) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let model = find_model(rls.transaction(), tenant_id, id).await?;
        rls.commit().await?;
        Ok(model.into())
    }

    /// Resolves an account by code.
    ///
    /// # Errors
    ///
    /// Returns `CodeNotFound` if no account has the code.
    pub async fn resolve(&self, tenant_id: TenantId, code: &str) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let model = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(chart_of_accounts::Column::Code.eq(code))
            .one(rls.transaction())
            .await?
            .ok_or_else(|| AccountError::CodeNotFound(code.to_string()))?;
        rls.commit().await?;
        Ok(model.into())
    }

    /// Lists active accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, tenant_id: TenantId) -> Result<Vec<Account>, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let models = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(chart_of_accounts::Column::IsActive.eq(true))
            .order_by_asc(chart_of_accounts::Column::Code)
            .all(rls.transaction())
            .await?;
        rls.commit().await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Builds the account forest, including inactive accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn tree(&self, tenant_id: TenantId) -> Result<Vec<AccountNode>, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let models = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .all(rls.transaction())
            .await?;
        rls.commit().await?;
        Ok(build_tree(models.into_iter().map(Into::into).collect()))
    }

    /// Finds accounts by code, keyed by code. Unknown codes are absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_codes(
        &self,
        tenant_id: TenantId,
        codes: &[String],
    ) -> Result<HashMap<String, Account>, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let accounts = accounts_by_codes(rls.transaction(), tenant_id, codes).await?;
        rls.commit().await?;
        Ok(accounts)
    }

    /// Updates an account's name or header flag.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Account not found
    /// - Turning a referenced account into a header
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();
        let model = find_model_for_update(txn, tenant_id, id).await?;

        if input.is_header == Some(true)
            && !model.is_header
            && is_referenced(txn, tenant_id, id).await?
        {
            return Err(AccountError::AccountInUse(id));
        }

        let mut active: chart_of_accounts::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(is_header) = input.is_header {
            active.is_header = Set(is_header);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(txn).await?;
        rls.commit().await?;
        Ok(updated.into())
    }

    /// Deactivates an account that no journal line references.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `AccountInUse`.
    pub async fn deactivate(&self, tenant_id: TenantId, id: AccountId) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();
        let model = find_model_for_update(txn, tenant_id, id).await?;

        if is_referenced(txn, tenant_id, id).await? {
            return Err(AccountError::AccountInUse(id));
        }

        let updated = set_active(txn, model, false).await?;
        rls.commit().await?;

        tracing::info!(%tenant_id, code = %updated.code, "Deactivated account");
        Ok(updated.into())
    }

    /// Reactivates a deactivated account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn reactivate(&self, tenant_id: TenantId, id: AccountId) -> Result<Account, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();
        let model = find_model_for_update(txn, tenant_id, id).await?;
        let updated = set_active(txn, model, true).await?;
        rls.commit().await?;
        Ok(updated.into())
    }

    /// Permanently deletes an unreferenced account without children.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountInUse` or `HasChildren`.
    pub async fn delete(&self, tenant_id: TenantId, id: AccountId) -> Result<(), AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();
        let model = find_model_for_update(txn, tenant_id, id).await?;

        if is_referenced(txn, tenant_id, id).await? {
            return Err(AccountError::AccountInUse(id));
        }

        let children = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(chart_of_accounts::Column::ParentId.eq(id.into_inner()))
            .count(txn)
            .await?;
        if children > 0 {
            return Err(AccountError::HasChildren(id));
        }

        chart_of_accounts::Entity::delete_by_id(model.id).exec(txn).await?;
        rls.commit().await?;

        tracing::info!(%tenant_id, code = %model.code, "Deleted account");
        Ok(())
    }

    /// Inserts the default chart, skipping codes that already exist.
    ///
    /// Returns the number of accounts inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn seed_default_chart(&self, tenant_id: TenantId) -> Result<usize, AccountError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let mut by_code: HashMap<String, Account> = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .all(txn)
            .await?
            .into_iter()
            .map(|m| (m.code.clone(), Account::from(m)))
            .collect();

        let mut inserted = 0;
        for entry in default_chart() {
            if by_code.contains_key(entry.code) {
                continue;
            }
            let parent = entry.parent_code.and_then(|code| by_code.get(code));
            let model = chart_of_accounts::ActiveModel {
                id: Set(AccountId::new().into_inner()),
                tenant_id: Set(tenant_id.into_inner()),
                code: Set(entry.code.to_string()),
                name: Set(entry.name.to_string()),
                account_type: Set(entry.account_type.into()),
                normal_balance: Set(entry.account_type.normal_balance().into()),
                level: Set(Account::child_level(parent)),
                is_header: Set(entry.is_header),
                parent_id: Set(parent.map(|p| p.id.into_inner())),
                is_active: Set(true),
                created_at: Set(chrono::Utc::now().into()),
                updated_at: Set(chrono::Utc::now().into()),
            }
            .insert(txn)
            .await?;
            by_code.insert(model.code.clone(), model.into());
            inserted += 1;
        }

        rls.commit().await?;
        tracing::info!(%tenant_id, inserted, "Seeded default chart of accounts");
        Ok(inserted)
    }

    async fn insert_account<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        input: CreateAccountInput,
    ) -> Result<Account, AccountError> {
        let existing = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(chart_of_accounts::Column::Code.eq(input.code.as_str()))
            .count(conn)
            .await?;
        if existing > 0 {
            return Err(AccountError::DuplicateCode(input.code));
        }

        let parent = match &input.parent {
            None => None,
            Some(parent_ref) => Some(find_parent(conn, tenant_id, parent_ref).await?),
        };

        let now = chrono::Utc::now().into();
        let normal_balance = input
            .normal_balance
            .unwrap_or_else(|| input.account_type.normal_balance());
        let code = input.code.clone();

        let model = chart_of_accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            normal_balance: Set(normal_balance.into()),
            level: Set(Account::child_level(parent.as_ref())),
            is_header: Set(input.is_header),
            parent_id: Set(parent.map(|p| p.id.into_inner())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AccountError::DuplicateCode(code),
            _ => AccountError::Database(err),
        })?;

        Ok(model.into())
    }
}

// ============================================================================
// Shared lookups, usable inside another repository's transaction
// ============================================================================

/// Loads accounts by code, keyed by code.
pub(crate) async fn accounts_by_codes<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    codes: &[String],
) -> Result<HashMap<String, Account>, DbErr> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }
    let models = chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(chart_of_accounts::Column::Code.is_in(codes.iter().cloned()))
        .all(conn)
        .await?;
    Ok(models
        .into_iter()
        .map(|m| (m.code.clone(), Account::from(m)))
        .collect())
}

/// Loads accounts by ID, keyed by ID.
pub(crate) async fn accounts_by_ids<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    ids: &[AccountId],
) -> Result<HashMap<AccountId, Account>, DbErr> {
    load_by_ids(conn, tenant_id, ids, false).await
}

/// Loads accounts by ID under `FOR SHARE`.
///
/// Postings hold these locks until commit, so a concurrent deactivation or
/// header change waits and then sees the new lines.
pub(crate) async fn lock_accounts_by_ids<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    ids: &[AccountId],
) -> Result<HashMap<AccountId, Account>, DbErr> {
    load_by_ids(conn, tenant_id, ids, true).await
}

async fn load_by_ids<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    ids: &[AccountId],
    lock: bool,
) -> Result<HashMap<AccountId, Account>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut query = chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(chart_of_accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
        .order_by_asc(chart_of_accounts::Column::Id);
    if lock {
        query = query.lock_shared();
    }
    let models = query.all(conn).await?;
    Ok(models
        .into_iter()
        .map(|m| (AccountId::from(m.id), Account::from(m)))
        .collect())
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: AccountId,
) -> Result<chart_of_accounts::Model, AccountError> {
    chart_of_accounts::Entity::find_by_id(id.into_inner())
        .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .one(conn)
        .await?
        .ok_or(AccountError::AccountNotFound(id))
}

/// Loads and locks an account row before a reference check, waiting out any
/// open posting that holds it `FOR SHARE`.
async fn find_model_for_update<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: AccountId,
) -> Result<chart_of_accounts::Model, AccountError> {
    chart_of_accounts::Entity::find_by_id(id.into_inner())
        .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(AccountError::AccountNotFound(id))
}

async fn find_parent<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    parent: &ParentRef,
) -> Result<Account, AccountError> {
    let query = chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()));
    let (query, label) = match parent {
        ParentRef::Id(id) => (
            query.filter(chart_of_accounts::Column::Id.eq(id.into_inner())),
            id.to_string(),
        ),
        ParentRef::Code(code) => (
            query.filter(chart_of_accounts::Column::Code.eq(code.as_str())),
            code.clone(),
        ),
    };
    query
        .one(conn)
        .await?
        .map(Account::from)
        .ok_or(AccountError::ParentNotFound(label))
}

async fn is_referenced<C: ConnectionTrait>(
    conn: &C,
    tenant_id: TenantId,
    id: AccountId,
) -> Result<bool, DbErr> {
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::TenantId.eq(tenant_id.into_inner()))
        .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
        .count(conn)
        .await?;
    Ok(lines > 0)
}

async fn set_active<C: ConnectionTrait>(
    conn: &C,
    model: chart_of_accounts::Model,
    is_active: bool,
) -> Result<chart_of_accounts::Model, DbErr> {
    let mut active: chart_of_accounts::ActiveModel = model.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(conn).await
}
