//! Journal repository: the single write path for balances.
//!
//! Entries are validated by `LedgerService`, numbered from the journal
//! series, and written header-plus-lines in one transaction. Posted entries
//! are never updated or deleted; corrections are reversal entries.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::{
    AccountInfo, JournalEntry, JournalLine, LedgerError, LedgerService, PostingRequest,
};
use tally_core::sequence::{Period, SequenceError, Series};
use tally_shared::types::{AccountId, JournalEntryId, PageRequest, PageResponse, TenantId};
use tally_shared::{AppError, RequestContext};

use super::account::lock_accounts_by_ids;
use super::sequence::{
    SequenceRepository, SequenceRetry, number_conflict, number_width, with_sequence_retry,
};
use crate::entities::{journal_entries, journal_lines, sea_orm_active_enums::JournalStatus};
use crate::rls::RlsConnection;

/// Default number of attempts for an allocation that lost a race.
pub const DEFAULT_SEQUENCE_ATTEMPTS: u32 = 3;

/// Error types for journal operations.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Entry failed ledger validation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Entry number could not be allocated.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl JournalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Sequence(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::Sequence(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl SequenceRetry for JournalError {
    fn is_sequence_conflict(&self) -> bool {
        matches!(self, Self::Sequence(err) if err.is_retryable())
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Database(e) => Self::Database(e.to_string()),
            other => Self::from_status(other.http_status_code(), other.to_string()),
        }
    }
}

/// Journal repository for posting and reading entries.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: DatabaseConnection,
    max_sequence_attempts: u32,
}

impl JournalRepository {
    /// Creates a new journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            max_sequence_attempts: DEFAULT_SEQUENCE_ATTEMPTS,
        }
    }

    /// Overrides how many times a lost number race is retried.
    #[must_use]
    pub const fn with_sequence_attempts(mut self, attempts: u32) -> Self {
        self.max_sequence_attempts = attempts;
        self
    }

    /// Validates and posts a journal entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry fails validation (empty, unbalanced, zero, bad accounts)
    /// - No entry number could be allocated after every retry
    /// - Database operation fails
    pub async fn post(
        &self,
        ctx: RequestContext,
        request: PostingRequest,
    ) -> Result<JournalEntry, JournalError> {
        let request = &request;
        with_sequence_retry(self.max_sequence_attempts, move || async move {
            let rls = RlsConnection::new(&self.db, ctx.tenant_id).await?;
            let entry = Self::post_in(rls.transaction(), ctx, request).await?;
            rls.commit().await?;
            Ok(entry)
        })
        .await
    }

    /// Posts an entry reversing `entry_id`, with every line's sides swapped.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `AlreadyReversed`, or any posting error.
    pub async fn reverse(
        &self,
        ctx: RequestContext,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<JournalEntry, JournalError> {
        with_sequence_retry(self.max_sequence_attempts, move || async move {
            let rls = RlsConnection::new(&self.db, ctx.tenant_id).await?;
            let entry =
                Self::reverse_in(rls.transaction(), ctx, entry_id, reversal_date, reason).await?;
            rls.commit().await?;
            Ok(entry)
        })
        .await
    }

    /// Gets an entry with its lines ordered by line number.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist in the tenant.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, JournalError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let entry = Self::load_in(rls.transaction(), tenant_id, entry_id).await?;
        rls.commit().await?;
        Ok(entry)
    }

    /// Lists entries, newest number first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        page: &PageRequest,
    ) -> Result<PageResponse<JournalEntry>, JournalError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let query = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()));
        let total = query.clone().count(txn).await?;
        let headers = query
            .order_by_desc(number_width(journal_entries::Column::EntryNumber))
            .order_by_desc(journal_entries::Column::EntryNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(txn)
            .await?;

        let ids: Vec<_> = headers.iter().map(|h| h.id).collect();
        let mut lines_by_entry: HashMap<_, Vec<JournalLine>> = HashMap::new();
        if !ids.is_empty() {
            let lines = journal_lines::Entity::find()
                .filter(journal_lines::Column::JournalEntryId.is_in(ids))
                .order_by_asc(journal_lines::Column::JournalEntryId)
                .order_by_asc(journal_lines::Column::LineNumber)
                .all(txn)
                .await?;
            for line in lines {
                lines_by_entry
                    .entry(line.journal_entry_id)
                    .or_default()
                    .push(line.into());
            }
        }
        rls.commit().await?;

        let entries = headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
                to_entry(header, lines)
            })
            .collect();
        Ok(PageResponse::new(entries, page.page, page.page_size(), total))
    }

    /// Validates and writes an entry on an open transaction.
    ///
    /// Used by other repositories so that a document transition and its
    /// posting commit together.
    ///
    /// # Errors
    ///
    /// Returns a validation, sequence or database error. A unique violation
    /// on the entry number is reported as `SequenceError::Conflict`.
    pub async fn post_in<C: ConnectionTrait>(
        conn: &C,
        ctx: RequestContext,
        request: &PostingRequest,
    ) -> Result<JournalEntry, JournalError> {
        let tenant_id = ctx.tenant_id;
        let period = Period::from_date(request.entry_date)?;
        let account_ids: Vec<AccountId> = request.lines.iter().map(|l| l.account_id).collect();
        let accounts = lock_accounts_by_ids(conn, tenant_id, &account_ids).await?;

        let validated = LedgerService::validate(request, |id| {
            accounts.get(&id).map(|a| AccountInfo {
                id: a.id,
                is_active: a.is_active,
                is_header: a.is_header,
            })
        })?;

        let number = SequenceRepository::allocate::<_, JournalError>(
            conn,
            tenant_id,
            Series::Journal,
            period,
        )
        .await?;

        let entry_id = JournalEntryId::new();
        let now = chrono::Utc::now();
        // A unique violation here is either the entry number or a second
        // reversal of the same entry; both are settled by retrying.
        let header = journal_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            tenant_id: Set(tenant_id.into_inner()),
            entry_number: Set(number.to_string()),
            entry_date: Set(validated.entry_date),
            journal_type: Set(validated.journal_type.into()),
            reference: Set(validated.reference.clone()),
            description: Set(validated.description.clone()),
            total_debit: Set(validated.totals.total_debit),
            total_credit: Set(validated.totals.total_credit),
            status: Set(JournalStatus::Posted),
            reverses_entry_id: Set(validated.reverses_entry_id.map(JournalEntryId::into_inner)),
            created_by: Set(ctx.user_id.into_inner()),
            created_at: Set(now.into()),
        }
        .insert(conn)
        .await
        .map_err(|err| number_conflict::<JournalError>(err, &number))?;

        let line_models = validated.lines.iter().map(|line| journal_lines::ActiveModel {
            id: Set(uuid::Uuid::now_v7()),
            tenant_id: Set(tenant_id.into_inner()),
            journal_entry_id: Set(entry_id.into_inner()),
            line_number: Set(line.line_number),
            account_id: Set(line.account_id.into_inner()),
            description: Set(line.description.clone()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            created_at: Set(now.into()),
        });
        journal_lines::Entity::insert_many(line_models).exec(conn).await?;

        tracing::info!(
            %tenant_id,
            entry_number = %header.entry_number,
            journal_type = %validated.journal_type,
            total = %validated.totals.total_debit,
            "Posted journal entry"
        );

        let lines = validated
            .lines
            .into_iter()
            .map(|line| JournalLine {
                line_number: line.line_number,
                account_id: line.account_id,
                description: line.description,
                debit: line.debit,
                credit: line.credit,
            })
            .collect();
        Ok(to_entry(header, lines))
    }

    /// Posts a reversal of `entry_id` on an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `AlreadyReversed`, or any posting error.
    pub async fn reverse_in<C: ConnectionTrait>(
        conn: &C,
        ctx: RequestContext,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<JournalEntry, JournalError> {
        let original = Self::load_in(conn, ctx.tenant_id, entry_id).await?;

        let existing = journal_entries::Entity::find()
            .filter(journal_entries::Column::TenantId.eq(ctx.tenant_id.into_inner()))
            .filter(journal_entries::Column::ReversesEntryId.eq(entry_id.into_inner()))
            .count(conn)
            .await?;
        if existing > 0 {
            return Err(LedgerError::AlreadyReversed(entry_id).into());
        }

        let request = LedgerService::reversal_request(&original, reversal_date, reason);
        let reversal = Self::post_in(conn, ctx, &request).await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            original = %original.entry_number,
            reversal = %reversal.entry_number,
            "Reversed journal entry"
        );
        Ok(reversal)
    }

    /// Loads an entry and its lines on an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist in the tenant.
    pub async fn load_in<C: ConnectionTrait>(
        conn: &C,
        tenant_id: TenantId,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, JournalError> {
        let header = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::TenantId.eq(tenant_id.into_inner()))
            .one(conn)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(header.id))
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(to_entry(header, lines))
    }
}

fn to_entry(header: journal_entries::Model, lines: Vec<JournalLine>) -> JournalEntry {
    JournalEntry {
        id: header.id.into(),
        tenant_id: header.tenant_id.into(),
        entry_number: header.entry_number,
        entry_date: header.entry_date,
        journal_type: header.journal_type.into(),
        reference: header.reference,
        description: header.description,
        total_debit: header.total_debit,
        total_credit: header.total_credit,
        status: header.status.into(),
        reverses_entry_id: header.reverses_entry_id.map(Into::into),
        created_by: header.created_by.into(),
        created_at: header.created_at.with_timezone(&chrono::Utc),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_retryable() {
        let err = JournalError::Sequence(SequenceError::Conflict {
            series: Series::Journal,
            period: Period::new(2024, 1).unwrap(),
        });
        assert!(err.is_sequence_conflict());
        assert_eq!(err.http_status_code(), 409);
    }

    #[test]
    fn test_validation_errors_are_not_retryable() {
        let err = JournalError::Ledger(LedgerError::ZeroAmount);
        assert!(!err.is_sequence_conflict());
        assert_eq!(err.http_status_code(), 400);
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_exhausted_maps_to_try_again() {
        let err = JournalError::Sequence(SequenceError::Exhausted { attempts: 3 });
        assert!(!err.is_sequence_conflict());
        assert!(matches!(AppError::from(err), AppError::TryAgain(_)));
    }
}
