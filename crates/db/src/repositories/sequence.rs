//! Document number allocation.
//!
//! Numbers come from one counter row per tenant + series + period. The row
//! is advanced with a single `INSERT ... ON CONFLICT DO UPDATE ... RETURNING`
//! inside the caller's transaction, so concurrent allocators queue on the row
//! lock until the holder commits, and a rollback hands the number back.
//!
//! The counter is floored at the highest number already present in the
//! table the series is written to, so rows that predate the counter are
//! never issued twice. The unique constraints on those tables remain the
//! backstop; a violation surfaces as `SequenceError::Conflict` and the whole
//! unit of work is retried by [`with_sequence_retry`].

use std::fmt::Display;
use std::future::Future;

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, SqlErr,
    Statement,
};
use tally_core::sequence::{DocumentNumber, Period, SequenceError, Series};
use tally_shared::AppError;
use tally_shared::types::TenantId;

use crate::rls::RlsConnection;

/// Error types for standalone number allocation.
#[derive(Debug, thiserror::Error)]
pub enum SequenceRepoError {
    /// Number could not be allocated or parsed.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Errors that may carry a lost number race.
pub trait SequenceRetry {
    /// Returns true if the operation lost a document number race and can be
    /// retried with a fresh number.
    fn is_sequence_conflict(&self) -> bool;
}

impl SequenceRetry for SequenceError {
    fn is_sequence_conflict(&self) -> bool {
        self.is_retryable()
    }
}

impl SequenceRetry for SequenceRepoError {
    fn is_sequence_conflict(&self) -> bool {
        matches!(self, Self::Sequence(err) if err.is_retryable())
    }
}

impl From<SequenceRepoError> for AppError {
    fn from(err: SequenceRepoError) -> Self {
        match err {
            SequenceRepoError::Sequence(e) => Self::from_status(e.http_status_code(), e.to_string()),
            SequenceRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Runs `operation` until it succeeds, fails for a reason other than a
/// number conflict, or has been attempted `max_attempts` times.
///
/// Each attempt must be a complete unit of work (its own transaction): a
/// unique violation aborts the Postgres transaction it happened in.
///
/// # Errors
///
/// Returns the operation's error, or `SequenceError::Exhausted` once every
/// attempt lost a number race.
pub async fn with_sequence_retry<T, E, F, Fut>(max_attempts: u32, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: SequenceRetry + From<SequenceError> + Display,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(err) if err.is_sequence_conflict() => {
                if attempt >= attempts {
                    tracing::warn!(attempts, error = %err, "Giving up on document number allocation");
                    return Err(SequenceError::Exhausted { attempts }.into());
                }
                tracing::warn!(attempt, error = %err, "Document number conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Maps a unique violation raised while inserting a numbered row to
/// `SequenceError::Conflict`; every other database error passes through.
pub(crate) fn number_conflict<E>(err: DbErr, number: &DocumentNumber) -> E
where
    E: From<SequenceError> + From<DbErr>,
{
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        SequenceError::Conflict {
            series: number.series,
            period: number.period,
        }
        .into()
    } else {
        err.into()
    }
}

/// Width of a number column. Ordering by width before the text keeps
/// `…-10000` after `…-9999`.
pub(crate) fn number_width<C: ColumnTrait>(column: C) -> SimpleExpr {
    Func::char_length(Expr::col(column)).into()
}

const ALLOCATE_SQL: &str = r"
INSERT INTO document_sequences (tenant_id, series, period, last_value, updated_at)
VALUES ($1, $2, $3, $4 + 1, now())
ON CONFLICT (tenant_id, series, period)
DO UPDATE SET
    last_value = GREATEST(document_sequences.last_value, $4) + 1,
    updated_at = now()
RETURNING last_value
";

/// Sequence repository for document number allocation.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Allocates the next number in its own transaction.
    ///
    /// Callers that persist the numbered row should use [`Self::allocate`]
    /// inside their own transaction instead, so that a rollback releases the
    /// number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn next(
        &self,
        tenant_id: TenantId,
        series: Series,
        period: Period,
    ) -> Result<DocumentNumber, SequenceRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let number =
            Self::allocate::<_, SequenceRepoError>(rls.transaction(), tenant_id, series, period)
                .await?;
        rls.commit().await?;
        Ok(number)
    }

    /// Allocates the next number on `conn`, normally an open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or an existing number
    /// cannot be parsed.
    pub async fn allocate<C, E>(
        conn: &C,
        tenant_id: TenantId,
        series: Series,
        period: Period,
    ) -> Result<DocumentNumber, E>
    where
        C: ConnectionTrait,
        E: From<SequenceError> + From<DbErr>,
    {
        let floor = Self::highest_issued::<C, E>(conn, tenant_id, series, period).await?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            ALLOCATE_SQL,
            [
                tenant_id.into_inner().into(),
                series.prefix().into(),
                period.to_string().into(),
                i64::from(floor).into(),
            ],
        );
        let row = conn
            .query_one(stmt)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("document_sequences".to_string()))?;
        let last_value: i64 = row.try_get("", "last_value")?;

        let sequence = u32::try_from(last_value).map_err(|_| {
            SequenceError::InvalidNumber(format!(
                "{}{last_value}",
                DocumentNumber::prefix_for(series, period)
            ))
        })?;
        let number = DocumentNumber::new(series, period, sequence);

        tracing::debug!(%tenant_id, %number, "Allocated document number");
        Ok(number)
    }

    /// Highest sequence already written for the series and period, or 0.
    async fn highest_issued<C, E>(
        conn: &C,
        tenant_id: TenantId,
        series: Series,
        period: Period,
    ) -> Result<u32, E>
    where
        C: ConnectionTrait,
        E: From<SequenceError> + From<DbErr>,
    {
        #[derive(Debug, FromQueryResult)]
        struct IssuedNumber {
            number: String,
        }

        let (table, column) = number_source(series);
        let sql = format!(
            "SELECT {column} AS number FROM {table} \
             WHERE tenant_id = $1 AND {column} ~ $2 \
             ORDER BY length({column}) DESC, {column} DESC \
             LIMIT 1"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                tenant_id.into_inner().into(),
                number_pattern(series, period).into(),
            ],
        );

        match IssuedNumber::find_by_statement(stmt).one(conn).await? {
            Some(row) => Ok(DocumentNumber::parse(&row.number)?.sequence),
            None => Ok(0),
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Table and column each series is persisted in.
const fn number_source(series: Series) -> (&'static str, &'static str) {
    match series {
        Series::Journal => ("journal_entries", "entry_number"),
        Series::Invoice | Series::Bill => ("trade_documents", "document_number"),
        Series::Receipt | Series::PaymentVoucher => ("payments", "document_number"),
    }
}

/// Postgres regex matching every well-formed number of a series and period.
fn number_pattern(series: Series, period: Period) -> String {
    format!("^{}[0-9]{{4,}}$", DocumentNumber::prefix_for(series, period))
}
