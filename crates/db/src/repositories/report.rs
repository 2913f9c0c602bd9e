//! Report repository for trial balance and general ledger queries.
//!
//! Aggregation happens in SQL; netting, ordering and running balances are
//! left to `ReportService` so they stay covered by its unit tests.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult, QueryFilter,
    Statement,
};
use tally_core::accounts::Account;
use tally_core::reports::{
    AccountActivity, GeneralLedgerReport, LedgerLine, ReportError, ReportService,
    TrialBalanceReport,
};
use tally_shared::AppError;
use tally_shared::types::{AccountId, TenantId};
use uuid::Uuid;

use crate::entities::chart_of_accounts;
use crate::rls::RlsConnection;

/// Error types for report queries.
#[derive(Debug, thiserror::Error)]
pub enum ReportRepoError {
    /// Report parameters rejected.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportRepoError> for AppError {
    fn from(err: ReportRepoError) -> Self {
        match err {
            ReportRepoError::Report(e) => Self::from_status(e.http_status_code(), e.to_string()),
            ReportRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

const ACCOUNT_TOTALS_SQL: &str = r"
SELECT jl.account_id,
       COALESCE(SUM(jl.debit), 0) AS total_debit,
       COALESCE(SUM(jl.credit), 0) AS total_credit
FROM journal_lines jl
JOIN journal_entries je ON je.id = jl.journal_entry_id
WHERE jl.tenant_id = $1
  AND je.entry_date <= $2
GROUP BY jl.account_id
";

const OPENING_BALANCE_SQL: &str = r"
SELECT COALESCE(SUM(jl.debit - jl.credit), 0) AS balance
FROM journal_lines jl
JOIN journal_entries je ON je.id = jl.journal_entry_id
WHERE jl.tenant_id = $1
  AND jl.account_id = $2
  AND je.entry_date < $3
";

const LEDGER_LINES_SQL: &str = r"
SELECT je.id AS entry_id,
       je.entry_date,
       je.entry_number,
       je.description AS entry_description,
       jl.line_number,
       jl.description AS line_description,
       jl.debit,
       jl.credit
FROM journal_lines jl
JOIN journal_entries je ON je.id = jl.journal_entry_id
WHERE jl.tenant_id = $1
  AND jl.account_id = $2
  AND je.entry_date BETWEEN $3 AND $4
ORDER BY je.entry_date, length(je.entry_number), je.entry_number, jl.line_number
";

#[derive(Debug, FromQueryResult)]
struct AccountTotals {
    account_id: Uuid,
    total_debit: Decimal,
    total_credit: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct OpeningBalance {
    balance: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct LedgerLineRow {
    entry_id: Uuid,
    entry_date: NaiveDate,
    entry_number: String,
    entry_description: String,
    line_number: i32,
    line_description: String,
    debit: Decimal,
    credit: Decimal,
}

/// Report repository for financial report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Trial balance of every account with activity up to `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceReport, ReportRepoError> {
        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            ACCOUNT_TOTALS_SQL,
            [tenant_id.into_inner().into(), as_of.into()],
        );
        let totals = AccountTotals::find_by_statement(stmt).all(txn).await?;

        let mut accounts: HashMap<Uuid, chart_of_accounts::Model> = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .all(txn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        rls.commit().await?;

        let activity = totals
            .into_iter()
            .filter_map(|row| {
                let account = Account::from(accounts.remove(&row.account_id)?);
                Some(AccountActivity {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    account_type: account.account_type,
                    total_debit: row.total_debit,
                    total_credit: row.total_credit,
                })
            })
            .collect();

        let report = ReportService::generate_trial_balance(as_of, activity);
        tracing::debug!(
            %tenant_id,
            %as_of,
            accounts = report.accounts.len(),
            balanced = report.totals.is_balanced,
            "Generated trial balance"
        );
        Ok(report)
    }

    /// General ledger of one account over `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end`, `AccountNotFound` if the
    /// account does not exist in the tenant, or a database error.
    pub async fn general_ledger(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GeneralLedgerReport, ReportRepoError> {
        ReportService::validate_date_range(start, end)?;

        let rls = RlsConnection::new(&self.db, tenant_id).await?;
        let txn = rls.transaction();

        let account: Account = chart_of_accounts::Entity::find_by_id(account_id.into_inner())
            .filter(chart_of_accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(txn)
            .await?
            .ok_or(ReportError::AccountNotFound(account_id))?
            .into();

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            OPENING_BALANCE_SQL,
            [
                tenant_id.into_inner().into(),
                account_id.into_inner().into(),
                start.into(),
            ],
        );
        let opening = OpeningBalance::find_by_statement(stmt)
            .one(txn)
            .await?
            .map_or(Decimal::ZERO, |row| row.balance);

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            LEDGER_LINES_SQL,
            [
                tenant_id.into_inner().into(),
                account_id.into_inner().into(),
                start.into(),
                end.into(),
            ],
        );
        let lines = LedgerLineRow::find_by_statement(stmt)
            .all(txn)
            .await?
            .into_iter()
            .map(|row| LedgerLine {
                entry_id: row.entry_id.into(),
                entry_date: row.entry_date,
                entry_number: row.entry_number,
                line_number: row.line_number,
                line_description: Some(row.line_description).filter(|d| !d.is_empty()),
                entry_description: row.entry_description,
                debit: row.debit,
                credit: row.credit,
            })
            .collect();
        rls.commit().await?;

        Ok(ReportService::generate_general_ledger(
            &account, start, end, opening, lines,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_range_is_validation_error() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = ReportRepoError::from(ReportError::InvalidDateRange { start, end });
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_missing_account_is_not_found() {
        let err = ReportRepoError::from(ReportError::AccountNotFound(AccountId::new()));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }
}
