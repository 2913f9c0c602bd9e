//! Report generation service.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    AccountActivity, GeneralLedgerReport, GeneralLedgerRow, LedgerLine, TrialBalanceReport,
    TrialBalanceRow, TrialBalanceTotals,
};
use crate::accounts::Account;

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Validates a report date range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Generates a trial balance from per-account activity up to `as_of`.
    ///
    /// Each account nets to one side; accounts that net to zero are dropped.
    #[must_use]
    pub fn generate_trial_balance(
        as_of: NaiveDate,
        activity: Vec<AccountActivity>,
    ) -> TrialBalanceReport {
        let mut accounts: Vec<TrialBalanceRow> = activity
            .into_iter()
            .filter_map(|a| {
                let net = a.total_debit - a.total_credit;
                if net.is_zero() {
                    return None;
                }
                Some(TrialBalanceRow {
                    account_id: a.account_id,
                    account_code: a.code,
                    account_name: a.name,
                    account_type: a.account_type,
                    total_debit: a.total_debit,
                    total_credit: a.total_credit,
                    net_debit: net.max(Decimal::ZERO),
                    net_credit: (-net).max(Decimal::ZERO),
                })
            })
            .collect();
        accounts.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let total_debit: Decimal = accounts.iter().map(|a| a.net_debit).sum();
        let total_credit: Decimal = accounts.iter().map(|a| a.net_credit).sum();

        TrialBalanceReport {
            report_type: "trial_balance".to_string(),
            as_of,
            accounts,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }

    /// Generates a general ledger for one account over `[start, end]`.
    ///
    /// Each row's `balance` is the running movement within the range; the
    /// balance carried in from earlier dates is reported separately as
    /// `opening_balance`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn generate_general_ledger(
        account: &Account,
        start: NaiveDate,
        end: NaiveDate,
        opening_balance: Decimal,
        mut lines: Vec<LedgerLine>,
    ) -> Result<GeneralLedgerReport, ReportError> {
        Self::validate_date_range(start, end)?;

        lines.retain(|l| l.entry_date >= start && l.entry_date <= end);
        lines.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.entry_number.len().cmp(&b.entry_number.len()))
                .then_with(|| a.entry_number.cmp(&b.entry_number))
                .then_with(|| a.line_number.cmp(&b.line_number))
        });

        let mut balance = Decimal::ZERO;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let rows = lines
            .into_iter()
            .map(|line| {
                balance += line.debit - line.credit;
                total_debit += line.debit;
                total_credit += line.credit;
                let description = Some(line.entry_description)
                    .filter(|d| !d.trim().is_empty())
                    .or(line.line_description)
                    .unwrap_or_default();
                GeneralLedgerRow {
                    entry_id: line.entry_id,
                    date: line.entry_date,
                    document_number: line.entry_number,
                    description,
                    debit: line.debit,
                    credit: line.credit,
                    balance,
                }
            })
            .collect();

        Ok(GeneralLedgerReport {
            report_type: "general_ledger".to_string(),
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            start_date: start,
            end_date: end,
            opening_balance,
            lines: rows,
            total_debit,
            total_credit,
            closing_balance: opening_balance + total_debit - total_credit,
        })
    }
}
