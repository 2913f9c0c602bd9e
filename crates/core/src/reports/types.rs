//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId};

use crate::accounts::AccountType;

/// Gross debit and credit posted to one account, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
}

/// One trial balance row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// `max(debit - credit, 0)`.
    pub net_debit: Decimal,
    /// `max(credit - debit, 0)`.
    pub net_credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Report type identifier.
    pub report_type: String,
    /// As of date (inclusive).
    pub as_of: NaiveDate,
    /// Accounts with a non-zero net balance, ordered by code.
    pub accounts: Vec<TrialBalanceRow>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Sum of net debits.
    pub total_debit: Decimal,
    /// Sum of net credits.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// A posted line on one account, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Journal entry ID.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry number.
    pub entry_number: String,
    /// Line number within the entry.
    pub line_number: i32,
    /// Line description, if any.
    pub line_description: Option<String>,
    /// Entry description.
    pub entry_description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// General ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerRow {
    /// Journal entry ID.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub date: NaiveDate,
    /// Entry number.
    pub document_number: String,
    /// Entry description, falling back to the line description.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Movement since the start of the range (`Σ debit - credit`).
    pub balance: Decimal,
}

/// General ledger report for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralLedgerReport {
    /// Report type identifier.
    pub report_type: String,
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Range start (inclusive).
    pub start_date: NaiveDate,
    /// Range end (inclusive).
    pub end_date: NaiveDate,
    /// `Σ debit - credit` before `start_date`.
    pub opening_balance: Decimal,
    /// Rows ordered by date, entry number, line number.
    pub lines: Vec<GeneralLedgerRow>,
    /// Sum of row debits.
    pub total_debit: Decimal,
    /// Sum of row credits.
    pub total_credit: Decimal,
    /// Opening balance plus the range movement.
    pub closing_balance: Decimal,
}
