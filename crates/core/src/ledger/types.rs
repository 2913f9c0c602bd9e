//! Ledger domain types for journal posting.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{AccountId, JournalEntryId, TenantId, UserId, within_tolerance};

/// Origin of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalType {
    /// Manually keyed entry.
    General,
    /// Posted when an invoice is approved.
    Sales,
    /// Posted when a bill is approved.
    Purchase,
    /// Posted when a customer receipt is recorded.
    Receipt,
    /// Posted when a vendor payment is recorded.
    Payment,
    /// Offsets an earlier entry.
    Reversal,
}

impl JournalType {
    /// Returns the string representation of the journal type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::Receipt => "receipt",
            Self::Payment => "payment",
            Self::Reversal => "reversal",
        }
    }

    /// Parses a journal type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "general" => Some(Self::General),
            "sales" => Some(Self::Sales),
            "purchase" => Some(Self::Purchase),
            "receipt" => Some(Self::Receipt),
            "payment" => Some(Self::Payment),
            "reversal" => Some(Self::Reversal),
            _ => None,
        }
    }
}

impl fmt::Display for JournalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Journal entry status. Entries are only ever stored posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Committed to the ledger; immutable.
    Posted,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Posted => "posted",
        }
    }
}

/// A line of a journal entry to be posted.
///
/// Exactly one of `debit` and `credit` may be non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Line narration; the entry description is used when absent.
    pub description: Option<String>,
    /// Debit amount, zero if this is a credit line.
    pub debit: Decimal,
    /// Credit amount, zero if this is a debit line.
    pub credit: Decimal,
}

impl JournalLineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            description: Some(description.into()),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            description: Some(description.into()),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Input for posting a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Accounting date; also selects the numbering period.
    pub entry_date: NaiveDate,
    /// Origin of the entry.
    pub journal_type: JournalType,
    /// Source document number, if any.
    pub reference: Option<String>,
    /// Entry narration.
    pub description: String,
    /// Entry lines in order.
    pub lines: Vec<JournalLineInput>,
    /// Entry being reversed, for reversal entries.
    pub reverses_entry_id: Option<JournalEntryId>,
}

/// Account facts needed to validate a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Whether the account is active.
    pub is_active: bool,
    /// Whether the account is a header (grouping) account.
    pub is_header: bool,
}

/// A line that passed validation, rounded and numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedLine {
    /// 1-based position within the entry.
    pub line_number: i32,
    /// The account posted to.
    pub account_id: AccountId,
    /// Line narration, already defaulted.
    pub description: String,
    /// Debit amount (2 dp).
    pub debit: Decimal,
    /// Credit amount (2 dp).
    pub credit: Decimal,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Whether the totals agree within one cent.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates totals and computes the balance flag.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: within_tolerance(total_debit, total_credit),
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}

/// An entry ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedEntry {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Origin of the entry.
    pub journal_type: JournalType,
    /// Source document number, if any.
    pub reference: Option<String>,
    /// Entry narration.
    pub description: String,
    /// Entry being reversed, for reversal entries.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// Validated lines.
    pub lines: Vec<ValidatedLine>,
    /// Entry totals.
    pub totals: EntryTotals,
}

/// A posted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the entry.
    pub line_number: i32,
    /// The account posted to.
    pub account_id: AccountId,
    /// Line narration.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// A posted journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Formatted `JV-YYYYMM-NNNN` number.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Origin of the entry.
    pub journal_type: JournalType,
    /// Source document number, if any.
    pub reference: Option<String>,
    /// Entry narration.
    pub description: String,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Always posted.
    pub status: EntryStatus,
    /// Entry this one reverses, if any.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// User who posted the entry.
    pub created_by: UserId,
    /// When the entry was posted.
    pub created_at: DateTime<Utc>,
    /// Lines ordered by line number.
    pub lines: Vec<JournalLine>,
}
