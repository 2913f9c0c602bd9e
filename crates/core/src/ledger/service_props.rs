//! Property-based tests for LedgerService.
//!
//! - Property 1: Balance Integrity
//! - Property 2: Reversal Neutrality
//! - Property 3: Side Exclusivity

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tally_shared::types::{AccountId, JournalEntryId, TenantId, UserId};

use super::error::LedgerError;
use super::service::LedgerService;
use super::types::{
    AccountInfo, EntryStatus, JournalEntry, JournalLine, JournalLineInput, JournalType,
    PostingRequest,
};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a list of amounts for one side of an entry.
fn amounts() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(positive_amount(), 1..6)
}

/// Helper to create a posting request.
fn make_request(lines: Vec<JournalLineInput>) -> PostingRequest {
    PostingRequest {
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        journal_type: JournalType::General,
        reference: None,
        description: "Property entry".to_string(),
        lines,
        reverses_entry_id: None,
    }
}

/// Mock account lookup where every account is postable.
fn ok_lookup(id: AccountId) -> Option<AccountInfo> {
    Some(AccountInfo {
        id,
        is_active: true,
        is_header: false,
    })
}

/// Debit lines for `debits` plus one balancing credit line.
fn balanced_lines(debits: &[Decimal]) -> Vec<JournalLineInput> {
    let total: Decimal = debits.iter().copied().sum();
    let mut lines: Vec<_> = debits
        .iter()
        .map(|amount| JournalLineInput::debit(AccountId::new(), *amount, "debit"))
        .collect();
    lines.push(JournalLineInput::credit(AccountId::new(), total, "credit"));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Balance Integrity
    // =========================================================================

    /// Property 1.1: Balanced entries are accepted and totals match the lines.
    #[test]
    fn prop_balanced_entries_accepted(debits in amounts()) {
        let request = make_request(balanced_lines(&debits));
        let entry = LedgerService::validate(&request, ok_lookup);

        prop_assert!(entry.is_ok());
        let entry = entry.unwrap();
        let expected: Decimal = debits.iter().copied().sum();
        prop_assert_eq!(entry.totals.total_debit, expected);
        prop_assert_eq!(entry.totals.total_credit, expected);
        prop_assert_eq!(entry.lines.len(), debits.len() + 1);
    }

    /// Property 1.2: Any difference above one cent is rejected.
    #[test]
    fn prop_unbalanced_entries_rejected(
        debits in amounts(),
        skew_cents in 2i64..100_000i64,
    ) {
        let mut lines = balanced_lines(&debits);
        let last = lines.len() - 1;
        lines[last].credit += Decimal::new(skew_cents, 2);

        let result = LedgerService::validate(&make_request(lines), ok_lookup);
        let is_unbalanced = matches!(result, Err(LedgerError::Unbalanced { .. }));
        prop_assert!(is_unbalanced);
    }

    /// Property 1.3: Line numbers are consecutive from 1.
    #[test]
    fn prop_line_numbers_consecutive(debits in amounts()) {
        let entry = LedgerService::validate(&make_request(balanced_lines(&debits)), ok_lookup).unwrap();
        for (index, line) in entry.lines.iter().enumerate() {
            prop_assert_eq!(line.line_number, i32::try_from(index + 1).unwrap());
        }
    }

    // =========================================================================
    // Property 2: Reversal Neutrality
    // =========================================================================

    /// Property 2.1: Original plus reversal nets every account to zero.
    #[test]
    fn prop_reversal_nets_to_zero(debits in amounts()) {
        let request = make_request(balanced_lines(&debits));
        let validated = LedgerService::validate(&request, ok_lookup).unwrap();
        let original = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: TenantId::new(),
            entry_number: "JV-202601-0001".to_string(),
            entry_date: validated.entry_date,
            journal_type: validated.journal_type,
            reference: None,
            description: validated.description.clone(),
            total_debit: validated.totals.total_debit,
            total_credit: validated.totals.total_credit,
            status: EntryStatus::Posted,
            reverses_entry_id: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
            lines: validated
                .lines
                .iter()
                .map(|l| JournalLine {
                    line_number: l.line_number,
                    account_id: l.account_id,
                    description: l.description.clone(),
                    debit: l.debit,
                    credit: l.credit,
                })
                .collect(),
        };

        let reversal = LedgerService::reversal_request(&original, validated.entry_date, None);
        let reversal = LedgerService::validate(&reversal, ok_lookup).unwrap();

        let mut net: HashMap<AccountId, Decimal> = HashMap::new();
        for line in validated.lines.iter().chain(reversal.lines.iter()) {
            *net.entry(line.account_id).or_default() += line.debit - line.credit;
        }
        prop_assert!(net.values().all(Decimal::is_zero));
    }

    // =========================================================================
    // Property 3: Side Exclusivity
    // =========================================================================

    /// Property 3.1: A line with both a debit and a credit is always rejected.
    #[test]
    fn prop_both_sides_rejected(debit in positive_amount(), credit in positive_amount()) {
        let line = JournalLineInput {
            account_id: AccountId::new(),
            description: None,
            debit,
            credit,
        };
        let result = LedgerService::validate(&make_request(vec![line]), ok_lookup);
        let is_both_sides = matches!(result, Err(LedgerError::BothSides { line: 1 }));
        prop_assert!(is_both_sides);
    }
}
