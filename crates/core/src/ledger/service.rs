//! Ledger service for journal entry validation and reversal.
//!
//! This module provides the core business logic for validating journal
//! entries before they are persisted to the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, checked_sum, is_storable, round_money};

use super::error::LedgerError;
use super::types::{
    AccountInfo, EntryTotals, JournalEntry, JournalLineInput, JournalType, PostingRequest,
    ValidatedEntry, ValidatedLine,
};

/// Ledger service for journal entry validation.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validate a posting request before persisting.
    ///
    /// Checks run in this order, first failure wins:
    /// 1. At least one line
    /// 2. Each line: no negative or out-of-range amount, not both sides
    ///    (amounts rounded to 2 dp)
    /// 3. Totals fit a stored amount
    /// 4. Debit total equals credit total within 0.01
    /// 5. Totals are non-zero
    /// 6. Each account exists, is active and is not a header
    ///
    /// # Arguments
    ///
    /// * `request` - The entry to validate
    /// * `account_lookup` - Returns account facts for an ID in the caller's tenant
    ///
    /// # Returns
    ///
    /// The numbered, rounded lines and entry totals.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if validation fails.
    pub fn validate<A>(
        request: &PostingRequest,
        account_lookup: A,
    ) -> Result<ValidatedEntry, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if request.lines.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for (index, line) in request.lines.iter().enumerate() {
            lines.push(Self::validate_line(index + 1, line, &request.description)?);
        }

        let totals = Self::calculate_totals(&lines)?;
        if !totals.is_balanced {
            return Err(LedgerError::Unbalanced {
                debit: totals.total_debit,
                credit: totals.total_credit,
            });
        }
        if totals.total_debit.is_zero() && totals.total_credit.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        for line in &lines {
            Self::validate_account(line.account_id, &account_lookup)?;
        }

        Ok(ValidatedEntry {
            entry_date: request.entry_date,
            journal_type: request.journal_type,
            reference: request.reference.clone(),
            description: request.description.clone(),
            reverses_entry_id: request.reverses_entry_id,
            lines,
            totals,
        })
    }

    fn validate_line(
        line_number: usize,
        line: &JournalLineInput,
        entry_description: &str,
    ) -> Result<ValidatedLine, LedgerError> {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line: line_number });
        }

        let debit = round_money(line.debit);
        let credit = round_money(line.credit);
        if !is_storable(debit) || !is_storable(credit) {
            return Err(LedgerError::AmountOutOfRange { line: line_number });
        }
        if !debit.is_zero() && !credit.is_zero() {
            return Err(LedgerError::BothSides { line: line_number });
        }

        let description = line
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(entry_description)
            .to_string();

        Ok(ValidatedLine {
            line_number: i32::try_from(line_number).unwrap_or(i32::MAX),
            account_id: line.account_id,
            description,
            debit,
            credit,
        })
    }

    fn validate_account<A>(account_id: AccountId, account_lookup: &A) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let info = account_lookup(account_id).ok_or(LedgerError::AccountNotFound(account_id))?;
        if !info.is_active {
            return Err(LedgerError::AccountInactive(account_id));
        }
        if info.is_header {
            return Err(LedgerError::HeaderAccount(account_id));
        }
        Ok(())
    }

    /// Calculate entry totals from validated lines.
    ///
    /// # Errors
    ///
    /// Returns `TotalOutOfRange` if either total does not fit a stored amount.
    pub fn calculate_totals(lines: &[ValidatedLine]) -> Result<EntryTotals, LedgerError> {
        let total_debit =
            checked_sum(lines.iter().map(|l| l.debit)).ok_or(LedgerError::TotalOutOfRange)?;
        let total_credit =
            checked_sum(lines.iter().map(|l| l.credit)).ok_or(LedgerError::TotalOutOfRange)?;
        Ok(EntryTotals::new(total_debit, total_credit))
    }

    /// Build the request that reverses a posted entry.
    ///
    /// Every line keeps its account and amount with debit and credit swapped,
    /// so posting the result nets each account back to zero.
    #[must_use]
    pub fn reversal_request(
        original: &JournalEntry,
        reversal_date: NaiveDate,
        reason: Option<&str>,
    ) -> PostingRequest {
        let description = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Reversal of {}: {reason}", original.entry_number),
            None => format!("Reversal of {}", original.entry_number),
        };

        let lines = original
            .lines
            .iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                description: Some(format!("Reversal: {}", line.description)),
                debit: line.credit,
                credit: line.debit,
            })
            .collect();

        PostingRequest {
            entry_date: reversal_date,
            journal_type: JournalType::Reversal,
            reference: Some(original.entry_number.clone()),
            description,
            lines,
            reverses_entry_id: Some(original.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{EntryStatus, JournalLine};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tally_shared::types::{JournalEntryId, TenantId, UserId};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn request(lines: Vec<JournalLineInput>) -> PostingRequest {
        PostingRequest {
            entry_date: date(),
            journal_type: JournalType::General,
            reference: None,
            description: "Owner investment".to_string(),
            lines,
            reverses_entry_id: None,
        }
    }

    fn active(id: AccountId) -> Option<AccountInfo> {
        Some(AccountInfo {
            id,
            is_active: true,
            is_header: false,
        })
    }

    #[test]
    fn test_valid_entry() {
        let cash = AccountId::new();
        let capital = AccountId::new();
        let req = request(vec![
            JournalLineInput::debit(cash, dec!(1000), "Cash in"),
            JournalLineInput {
                account_id: capital,
                description: None,
                debit: Decimal::ZERO,
                credit: dec!(1000),
            },
        ]);

        let entry = LedgerService::validate(&req, active).unwrap();

        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.lines[0].line_number, 1);
        assert_eq!(entry.lines[1].line_number, 2);
        assert_eq!(entry.lines[1].description, "Owner investment");
        assert_eq!(entry.totals.total_debit, dec!(1000));
        assert!(entry.totals.is_balanced);
    }

    #[test]
    fn test_empty_entry() {
        let err = LedgerService::validate(&request(vec![]), active).unwrap_err();
        assert!(matches!(err, LedgerError::EmptyEntry));
    }

    #[test]
    fn test_negative_amount() {
        let a = AccountId::new();
        let req = request(vec![
            JournalLineInput::debit(a, dec!(-5), "x"),
            JournalLineInput::credit(a, dec!(-5), "y"),
        ]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(err, LedgerError::NegativeAmount { line: 1 }));
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let a = AccountId::new();
        let req = request(vec![
            JournalLineInput::debit(a, Decimal::MAX, "x"),
            JournalLineInput::debit(a, Decimal::MAX, "y"),
        ]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOutOfRange { line: 1 }));
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_oversized_total_is_rejected() {
        let a = AccountId::new();
        let half = Decimal::from(6_000_000_000_000_000_u64);
        let req = request(vec![
            JournalLineInput::debit(a, half, "x"),
            JournalLineInput::debit(a, half, "y"),
            JournalLineInput::credit(a, half, "z"),
        ]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(err, LedgerError::TotalOutOfRange));
    }

    #[test]
    fn test_both_sides() {
        let a = AccountId::new();
        let req = request(vec![JournalLineInput {
            account_id: a,
            description: None,
            debit: dec!(10),
            credit: dec!(10),
        }]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(err, LedgerError::BothSides { line: 1 }));
    }

    #[test]
    fn test_unbalanced_beyond_tolerance() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), dec!(100.00), "a"),
            JournalLineInput::credit(AccountId::new(), dec!(99.98), "b"),
        ]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Unbalanced { debit, credit } if debit == dec!(100.00) && credit == dec!(99.98)
        ));
    }

    #[test]
    fn test_one_cent_difference_is_accepted() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), dec!(100.00), "a"),
            JournalLineInput::credit(AccountId::new(), dec!(99.99), "b"),
        ]);
        assert!(LedgerService::validate(&req, active).is_ok());
    }

    #[test]
    fn test_amounts_rounded_before_summing() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), dec!(10.005), "a"),
            JournalLineInput::credit(AccountId::new(), dec!(10.01), "b"),
        ]);
        let entry = LedgerService::validate(&req, active).unwrap();
        assert_eq!(entry.lines[0].debit, dec!(10.01));
        assert_eq!(entry.totals.difference(), Decimal::ZERO);
    }

    #[test]
    fn test_zero_amount() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), Decimal::ZERO, "a"),
            JournalLineInput::credit(AccountId::new(), Decimal::ZERO, "b"),
        ]);
        let err = LedgerService::validate(&req, active).unwrap_err();
        assert!(matches!(err, LedgerError::ZeroAmount));
    }

    #[test]
    fn test_zero_line_in_non_zero_entry_is_allowed() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), dec!(50), "a"),
            JournalLineInput::credit(AccountId::new(), Decimal::ZERO, "memo"),
            JournalLineInput::credit(AccountId::new(), dec!(50), "b"),
        ]);
        assert!(LedgerService::validate(&req, active).is_ok());
    }

    #[test]
    fn test_account_checks() {
        let missing = AccountId::new();
        let inactive = AccountId::new();
        let header = AccountId::new();
        let ok = AccountId::new();
        let accounts: HashMap<AccountId, AccountInfo> = [
            AccountInfo { id: inactive, is_active: false, is_header: false },
            AccountInfo { id: header, is_active: true, is_header: true },
            AccountInfo { id: ok, is_active: true, is_header: false },
        ]
        .into_iter()
        .map(|info| (info.id, info))
        .collect();
        let lookup = |id: AccountId| accounts.get(&id).copied();

        for (bad, check) in [
            (missing, "ACCOUNT_NOT_FOUND"),
            (inactive, "ACCOUNT_INACTIVE"),
            (header, "HEADER_ACCOUNT"),
        ] {
            let req = request(vec![
                JournalLineInput::debit(ok, dec!(10), "a"),
                JournalLineInput::credit(bad, dec!(10), "b"),
            ]);
            let err = LedgerService::validate(&req, lookup).unwrap_err();
            assert_eq!(err.error_code(), check);
        }
    }

    #[test]
    fn test_unbalanced_reported_before_account_errors() {
        let req = request(vec![
            JournalLineInput::debit(AccountId::new(), dec!(10), "a"),
            JournalLineInput::credit(AccountId::new(), dec!(5), "b"),
        ]);
        let err = LedgerService::validate(&req, |_| None).unwrap_err();
        assert!(matches!(err, LedgerError::Unbalanced { .. }));
    }

    #[test]
    fn test_reversal_request_swaps_sides() {
        let cash = AccountId::new();
        let sales = AccountId::new();
        let original = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: TenantId::new(),
            entry_number: "JV-202401-0001".to_string(),
            entry_date: date(),
            journal_type: JournalType::Sales,
            reference: Some("INV-202401-0001".to_string()),
            description: "Invoice".to_string(),
            total_debit: dec!(107),
            total_credit: dec!(107),
            status: EntryStatus::Posted,
            reverses_entry_id: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
            lines: vec![
                JournalLine {
                    line_number: 1,
                    account_id: cash,
                    description: "AR".to_string(),
                    debit: dec!(107),
                    credit: Decimal::ZERO,
                },
                JournalLine {
                    line_number: 2,
                    account_id: sales,
                    description: "Sales".to_string(),
                    debit: Decimal::ZERO,
                    credit: dec!(107),
                },
            ],
        };

        let reversal_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let req = LedgerService::reversal_request(&original, reversal_date, Some("voided"));

        assert_eq!(req.journal_type, JournalType::Reversal);
        assert_eq!(req.reverses_entry_id, Some(original.id));
        assert_eq!(req.entry_date, reversal_date);
        assert_eq!(req.description, "Reversal of JV-202401-0001: voided");
        assert_eq!(req.lines[0].credit, dec!(107));
        assert_eq!(req.lines[0].debit, Decimal::ZERO);
        assert_eq!(req.lines[1].debit, dec!(107));
        assert_eq!(req.lines[0].description.as_deref(), Some("Reversal: AR"));

        let validated = LedgerService::validate(&req, active).unwrap();
        assert!(validated.totals.is_balanced);
    }
}
