//! Posting rules for documents and payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::config::SystemAccountCodes;

use super::error::PostingError;
use crate::accounts::{Account, AccountType};
use crate::documents::{DocumentKind, TradeDocument};
use crate::ledger::{JournalLineInput, JournalType, PostingRequest};

/// Role a configured account plays in the posting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemAccountRole {
    /// Trade accounts receivable.
    AccountsReceivable,
    /// Sales or service revenue.
    SalesRevenue,
    /// Output VAT payable.
    VatOutput,
    /// Trade accounts payable.
    AccountsPayable,
    /// Purchases expense.
    Purchases,
    /// Input VAT receivable.
    VatInput,
}

impl SystemAccountRole {
    /// Every role.
    pub const ALL: [Self; 6] = [
        Self::AccountsReceivable,
        Self::SalesRevenue,
        Self::VatOutput,
        Self::AccountsPayable,
        Self::Purchases,
        Self::VatInput,
    ];

    /// Human-readable role name.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AccountsReceivable => "Accounts Receivable",
            Self::SalesRevenue => "Sales Revenue",
            Self::VatOutput => "VAT Output",
            Self::AccountsPayable => "Accounts Payable",
            Self::Purchases => "Purchases",
            Self::VatInput => "VAT Input",
        }
    }

    /// Configured account code for this role.
    #[must_use]
    pub fn code<'a>(&self, codes: &'a SystemAccountCodes) -> &'a str {
        match self {
            Self::AccountsReceivable => &codes.accounts_receivable,
            Self::SalesRevenue => &codes.sales_revenue,
            Self::VatOutput => &codes.vat_output,
            Self::AccountsPayable => &codes.accounts_payable,
            Self::Purchases => &codes.purchases,
            Self::VatInput => &codes.vat_input,
        }
    }
}

impl fmt::Display for SystemAccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Builds journal entry requests from business events.
///
/// Every rule resolves its system accounts through `resolve`, which looks an
/// account up by code in the caller's tenant. Rules never touch storage and
/// always return balanced requests.
pub struct PostingRules;

impl PostingRules {
    /// Codes of every configured system account, for batch lookup.
    #[must_use]
    pub fn system_codes(codes: &SystemAccountCodes) -> Vec<String> {
        SystemAccountRole::ALL
            .iter()
            .map(|role| role.code(codes).to_string())
            .collect()
    }

    /// Entry for an approved invoice.
    ///
    /// Dr Accounts Receivable (total) / Cr Sales (subtotal) / Cr VAT Output (VAT).
    ///
    /// # Errors
    ///
    /// Returns `MissingSystemAccount` if a required account cannot be posted to.
    pub fn invoice_approved<R>(
        invoice: &TradeDocument,
        customer_name: &str,
        codes: &SystemAccountCodes,
        resolve: R,
    ) -> Result<PostingRequest, PostingError>
    where
        R: Fn(&str) -> Option<Account>,
    {
        Self::ensure_kind(invoice, DocumentKind::Invoice)?;
        let number = &invoice.document_number;
        let has_vat = !invoice.vat_amount.is_zero();

        let receivable = Self::resolve_role(SystemAccountRole::AccountsReceivable, codes, &resolve)?;
        let sales = Self::resolve_role(SystemAccountRole::SalesRevenue, codes, &resolve)?;
        let vat_output = if has_vat {
            Some(Self::resolve_role(SystemAccountRole::VatOutput, codes, &resolve)?)
        } else {
            None
        };

        let mut lines = vec![
            JournalLineInput::debit(receivable.id, invoice.total_amount, format!("AR - {number}")),
            JournalLineInput::credit(sales.id, invoice.subtotal, format!("Sales - {number}")),
        ];
        if let Some(vat) = vat_output {
            lines.push(JournalLineInput::credit(
                vat.id,
                invoice.vat_amount,
                format!("VAT Output - {number}"),
            ));
        }

        Ok(PostingRequest {
            entry_date: invoice.document_date,
            journal_type: JournalType::Sales,
            reference: Some(number.clone()),
            description: format!("Invoice #{number} - {customer_name}"),
            lines,
            reverses_entry_id: None,
        })
    }

    /// Entry for an approved bill.
    ///
    /// Dr Purchases (subtotal) / Dr VAT Input (VAT) / Cr Accounts Payable (total).
    ///
    /// # Errors
    ///
    /// Returns `MissingSystemAccount` if a required account cannot be posted to.
    pub fn bill_approved<R>(
        bill: &TradeDocument,
        vendor_name: &str,
        codes: &SystemAccountCodes,
        resolve: R,
    ) -> Result<PostingRequest, PostingError>
    where
        R: Fn(&str) -> Option<Account>,
    {
        Self::ensure_kind(bill, DocumentKind::Bill)?;
        let number = &bill.document_number;
        let has_vat = !bill.vat_amount.is_zero();

        let purchases = Self::resolve_role(SystemAccountRole::Purchases, codes, &resolve)?;
        let vat_input = if has_vat {
            Some(Self::resolve_role(SystemAccountRole::VatInput, codes, &resolve)?)
        } else {
            None
        };
        let payable = Self::resolve_role(SystemAccountRole::AccountsPayable, codes, &resolve)?;

        let mut lines = vec![JournalLineInput::debit(
            purchases.id,
            bill.subtotal,
            format!("Purchase - {number}"),
        )];
        if let Some(vat) = vat_input {
            lines.push(JournalLineInput::debit(
                vat.id,
                bill.vat_amount,
                format!("VAT Input - {number}"),
            ));
        }
        lines.push(JournalLineInput::credit(
            payable.id,
            bill.total_amount,
            format!("AP - {number}"),
        ));

        Ok(PostingRequest {
            entry_date: bill.document_date,
            journal_type: JournalType::Purchase,
            reference: Some(number.clone()),
            description: format!("Bill #{number} - {vendor_name}"),
            lines,
            reverses_entry_id: None,
        })
    }

    /// Entry for money received against an invoice.
    ///
    /// Dr cash/bank / Cr Accounts Receivable, both for `amount`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCashAccount` or `MissingSystemAccount`.
    pub fn receipt_recorded<R>(
        invoice: &TradeDocument,
        receipt_number: &str,
        payment_date: NaiveDate,
        amount: Decimal,
        cash_account: &Account,
        codes: &SystemAccountCodes,
        resolve: R,
    ) -> Result<PostingRequest, PostingError>
    where
        R: Fn(&str) -> Option<Account>,
    {
        Self::ensure_kind(invoice, DocumentKind::Invoice)?;
        Self::ensure_cash_account(cash_account)?;
        let receivable = Self::resolve_role(SystemAccountRole::AccountsReceivable, codes, &resolve)?;
        let number = &invoice.document_number;

        Ok(PostingRequest {
            entry_date: payment_date,
            journal_type: JournalType::Receipt,
            reference: Some(receipt_number.to_string()),
            description: format!("Receipt for Invoice #{number}"),
            lines: vec![
                JournalLineInput::debit(cash_account.id, amount, format!("Receipt - {number}")),
                JournalLineInput::credit(receivable.id, amount, format!("AR - {number}")),
            ],
            reverses_entry_id: None,
        })
    }

    /// Entry for money paid against a bill.
    ///
    /// Dr Accounts Payable / Cr cash/bank, both for `amount`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCashAccount` or `MissingSystemAccount`.
    pub fn payment_recorded<R>(
        bill: &TradeDocument,
        voucher_number: &str,
        payment_date: NaiveDate,
        amount: Decimal,
        cash_account: &Account,
        codes: &SystemAccountCodes,
        resolve: R,
    ) -> Result<PostingRequest, PostingError>
    where
        R: Fn(&str) -> Option<Account>,
    {
        Self::ensure_kind(bill, DocumentKind::Bill)?;
        Self::ensure_cash_account(cash_account)?;
        let payable = Self::resolve_role(SystemAccountRole::AccountsPayable, codes, &resolve)?;
        let number = &bill.document_number;

        Ok(PostingRequest {
            entry_date: payment_date,
            journal_type: JournalType::Payment,
            reference: Some(voucher_number.to_string()),
            description: format!("Payment for Bill #{number}"),
            lines: vec![
                JournalLineInput::debit(payable.id, amount, format!("AP - {number}")),
                JournalLineInput::credit(cash_account.id, amount, format!("Payment - {number}")),
            ],
            reverses_entry_id: None,
        })
    }

    fn resolve_role<R>(
        role: SystemAccountRole,
        codes: &SystemAccountCodes,
        resolve: &R,
    ) -> Result<Account, PostingError>
    where
        R: Fn(&str) -> Option<Account>,
    {
        let code = role.code(codes);
        match resolve(code) {
            Some(account) if account.is_postable() => Ok(account),
            _ => Err(PostingError::MissingSystemAccount {
                role,
                code: code.to_string(),
            }),
        }
    }

    fn ensure_cash_account(account: &Account) -> Result<(), PostingError> {
        if account.is_postable() && account.account_type == AccountType::Asset {
            Ok(())
        } else {
            Err(PostingError::InvalidCashAccount(account.id))
        }
    }

    fn ensure_kind(document: &TradeDocument, expected: DocumentKind) -> Result<(), PostingError> {
        if document.kind == expected {
            Ok(())
        } else {
            Err(PostingError::DocumentKindMismatch { expected })
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared chart and document builders for posting tests.

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use tally_shared::config::SystemAccountCodes;
    use tally_shared::types::{AccountId, ContactId, DocumentId, TenantId, UserId};

    use crate::accounts::{Account, AccountType};
    use crate::documents::{DocumentKind, DocumentStatus, DocumentTotals, TradeDocument};

    pub fn account(code: &str, account_type: AccountType) -> Account {
        Account {
            id: AccountId::new(),
            tenant_id: TenantId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type,
            normal_balance: account_type.normal_balance(),
            level: 4,
            is_header: false,
            parent_id: None,
            is_active: true,
        }
    }

    /// The default system accounts plus a bank account under code 11120.
    pub fn chart() -> HashMap<String, Account> {
        let codes = SystemAccountCodes::default();
        [
            account(&codes.accounts_receivable, AccountType::Asset),
            account(&codes.sales_revenue, AccountType::Revenue),
            account(&codes.vat_output, AccountType::Liability),
            account(&codes.accounts_payable, AccountType::Liability),
            account(&codes.purchases, AccountType::Expense),
            account(&codes.vat_input, AccountType::Asset),
            account("11120", AccountType::Asset),
        ]
        .into_iter()
        .map(|a| (a.code.clone(), a))
        .collect()
    }

    pub fn document(kind: DocumentKind, number: &str, subtotal: Decimal) -> TradeDocument {
        let totals = DocumentTotals::from_subtotal(subtotal);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        TradeDocument {
            id: DocumentId::new(),
            tenant_id: TenantId::new(),
            kind,
            document_number: number.to_string(),
            document_date: date,
            due_date: date,
            counterparty_id: ContactId::new(),
            external_reference: None,
            notes: None,
            subtotal: totals.subtotal,
            vat_amount: totals.vat_amount,
            total_amount: totals.total_amount,
            paid_amount: Decimal::ZERO,
            status: DocumentStatus::Approved,
            journal_entry_id: None,
            created_by: UserId::new(),
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{account, chart, document};
    use super::*;
    use rust_decimal_macros::dec;

    fn codes() -> SystemAccountCodes {
        SystemAccountCodes::default()
    }

    #[test]
    fn test_invoice_approved_lines() {
        let chart = chart();
        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", dec!(1000));

        let req = PostingRules::invoice_approved(&invoice, "Acme", &codes(), |c| {
            chart.get(c).cloned()
        })
        .unwrap();

        assert_eq!(req.journal_type, JournalType::Sales);
        assert_eq!(req.description, "Invoice #INV-202401-0001 - Acme");
        assert_eq!(req.reference.as_deref(), Some("INV-202401-0001"));
        assert_eq!(req.lines.len(), 3);
        assert_eq!(req.lines[0].account_id, chart["11210"].id);
        assert_eq!(req.lines[0].debit, dec!(1070));
        assert_eq!(req.lines[1].account_id, chart["41200"].id);
        assert_eq!(req.lines[1].credit, dec!(1000));
        assert_eq!(req.lines[2].account_id, chart["21210"].id);
        assert_eq!(req.lines[2].credit, dec!(70));
        assert_eq!(
            req.lines[2].description.as_deref(),
            Some("VAT Output - INV-202401-0001")
        );
    }

    #[test]
    fn test_bill_approved_lines() {
        let chart = chart();
        let bill = document(DocumentKind::Bill, "BILL-202401-0003", dec!(500));

        let req =
            PostingRules::bill_approved(&bill, "Supplier", &codes(), |c| chart.get(c).cloned())
                .unwrap();

        assert_eq!(req.description, "Bill #BILL-202401-0003 - Supplier");
        assert_eq!(req.lines[0].debit, dec!(500));
        assert_eq!(req.lines[0].description.as_deref(), Some("Purchase - BILL-202401-0003"));
        assert_eq!(req.lines[1].account_id, chart["11410"].id);
        assert_eq!(req.lines[1].debit, dec!(35));
        assert_eq!(req.lines[2].account_id, chart["21110"].id);
        assert_eq!(req.lines[2].credit, dec!(535));
    }

    #[test]
    fn test_zero_vat_skips_vat_account() {
        let mut chart = chart();
        chart.remove("21210");
        let invoice = document(DocumentKind::Invoice, "INV-202401-0002", dec!(0.07));
        assert!(invoice.vat_amount.is_zero());

        let req = PostingRules::invoice_approved(&invoice, "Acme", &codes(), |c| {
            chart.get(c).cloned()
        })
        .unwrap();
        assert_eq!(req.lines.len(), 2);
    }

    #[test]
    fn test_missing_system_account() {
        let mut chart = chart();
        chart.remove("41200");
        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", dec!(1000));

        let err = PostingRules::invoice_approved(&invoice, "Acme", &codes(), |c| {
            chart.get(c).cloned()
        })
        .unwrap_err();

        assert!(matches!(
            err,
            PostingError::MissingSystemAccount { role: SystemAccountRole::SalesRevenue, ref code }
                if code == "41200"
        ));
    }

    #[test]
    fn test_inactive_or_header_system_account_is_missing() {
        let bill = document(DocumentKind::Bill, "BILL-202401-0001", dec!(100));

        let mut inactive = chart();
        inactive.get_mut("21110").unwrap().is_active = false;
        let err = PostingRules::bill_approved(&bill, "V", &codes(), |c| inactive.get(c).cloned())
            .unwrap_err();
        assert!(err.is_configuration());

        let mut header = chart();
        header.get_mut("51200").unwrap().is_header = true;
        let err = PostingRules::bill_approved(&bill, "V", &codes(), |c| header.get(c).cloned())
            .unwrap_err();
        assert!(matches!(
            err,
            PostingError::MissingSystemAccount {
                role: SystemAccountRole::Purchases,
                ..
            }
        ));
    }

    #[test]
    fn test_receipt_and_payment_lines() {
        let chart = chart();
        let bank = &chart["11120"];
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", dec!(1000));

        let receipt = PostingRules::receipt_recorded(
            &invoice,
            "RCT-202402-0001",
            date,
            dec!(1070),
            bank,
            &codes(),
            |c| chart.get(c).cloned(),
        )
        .unwrap();
        assert_eq!(receipt.description, "Receipt for Invoice #INV-202401-0001");
        assert_eq!(receipt.reference.as_deref(), Some("RCT-202402-0001"));
        assert_eq!(receipt.lines[0].account_id, bank.id);
        assert_eq!(receipt.lines[0].debit, dec!(1070));
        assert_eq!(receipt.lines[1].account_id, chart["11210"].id);
        assert_eq!(receipt.lines[1].credit, dec!(1070));
        assert_eq!(receipt.lines[0].description.as_deref(), Some("Receipt - INV-202401-0001"));
        assert_eq!(receipt.lines[1].description.as_deref(), Some("AR - INV-202401-0001"));

        let bill = document(DocumentKind::Bill, "BILL-202401-0001", dec!(100));
        let payment = PostingRules::payment_recorded(
            &bill,
            "PV-202402-0001",
            date,
            dec!(107),
            bank,
            &codes(),
            |c| chart.get(c).cloned(),
        )
        .unwrap();
        assert_eq!(payment.description, "Payment for Bill #BILL-202401-0001");
        assert_eq!(payment.lines[0].account_id, chart["21110"].id);
        assert_eq!(payment.lines[1].account_id, bank.id);
        assert_eq!(payment.lines[1].credit, dec!(107));
        assert_eq!(payment.lines[0].description.as_deref(), Some("AP - BILL-202401-0001"));
        assert_eq!(payment.lines[1].description.as_deref(), Some("Payment - BILL-202401-0001"));
    }

    #[test]
    fn test_invalid_cash_account() {
        let chart = chart();
        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", dec!(1000));
        let revenue = account("41100", AccountType::Revenue);

        let err = PostingRules::receipt_recorded(
            &invoice,
            "RCT-202401-0001",
            invoice.document_date,
            dec!(10),
            &revenue,
            &codes(),
            |c| chart.get(c).cloned(),
        )
        .unwrap_err();
        assert!(matches!(err, PostingError::InvalidCashAccount(id) if id == revenue.id));
    }

    #[test]
    fn test_rule_rejects_wrong_kind() {
        let chart = chart();
        let bill = document(DocumentKind::Bill, "BILL-202401-0001", dec!(100));
        let err = PostingRules::invoice_approved(&bill, "X", &codes(), |c| chart.get(c).cloned())
            .unwrap_err();
        assert!(matches!(
            err,
            PostingError::DocumentKindMismatch {
                expected: DocumentKind::Invoice
            }
        ));
    }

    #[test]
    fn test_system_codes() {
        let all = PostingRules::system_codes(&codes());
        assert_eq!(all.len(), 6);
        assert!(all.contains(&"11410".to_string()));
    }
}
