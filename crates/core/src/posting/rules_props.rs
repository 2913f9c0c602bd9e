//! Property-based tests for posting rules.
//!
//! - Property 1: Every rule produces a balanced entry the ledger accepts
//! - Property 2: Document postings carry the document totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::config::SystemAccountCodes;

use super::rules::PostingRules;
use super::rules::fixtures::{chart, document};
use crate::documents::DocumentKind;
use crate::ledger::{AccountInfo, LedgerService};

/// Strategy to generate positive decimal amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn postable(id: tally_shared::types::AccountId) -> Option<AccountInfo> {
    Some(AccountInfo {
        id,
        is_active: true,
        is_header: false,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Balanced Postings
    // =========================================================================

    /// Property 1.1: Invoice and bill approvals balance.
    #[test]
    fn prop_document_postings_balance(subtotal in positive_amount()) {
        let chart = chart();
        let codes = SystemAccountCodes::default();
        let lookup = |c: &str| chart.get(c).cloned();

        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", subtotal);
        let req = PostingRules::invoice_approved(&invoice, "Customer", &codes, lookup).unwrap();
        let entry = LedgerService::validate(&req, postable).unwrap();
        prop_assert_eq!(entry.totals.total_debit, entry.totals.total_credit);
        prop_assert_eq!(entry.totals.total_debit, invoice.total_amount);

        let bill = document(DocumentKind::Bill, "BILL-202401-0001", subtotal);
        let req = PostingRules::bill_approved(&bill, "Vendor", &codes, lookup).unwrap();
        let entry = LedgerService::validate(&req, postable).unwrap();
        prop_assert_eq!(entry.totals.total_debit, entry.totals.total_credit);
        prop_assert_eq!(entry.totals.total_credit, bill.total_amount);
    }

    /// Property 1.2: Receipts and payments balance for any amount.
    #[test]
    fn prop_payment_postings_balance(amount in positive_amount()) {
        let chart = chart();
        let codes = SystemAccountCodes::default();
        let bank = chart["11120"].clone();
        let lookup = |c: &str| chart.get(c).cloned();

        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", amount);
        let req = PostingRules::receipt_recorded(
            &invoice, "RCT-202401-0001", invoice.document_date, amount, &bank, &codes, lookup,
        ).unwrap();
        let entry = LedgerService::validate(&req, postable).unwrap();
        prop_assert_eq!(entry.totals.total_debit, amount);
        prop_assert!(entry.totals.is_balanced);

        let bill = document(DocumentKind::Bill, "BILL-202401-0001", amount);
        let req = PostingRules::payment_recorded(
            &bill, "PV-202401-0001", bill.document_date, amount, &bank, &codes, lookup,
        ).unwrap();
        let entry = LedgerService::validate(&req, postable).unwrap();
        prop_assert_eq!(entry.totals.total_credit, amount);
        prop_assert!(entry.totals.is_balanced);
    }

    // =========================================================================
    // Property 2: Document Totals
    // =========================================================================

    /// Property 2.1: The AR debit equals subtotal plus VAT.
    #[test]
    fn prop_invoice_receivable_is_total(subtotal in positive_amount()) {
        let chart = chart();
        let codes = SystemAccountCodes::default();
        let invoice = document(DocumentKind::Invoice, "INV-202401-0001", subtotal);

        let req = PostingRules::invoice_approved(&invoice, "C", &codes, |c| chart.get(c).cloned()).unwrap();

        prop_assert_eq!(req.lines[0].debit, invoice.subtotal + invoice.vat_amount);
        let credits: Decimal = req.lines.iter().map(|l| l.credit).sum();
        prop_assert_eq!(credits, invoice.total_amount);
    }
}
