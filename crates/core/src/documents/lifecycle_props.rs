//! Property-based tests for document pricing and payments.
//!
//! - Property 1: VAT Arithmetic
//! - Property 2: Payment Conservation

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::VAT_RATE;

use super::error::DocumentError;
use super::lifecycle::DocumentLifecycle;
use super::types::{DocumentItemInput, DocumentStatus, DocumentTotals};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate quantities with up to four decimals.
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: VAT Arithmetic
    // =========================================================================

    /// Property 1.1: total = subtotal + VAT, VAT within half a cent of 7%.
    #[test]
    fn prop_vat_totals(subtotal in positive_amount()) {
        let totals = DocumentTotals::from_subtotal(subtotal);

        prop_assert_eq!(totals.total_amount, totals.subtotal + totals.vat_amount);
        prop_assert!((totals.vat_amount - subtotal * VAT_RATE).abs() <= Decimal::new(5, 3));
        prop_assert_eq!(totals.vat_amount.scale(), 2);
    }

    /// Property 1.2: Subtotal is the sum of rounded item amounts.
    #[test]
    fn prop_subtotal_sums_items(
        items in prop::collection::vec((quantity(), positive_amount()), 1..8)
    ) {
        let inputs: Vec<_> = items
            .iter()
            .map(|(q, p)| DocumentItemInput::new("item", *q, *p))
            .collect();
        let priced = DocumentLifecycle::price_items(&inputs).unwrap();

        let sum: Decimal = priced.items.iter().map(|i| i.amount).sum();
        prop_assert_eq!(priced.totals.subtotal, sum);
        for item in &priced.items {
            prop_assert!(item.amount.scale() <= 2);
        }
    }

    // =========================================================================
    // Property 2: Payment Conservation
    // =========================================================================

    /// Property 2.1: Splitting the total into payments ends exactly at Paid,
    /// and no further payment is accepted.
    #[test]
    fn prop_payments_sum_to_total(
        subtotal in positive_amount(),
        splits in prop::collection::vec(1u32..100u32, 1..5),
    ) {
        let total = DocumentTotals::from_subtotal(subtotal).total_amount;
        let weight: u32 = splits.iter().sum();

        let mut status = DocumentStatus::Approved;
        let mut paid = Decimal::ZERO;
        for (index, share) in splits.iter().enumerate() {
            let outstanding = total - paid;
            let amount = if index + 1 == splits.len() {
                outstanding
            } else {
                (total * Decimal::from(*share) / Decimal::from(weight))
                    .round_dp(2)
                    .min(outstanding)
            };
            if amount <= Decimal::ZERO {
                continue;
            }
            let applied = DocumentLifecycle::apply_payment(status, total, paid, amount).unwrap();
            prop_assert!(applied.new_paid <= total);
            paid = applied.new_paid;
            status = applied.new_status;
        }

        prop_assert_eq!(paid, total);
        prop_assert_eq!(status, DocumentStatus::Paid);

        let extra = DocumentLifecycle::apply_payment(status, total, paid, Decimal::new(1, 2));
        let rejected = matches!(extra, Err(DocumentError::InvalidTransition { .. }));
        prop_assert!(rejected);
    }

    /// Property 2.2: Paying more than the outstanding amount never succeeds.
    #[test]
    fn prop_overpayment_rejected(
        subtotal in positive_amount(),
        excess in positive_amount(),
    ) {
        let total = DocumentTotals::from_subtotal(subtotal).total_amount;
        let result = DocumentLifecycle::apply_payment(
            DocumentStatus::Approved,
            total,
            Decimal::ZERO,
            total + excess,
        );
        let rejected = matches!(result, Err(DocumentError::Overpayment { .. }));
        prop_assert!(rejected);
    }
}
