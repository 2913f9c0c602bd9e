//! Money arithmetic helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` stored with two fractional digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest debit/credit difference still treated as balanced (0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Fixed VAT rate applied to document subtotals (7%).
pub const VAT_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// Exclusive upper bound on any stored amount (10^16, the range of
/// `NUMERIC(18,2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_874_919_424, 2_328_306, 0, false, 0);

/// Rounds an amount to two places, midpoint away from zero.
///
/// `round(1.005) == 1.01`, `round(-1.005) == -1.01`.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if two amounts differ by no more than [`MONEY_TOLERANCE`].
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONEY_TOLERANCE
}

/// Returns true if the amount fits a stored money column.
#[must_use]
pub fn is_storable(amount: Decimal) -> bool {
    amount.abs() < MAX_AMOUNT
}

/// Sums amounts, returning `None` on overflow or when the result does not
/// fit a stored money column.
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .filter(|total| is_storable(*total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constants() {
        assert_eq!(MONEY_TOLERANCE, dec!(0.01));
        assert_eq!(VAT_RATE, dec!(0.07));
        assert_eq!(MAX_AMOUNT, Decimal::from(10_u64.pow(16)));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([dec!(1.50), dec!(2.25)]), Some(dec!(3.75)));
        assert_eq!(checked_sum([]), Some(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX, Decimal::MAX]), None);
        assert_eq!(checked_sum([MAX_AMOUNT - dec!(0.01), dec!(0.01)]), None);
        assert!(is_storable(MAX_AMOUNT - dec!(0.01)));
        assert!(!is_storable(-MAX_AMOUNT));
    }

    #[rstest]
    #[case(dec!(1.005), dec!(1.01))]
    #[case(dec!(1.004), dec!(1.00))]
    #[case(dec!(-1.005), dec!(-1.01))]
    #[case(dec!(66.6667), dec!(66.67))]
    #[case(dec!(70), dec!(70))]
    fn test_round_money(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn test_within_tolerance() {
        assert!(within_tolerance(dec!(100.00), dec!(100.01)));
        assert!(within_tolerance(dec!(100.01), dec!(100.00)));
        assert!(!within_tolerance(dec!(100.00), dec!(100.02)));
    }
}
