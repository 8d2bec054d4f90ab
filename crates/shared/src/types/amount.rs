//! Decimal amount helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All monetary amounts are `rust_decimal::Decimal` values in Burundian
//! francs (FBU), stored with two fraction digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fraction digits stored for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to the stored money scale, half away from zero.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if the amount is a positive, finite money value.
#[must_use]
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount.scale() <= 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(4583.3333), dec!(4583.33))]
    #[case(dec!(4583.335), dec!(4583.34))]
    #[case(dec!(100), dec!(100))]
    fn test_round_amount(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_amount(input), expected);
    }

    #[rstest]
    #[case(dec!(100), true)]
    #[case(dec!(0.01), true)]
    #[case(dec!(0), false)]
    #[case(dec!(-5), false)]
    #[case(dec!(1.000001), false)]
    fn test_is_valid_amount(#[case] amount: Decimal, #[case] valid: bool) {
        assert_eq!(is_valid_amount(amount), valid);
    }
}
