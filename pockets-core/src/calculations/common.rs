//! Shared rounding and percentage helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pockets_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(7.804)), dec!(7.80));
/// assert_eq!(round_half_up(dec!(7.805)), dec!(7.81));
/// assert_eq!(round_half_up(dec!(-7.805)), dec!(-7.81));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, rounded to two places. Zero when `whole <= 0`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pockets_core::calculations::common::percent_of;
///
/// assert_eq!(percent_of(dec!(93600), dec!(1200000)), dec!(7.80));
/// assert_eq!(percent_of(dec!(10), dec!(0)), dec!(0));
/// ```
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up(part / whole * Decimal::ONE_HUNDRED)
}
