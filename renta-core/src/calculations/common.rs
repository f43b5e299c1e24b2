//! Shared arithmetic helpers.
//!
//! The calculator itself never rounds. [`round_half_up`] is for the code
//! that displays or exports results.

use rust_decimal::Decimal;

/// Rounds to two decimal places, midpoint away from zero (céntimos).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use renta_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1916.004)), dec!(1916.00));
/// assert_eq!(round_half_up(dec!(1916.005)), dec!(1916.01));
/// assert_eq!(round_half_up(dec!(-2384.125)), dec!(-2384.13));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two amounts.
///
/// ```
/// use rust_decimal_macros::dec;
/// use renta_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-120.50), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
