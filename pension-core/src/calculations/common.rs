//! Rounding and percentage helpers shared by the calculation stages.
//!
//! Calculations carry full precision; these helpers are only applied when a
//! value leaves the engine.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, as is customary for
/// euro amounts.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use pension_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(874.704)), dec!(874.70));
/// assert_eq!(round_half_up(dec!(874.705)), dec!(874.71));
/// assert_eq!(round_half_up(dec!(-874.705)), dec!(-874.71)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a percentage to one decimal place for display.
pub fn round_percentage_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies `percentage` (0–100 scale) to `amount` without rounding.
pub fn apply_percentage(
    amount: Decimal,
    percentage: Decimal,
) -> Decimal {
    amount * percentage / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        let result = round_half_up(dec!(123.454));

        assert_eq!(result, dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        let result = round_half_up(dec!(123.455));

        assert_eq!(result, dec!(123.46));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        let result = round_half_up(dec!(-123.455));

        assert_eq!(result, dec!(-123.46));
    }

    #[test]
    fn round_half_up_preserves_already_rounded_values() {
        let result = round_half_up(dec!(802.30));

        assert_eq!(result, dec!(802.30));
    }

    #[test]
    fn round_half_up_handles_repeating_fractions() {
        let result = round_half_up(dec!(1500) * dec!(2) / dec!(3));

        assert_eq!(result, dec!(1000.00));
    }

    // =========================================================================
    // percentage helper tests
    // =========================================================================

    #[test]
    fn display_rounding_keeps_one_decimal() {
        assert_eq!(round_percentage_for_display(dec!(56.78)), dec!(56.8));
        assert_eq!(round_percentage_for_display(dec!(56.75)), dec!(56.8));
        assert_eq!(round_percentage_for_display(dec!(100)), dec!(100));
    }

    #[test]
    fn apply_percentage_does_not_round() {
        let result = apply_percentage(dec!(1500), dec!(56.75));

        assert_eq!(result, dec!(851.25));
        assert_eq!(apply_percentage(dec!(1), dec!(33.333)), dec!(0.33333));
    }
}
