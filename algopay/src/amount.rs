//! Decimal to base-unit amount conversion.
//!
//! Chain amounts are unsigned integers in the smallest unit: microalgos for
//! the native currency (fixed exponent 6), or asset units scaled by the
//! asset's own decimal count. Conversion is exact for inputs with no more
//! fraction digits than the target exponent; anything finer rounds to the
//! nearest unit, half away from zero, so a payment is never silently
//! truncated below the displayed amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fixed decimal exponent of the native currency (1 ALGO = 10^6 microalgos).
pub const ALGO_DECIMALS: u32 = 6;

/// Largest supported asset decimal count (the chain caps assets at 19).
pub const MAX_ASSET_DECIMALS: u32 = 19;

/// Errors produced by amount conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The amount is negative.
    #[error("amount must not be negative")]
    Negative,
    /// The asset decimal count exceeds [`MAX_ASSET_DECIMALS`].
    #[error("unsupported asset decimal count {0}")]
    UnsupportedDecimals(u32),
    /// The scaled amount does not fit in a `u64`.
    #[error("amount overflows the chain's integer range")]
    Overflow,
}

/// Converts a decimal native-currency amount into microalgos.
///
/// # Errors
///
/// Returns [`AmountError`] on negative or overflowing input.
pub fn to_microalgos(amount: Decimal) -> Result<u64, AmountError> {
    to_base_units(amount, ALGO_DECIMALS)
}

/// Converts a decimal amount into integer base units with the given exponent.
///
/// Rounds to the nearest unit, half away from zero.
///
/// # Errors
///
/// Returns [`AmountError`] on negative input, an unsupported decimal count,
/// or a result outside the `u64` range.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }
    if decimals > MAX_ASSET_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    let factor = Decimal::from(10u64.pow(decimals));
    let scaled = amount.checked_mul(factor).ok_or(AmountError::Overflow)?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(AmountError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn native_conversion_uses_fixed_exponent() {
        assert_eq!(to_microalgos(dec!(2.5)).unwrap(), 2_500_000);
        assert_eq!(to_microalgos(dec!(0)).unwrap(), 0);
        assert_eq!(to_microalgos(dec!(0.000001)).unwrap(), 1);
    }

    #[test]
    fn exact_when_fraction_fits_decimals() {
        assert_eq!(to_base_units(dec!(10.50), 6).unwrap(), 10_500_000);
        assert_eq!(to_base_units(dec!(1.23), 2).unwrap(), 123);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_base_units(dec!(1.005), 2).unwrap(), 101);
        assert_eq!(to_base_units(dec!(1.004), 2).unwrap(), 100);
        assert_eq!(to_base_units(dec!(0.0000005), 6).unwrap(), 1);
    }

    #[test]
    fn rejects_negative_amounts() {
        assert_eq!(to_microalgos(dec!(-1)), Err(AmountError::Negative));
    }

    #[test]
    fn rejects_unsupported_decimals() {
        assert_eq!(
            to_base_units(dec!(1), 20),
            Err(AmountError::UnsupportedDecimals(20))
        );
    }

    #[test]
    fn rejects_overflow() {
        let huge = Decimal::MAX;
        assert_eq!(to_base_units(huge, 6), Err(AmountError::Overflow));
    }
}
