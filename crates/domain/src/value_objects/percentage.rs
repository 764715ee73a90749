use crate::error::DomainError;
use crate::math::full_math::mul_div;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

const BPS_DENOMINATOR: u32 = 10_000;

/// A fraction in `[0, 1]`, used for slippage tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);
    pub const ONE_HUNDRED: Percentage = Percentage(Decimal::ONE);

    /// Wraps a fraction, e.g. `0.005` for 0.5%.
    pub fn new(fraction: Decimal) -> Result<Self, DomainError> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(DomainError::InvalidSlippage(fraction.to_string()));
        }
        Ok(Self(fraction))
    }

    pub fn from_bps(bps: u32) -> Result<Self, DomainError> {
        Self::new(Decimal::from(bps) / Decimal::from(BPS_DENOMINATOR))
    }

    /// Whole basis points, truncated.
    pub fn to_bps(&self) -> u32 {
        (self.0 * Decimal::from(BPS_DENOMINATOR))
            .trunc()
            .to_u32()
            .unwrap_or(BPS_DENOMINATOR)
    }

    pub fn fraction(&self) -> Decimal {
        self.0
    }

    /// Worst acceptable amount: `amount * (1 - self)`, rounded down.
    ///
    /// Uses the exact decimal fraction, not its basis-point truncation.
    pub fn min_amount(&self, amount: U256) -> Result<U256, DomainError> {
        // fraction = mantissa / 10^scale with 0 <= mantissa <= 10^scale
        let denominator = U256::exp10(self.0.scale() as usize);
        let tolerance = U256::from(self.0.mantissa().unsigned_abs());
        let keep = denominator
            .checked_sub(tolerance)
            .ok_or(DomainError::Overflow("slippage fraction"))?;
        mul_div(amount, keep, denominator)
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bps_conversion() {
        let p = Percentage::from_bps(50).unwrap();
        assert_eq!(p.fraction(), dec!(0.005));
        assert_eq!(p.to_bps(), 50);
        assert_eq!(p.to_string(), "0.5%");
    }

    #[test]
    fn test_bounds() {
        assert!(Percentage::new(dec!(-0.01)).is_err());
        assert!(Percentage::new(dec!(1.01)).is_err());
        assert!(Percentage::from_bps(10_001).is_err());
    }

    #[test]
    fn test_min_amount() {
        let p = Percentage::from_bps(50).unwrap();
        assert_eq!(p.min_amount(U256::from(1_000_000u64)).unwrap(), U256::from(995_000u64));
        assert_eq!(Percentage::ONE_HUNDRED.min_amount(U256::from(123u64)).unwrap(), U256::zero());
        assert_eq!(Percentage::ZERO.min_amount(U256::from(123u64)).unwrap(), U256::from(123u64));
    }

    #[test]
    fn test_min_amount_keeps_sub_bps_precision() {
        let p = Percentage::new(dec!(0.00999)).unwrap();
        assert_eq!(p.to_bps(), 99);
        assert_eq!(p.min_amount(U256::from(1_000_000u64)).unwrap(), U256::from(990_010u64));

        let tenth_bps = Percentage::new(dec!(0.00001)).unwrap();
        assert_eq!(tenth_bps.min_amount(U256::from(1_000_000u64)).unwrap(), U256::from(999_990u64));
    }
}
