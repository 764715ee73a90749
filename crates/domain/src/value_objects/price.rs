use crate::error::DomainError;
use crate::fees::FeeTier;
use crate::math::decimal::{decimal_to_ratio, ratio_to_decimal};
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MIN_SQRT_RATIO, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio,
    nearest_usable_tick,
};
use crate::token::Token;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price of token0 in token1 raw units, stored as the pool stores it:
/// `sqrt(price) * 2^96`.
///
/// Human prices need both tokens' decimals; see [`Price::from_decimal`] and
/// [`Price::to_decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    pub sqrt_price_x96: U256,
}

impl Price {
    pub fn from_sqrt_price_x96(sqrt_price_x96: U256) -> Self {
        Self { sqrt_price_x96 }
    }

    /// Converts a human price (token1 per token0, e.g. 3000 USDC per WETH)
    /// into the sqrt representation.
    pub fn from_decimal(price: Decimal, token0: &Token, token1: &Token) -> Result<Self, DomainError> {
        if price <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!("price must be positive, got {price}")));
        }
        let (num, den) = decimal_to_ratio(price)?;

        // raw = price * 10^decimals1 / 10^decimals0; sqrt(raw * 2^192)
        let numerator = U512::from(num)
            .checked_mul(U512::exp10(usize::from(token1.decimals)))
            .and_then(|n| n.checked_mul(U512::one() << 192))
            .ok_or(DomainError::Overflow("price scaling"))?;
        let denominator = U512::from(den)
            .checked_mul(U512::exp10(usize::from(token0.decimals)))
            .ok_or(DomainError::Overflow("price scaling"))?;

        let sqrt = (numerator / denominator).integer_sqrt();
        let sqrt_price_x96 =
            U256::try_from(sqrt).map_err(|_| DomainError::OutOfRange(format!("price {price}")))?;
        if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
            return Err(DomainError::OutOfRange(format!("price {price}")));
        }
        Ok(Self { sqrt_price_x96 })
    }

    /// Human price (token1 per token0). Display boundary only.
    pub fn to_decimal(&self, token0: &Token, token1: &Token) -> Result<Decimal, DomainError> {
        let sqrt = U512::from(self.sqrt_price_x96);
        let numerator = (sqrt * sqrt)
            .checked_mul(U512::exp10(usize::from(token0.decimals)))
            .ok_or(DomainError::Overflow("price scaling"))?;
        let denominator = (U512::one() << 192)
            .checked_mul(U512::exp10(usize::from(token1.decimals)))
            .ok_or(DomainError::Overflow("price scaling"))?;
        ratio_to_decimal(numerator, denominator)
    }

    /// Price of token1 in token0.
    pub fn invert(&self) -> Result<Self, DomainError> {
        if self.sqrt_price_x96.is_zero() {
            return Err(DomainError::DivisionByZero("invert zero price"));
        }
        let inverted = (U512::one() << 192) / U512::from(self.sqrt_price_x96);
        U256::try_from(inverted)
            .map(Self::from_sqrt_price_x96)
            .map_err(|_| DomainError::Overflow("invert price"))
    }

    /// Greatest tick at or below this price.
    pub fn tick(&self) -> Result<i32, DomainError> {
        get_tick_at_sqrt_ratio(self.sqrt_price_x96)
    }
}

/// Price at an exact tick.
pub fn tick_to_price(tick: i32) -> Result<Price, DomainError> {
    get_sqrt_ratio_at_tick(tick).map(Price::from_sqrt_price_x96)
}

/// Usable tick for a price: floor to the tick at or below the price, then
/// snap to the nearest multiple of the tier's tick spacing.
///
/// Taking a [`FeeTier`] keeps spacings outside the fee table unrepresentable;
/// raw fees go through [`FeeTier::from_fee`] and fail with `UnknownFeeTier`.
pub fn price_to_tick(price: &Price, fee_tier: FeeTier) -> Result<i32, DomainError> {
    nearest_usable_tick(price.tick()?, fee_tier.tick_spacing())
}
