//! Position sizing on the constant-liquidity curve.
//!
//! Given a tick range and the amounts a caller is willing to deposit, finds the
//! largest liquidity both amounts can back and the amounts that liquidity
//! actually consumes.

use crate::error::DomainError;
use crate::math::liquidity::{
    get_amounts_for_liquidity, get_liquidity_for_amount0, get_liquidity_for_amount1,
};
use crate::math::tick_math::{get_sqrt_ratio_at_tick, is_usable_tick};
use crate::pool::Pool;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Liquidity and the token amounts it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedPosition {
    pub liquidity: u128,
    /// Never more than the desired token0 amount.
    pub amount0: U256,
    /// Never more than the desired token1 amount.
    pub amount1: U256,
}

/// Ensures `lower < upper` and both are usable for `tick_spacing`.
pub fn validate_tick_range(
    tick_lower: i32,
    tick_upper: i32,
    tick_spacing: i32,
) -> Result<(), DomainError> {
    if tick_lower >= tick_upper
        || !is_usable_tick(tick_lower, tick_spacing)
        || !is_usable_tick(tick_upper, tick_spacing)
    {
        return Err(DomainError::InvalidTickRange {
            lower: tick_lower,
            upper: tick_upper,
            spacing: tick_spacing,
        });
    }
    Ok(())
}

/// Sizes a position in `[tick_lower, tick_upper)` for the pool's current price.
///
/// Below the range only token0 is used, at or above it only token1. Inside,
/// the liquidity is the smaller of what each amount supports on its side of
/// the current price.
pub fn size_position(
    pool: &Pool,
    tick_lower: i32,
    tick_upper: i32,
    desired0: U256,
    desired1: U256,
) -> Result<SizedPosition, DomainError> {
    validate_tick_range(tick_lower, tick_upper, pool.tick_spacing())?;

    let sqrt_a = get_sqrt_ratio_at_tick(tick_lower)?;
    let sqrt_b = get_sqrt_ratio_at_tick(tick_upper)?;

    let liquidity = if pool.tick_current < tick_lower {
        get_liquidity_for_amount0(sqrt_a, sqrt_b, desired0)?
    } else if pool.tick_current >= tick_upper {
        get_liquidity_for_amount1(sqrt_a, sqrt_b, desired1)?
    } else {
        // The tick and sqrt price can disagree by rounding at a boundary.
        let sqrt_p = pool.sqrt_price_x96.clamp(sqrt_a, sqrt_b);
        if sqrt_p == sqrt_a {
            get_liquidity_for_amount0(sqrt_a, sqrt_b, desired0)?
        } else if sqrt_p == sqrt_b {
            get_liquidity_for_amount1(sqrt_a, sqrt_b, desired1)?
        } else {
            let from0 = get_liquidity_for_amount0(sqrt_p, sqrt_b, desired0)?;
            let from1 = get_liquidity_for_amount1(sqrt_a, sqrt_p, desired1)?;
            from0.min(from1)
        }
    };

    if liquidity == 0 {
        return Err(DomainError::InsufficientAmount);
    }

    let sqrt_p = if pool.tick_current < tick_lower {
        sqrt_a
    } else if pool.tick_current >= tick_upper {
        sqrt_b
    } else {
        pool.sqrt_price_x96.clamp(sqrt_a, sqrt_b)
    };
    let (amount0, amount1) = get_amounts_for_liquidity(sqrt_p, sqrt_a, sqrt_b, liquidity)?;

    Ok(SizedPosition {
        liquidity,
        amount0: amount0.min(desired0),
        amount1: amount1.min(desired1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeTier;
    use crate::token::{Address, Token, parse_address};
    use proptest::prelude::*;

    fn pool_at_tick(tick: i32) -> Pool {
        let a = Token::new(1, parse_address("0x0000000000000000000000000000000000000001").unwrap(), 18, "A", "A");
        let b = Token::new(1, parse_address("0x0000000000000000000000000000000000000002").unwrap(), 18, "B", "B");
        Pool {
            address: Address::zero(),
            token0: a,
            token1: b,
            fee_tier: FeeTier::MEDIUM,
            sqrt_price_x96: get_sqrt_ratio_at_tick(tick).unwrap(),
            tick_current: tick,
            liquidity: 1_000_000,
            fee_growth_global0_x128: U256::zero(),
            fee_growth_global1_x128: U256::zero(),
        }
    }

    fn e18(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn test_below_range_is_token0_only() {
        let sized = size_position(&pool_at_tick(-1000), -600, 600, e18(1), e18(1)).unwrap();
        assert!(sized.liquidity > 0);
        assert!(sized.amount0 <= e18(1));
        assert!(sized.amount0 > e18(1) - U256::from(1_000u32));
        assert_eq!(sized.amount1, U256::zero());
    }

    #[test]
    fn test_above_range_is_token1_only() {
        let sized = size_position(&pool_at_tick(600), -600, 600, e18(1), e18(1)).unwrap();
        assert_eq!(sized.amount0, U256::zero());
        assert!(sized.amount1 <= e18(1));
    }

    #[test]
    fn test_in_range_limited_by_scarcer_side() {
        // At tick 0 a symmetric range needs roughly equal amounts, so the
        // smaller deposit decides the liquidity.
        let sized = size_position(&pool_at_tick(0), -600, 600, e18(10), e18(1)).unwrap();
        assert!(sized.amount1 <= e18(1));
        assert!(sized.amount1 > e18(1) - U256::from(1_000u32));
        assert!(sized.amount0 < e18(2));
    }

    #[test]
    fn test_invalid_ranges() {
        let pool = pool_at_tick(0);
        assert!(matches!(
            size_position(&pool, 600, -600, e18(1), e18(1)),
            Err(DomainError::InvalidTickRange { .. })
        ));
        assert!(matches!(
            size_position(&pool, 600, 600, e18(1), e18(1)),
            Err(DomainError::InvalidTickRange { .. })
        ));
        assert!(matches!(
            size_position(&pool, -601, 600, e18(1), e18(1)),
            Err(DomainError::InvalidTickRange { .. })
        ));
    }

    #[test]
    fn test_dust_is_insufficient() {
        let pool = pool_at_tick(0);
        assert_eq!(
            size_position(&pool, -600, 600, U256::zero(), U256::zero()),
            Err(DomainError::InsufficientAmount)
        );
        // Single-sided below range with no token0 offered.
        assert_eq!(
            size_position(&pool_at_tick(-1200), -600, 600, U256::zero(), e18(5)),
            Err(DomainError::InsufficientAmount)
        );
    }

    proptest! {
        #[test]
        fn prop_actual_never_exceeds_desired(
            tick in -20_000i32..20_000,
            lower_steps in -300i32..300,
            width in 1i32..300,
            desired0 in 1u128..u128::MAX / 4,
            desired1 in 1u128..u128::MAX / 4,
        ) {
            let lower = lower_steps * 60;
            let upper = lower + width * 60;
            let d0 = U256::from(desired0);
            let d1 = U256::from(desired1);
            if let Ok(sized) = size_position(&pool_at_tick(tick), lower, upper, d0, d1) {
                prop_assert!(sized.amount0 <= d0);
                prop_assert!(sized.amount1 <= d1);
                if tick < lower {
                    prop_assert_eq!(sized.amount1, U256::zero());
                }
                if tick >= upper {
                    prop_assert_eq!(sized.amount0, U256::zero());
                }
            }
        }
    }
}
