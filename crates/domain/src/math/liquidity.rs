use super::full_math::{Q96, RESOLUTION, div_rounding_up, mul_div, mul_div_rounding_up};
use crate::error::DomainError;
use primitive_types::U256;

fn ordered(sqrt_price_a: U256, sqrt_price_b: U256) -> (U256, U256) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

fn to_liquidity(value: U256) -> Result<u128, DomainError> {
    if value > U256::from(u128::MAX) {
        return Err(DomainError::Overflow("liquidity exceeds u128"));
    }
    Ok(value.low_u128())
}

/// Calculates the amount of token0 (x) spanned by `liquidity` between two prices.
/// delta_x = L * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_a) * sqrt(P_b))
pub fn get_amount0_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if lower.is_zero() {
        return Err(DomainError::InvalidPrice("sqrt price must be positive".into()));
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Calculates the amount of token1 (y) spanned by `liquidity` between two prices.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
pub fn get_amount1_delta(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// Calculates liquidity for a given amount of token0 and price range.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    amount0: U256,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if upper == lower {
        return Err(DomainError::DivisionByZero("empty price range"));
    }
    let intermediate = mul_div(lower, upper, Q96)?;
    to_liquidity(mul_div(amount0, intermediate, upper - lower)?)
}

/// Calculates liquidity for a given amount of token1 and price range.
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    amount1: U256,
) -> Result<u128, DomainError> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if upper == lower {
        return Err(DomainError::DivisionByZero("empty price range"));
    }
    to_liquidity(mul_div(amount1, Q96, upper - lower)?)
}

/// Token amounts held by `liquidity` in `[sqrt_price_a, sqrt_price_b)` at the
/// current price, rounded down.
pub fn get_amounts_for_liquidity(
    sqrt_price_x96: U256,
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    liquidity: u128,
) -> Result<(U256, U256), DomainError> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);

    if sqrt_price_x96 <= lower {
        Ok((get_amount0_delta(lower, upper, liquidity, false)?, U256::zero()))
    } else if sqrt_price_x96 < upper {
        Ok((
            get_amount0_delta(sqrt_price_x96, upper, liquidity, false)?,
            get_amount1_delta(lower, sqrt_price_x96, liquidity, false)?,
        ))
    } else {
        Ok((U256::zero(), get_amount1_delta(lower, upper, liquidity, false)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sqrt prices 1 and 2 in Q96, i.e. prices 1 and 4.
    fn sqrt_1() -> U256 {
        Q96
    }

    fn sqrt_2() -> U256 {
        Q96 * U256::from(2u8)
    }

    #[test]
    fn test_amount_deltas() {
        // Price goes from 1 to 4 (sqrt: 1 to 2)
        // delta_y = 1000 * (2 - 1) = 1000
        // delta_x = 1000 * (1/1 - 1/2) = 500
        let dy = get_amount1_delta(sqrt_1(), sqrt_2(), 1000, false).unwrap();
        assert_eq!(dy, U256::from(1000u64));

        let dx = get_amount0_delta(sqrt_1(), sqrt_2(), 1000, false).unwrap();
        assert_eq!(dx, U256::from(500u64));

        // Argument order does not matter.
        assert_eq!(get_amount0_delta(sqrt_2(), sqrt_1(), 1000, false).unwrap(), dx);
    }

    #[test]
    fn test_rounding_direction() {
        // 3 units of liquidity over [1, 2]: x = 1.5
        assert_eq!(get_amount0_delta(sqrt_1(), sqrt_2(), 3, false).unwrap(), U256::one());
        assert_eq!(get_amount0_delta(sqrt_1(), sqrt_2(), 3, true).unwrap(), U256::from(2u8));
    }

    #[test]
    fn test_get_liquidity() {
        // From previous test: if dx = 500, L should be 1000
        let l = get_liquidity_for_amount0(sqrt_1(), sqrt_2(), U256::from(500u64)).unwrap();
        assert_eq!(l, 1000);

        // If dy = 1000, L should be 1000
        let l2 = get_liquidity_for_amount1(sqrt_1(), sqrt_2(), U256::from(1000u64)).unwrap();
        assert_eq!(l2, 1000);
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(get_liquidity_for_amount0(sqrt_1(), sqrt_1(), U256::one()).is_err());
        assert!(get_liquidity_for_amount1(sqrt_2(), sqrt_2(), U256::one()).is_err());
    }

    #[test]
    fn test_amounts_for_liquidity_by_region() {
        let below = get_amounts_for_liquidity(Q96 / 2, sqrt_1(), sqrt_2(), 1000).unwrap();
        assert_eq!(below, (U256::from(500u64), U256::zero()));

        let above = get_amounts_for_liquidity(Q96 * 3, sqrt_1(), sqrt_2(), 1000).unwrap();
        assert_eq!(above, (U256::zero(), U256::from(1000u64)));

        // sqrt price 1.5: x = 1000 * (1/1.5 - 1/2) = 166, y = 1000 * 0.5 = 500
        let inside = get_amounts_for_liquidity(Q96 * 3 / 2, sqrt_1(), sqrt_2(), 1000).unwrap();
        assert_eq!(inside, (U256::from(166u64), U256::from(500u64)));
    }
}
