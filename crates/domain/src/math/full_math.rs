use crate::error::DomainError;
use primitive_types::{U256, U512};

/// 2^96, the scale of sqrtPriceX96 values.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);
/// Bit width of the Q96 fixed-point resolution.
pub const RESOLUTION: usize = 96;

/// `floor(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, DomainError> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero("mul_div"));
    }
    let product = U512::from(a) * U512::from(b);
    U256::try_from(product / U512::from(denominator)).map_err(|_| DomainError::Overflow("mul_div"))
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, DomainError> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero("mul_div_rounding_up"));
    }
    let product = U512::from(a) * U512::from(b);
    let den = U512::from(denominator);
    let mut result = product / den;
    if !(product % den).is_zero() {
        result += U512::one();
    }
    U256::try_from(result).map_err(|_| DomainError::Overflow("mul_div_rounding_up"))
}

/// `ceil(a / b)`.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, DomainError> {
    if b.is_zero() {
        return Err(DomainError::DivisionByZero("div_rounding_up"));
    }
    let q = a / b;
    if (a % b).is_zero() { Ok(q) } else { Ok(q + U256::one()) }
}
