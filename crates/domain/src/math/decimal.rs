use crate::error::DomainError;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;

/// Largest mantissa representable by `Decimal` (96 bits).
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;
/// Largest `Decimal` scale.
const MAX_SCALE: u32 = 28;

/// Converts `num / den` to a `Decimal`, keeping as many fractional digits as
/// the 96-bit mantissa allows. Values below `1e-28` collapse to zero.
pub fn ratio_to_decimal(num: U512, den: U512) -> Result<Decimal, DomainError> {
    if den.is_zero() {
        return Err(DomainError::DivisionByZero("ratio_to_decimal"));
    }
    for scale in (0..=MAX_SCALE).rev() {
        let Some(scaled) = num.checked_mul(U512::exp10(scale as usize)) else {
            continue;
        };
        let q = scaled / den;
        if q <= U512::from(MAX_MANTISSA) {
            let mantissa = i128::try_from(q.low_u128())
                .map_err(|_| DomainError::Overflow("ratio_to_decimal"))?;
            return Ok(Decimal::from_i128_with_scale(mantissa, scale).normalize());
        }
    }
    Err(DomainError::Overflow("ratio_to_decimal"))
}

/// Splits a non-negative `Decimal` into `(mantissa, 10^scale)`.
pub fn decimal_to_ratio(value: Decimal) -> Result<(U256, U256), DomainError> {
    let mantissa = value.mantissa();
    if mantissa < 0 {
        return Err(DomainError::InvalidPrice(format!("negative value {value}")));
    }
    let num = U256::from(mantissa.unsigned_abs());
    let den = U256::exp10(value.scale() as usize);
    Ok((num, den))
}
