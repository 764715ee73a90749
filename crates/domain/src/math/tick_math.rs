use crate::error::DomainError;
use primitive_types::U256;

/// Smallest tick whose price is representable: `log_1.0001(2^-128)`.
pub const MIN_TICK: i32 = -887272;
/// Largest tick whose price is representable: `log_1.0001(2^128)`.
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 = U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

/// `2^128 / sqrt(1.0001)^(2^i)` in Q128.128, one per bit of `|tick|` above bit 0.
const BIT_FACTORS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// Factor for bit 0 of `|tick|`.
const BIT0_FACTOR: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// Returns `sqrt(1.0001^tick) * 2^96`, bit-for-bit as the pool contract
/// computes it.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, DomainError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(DomainError::OutOfRange(format!(
            "tick {tick} outside [{MIN_TICK}, {MAX_TICK}]"
        )));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(BIT0_FACTOR)
    } else {
        U256::one() << 128
    };
    for (i, factor) in BIT_FACTORS.iter().enumerate() {
        if abs_tick & (0x2 << i) != 0 {
            // ratio < 2^128 and factor < 2^128, so the product fits 256 bits.
            ratio = (ratio * U256::from(*factor)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so the result never underestimates.
    let rounding = if (ratio & U256::from(u32::MAX)).is_zero() {
        U256::zero()
    } else {
        U256::one()
    };
    Ok((ratio >> 32) + rounding)
}

/// Returns the greatest tick whose sqrt ratio is less than or equal to
/// `sqrt_price_x96`.
///
/// The input must lie in `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, DomainError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(DomainError::OutOfRange(format!(
            "sqrt price {sqrt_price_x96} outside [{MIN_SQRT_RATIO}, {MAX_SQRT_RATIO})"
        )));
    }

    // get_sqrt_ratio_at_tick is strictly increasing, so bisect on it.
    // Invariant: ratio(lo) <= input < ratio(hi).
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// Rounds `tick` to the nearest multiple of `tick_spacing` (halves round up),
/// kept inside `[MIN_TICK, MAX_TICK]`.
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> Result<i32, DomainError> {
    if tick_spacing <= 0 {
        return Err(DomainError::InvalidTickRange {
            lower: tick,
            upper: tick,
            spacing: tick_spacing,
        });
    }
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(DomainError::OutOfRange(format!(
            "tick {tick} outside [{MIN_TICK}, {MAX_TICK}]"
        )));
    }
    let quotient = tick.div_euclid(tick_spacing);
    let remainder = tick.rem_euclid(tick_spacing);
    let rounded = if remainder * 2 >= tick_spacing {
        (quotient + 1) * tick_spacing
    } else {
        quotient * tick_spacing
    };
    if rounded < MIN_TICK {
        Ok(rounded + tick_spacing)
    } else if rounded > MAX_TICK {
        Ok(rounded - tick_spacing)
    } else {
        Ok(rounded)
    }
}

/// Smallest usable tick for a spacing.
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    -(MAX_TICK / tick_spacing) * tick_spacing
}

/// Largest usable tick for a spacing.
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// True when `tick` is aligned to the spacing and inside the usable bounds.
pub fn is_usable_tick(tick: i32, tick_spacing: i32) -> bool {
    tick_spacing > 0
        && tick % tick_spacing == 0
        && (min_usable_tick(tick_spacing)..=max_usable_tick(tick_spacing)).contains(&tick)
}
