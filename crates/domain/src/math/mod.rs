//! Fixed-point math in the AMM's native representation.
//!
//! Prices are carried as `sqrt(price) * 2^96` in a `U256`, liquidity as
//! `u128`, and every product is widened to `U512` before division.

/// Decimal <-> integer ratio conversion at display boundaries.
pub mod decimal;
/// Multiply-then-divide without intermediate overflow.
pub mod full_math;
/// Liquidity and token amount conversions.
pub mod liquidity;
/// Tick <-> sqrt price conversion.
pub mod tick_math;
