//! Domain model and math for concentrated-liquidity trading.
//!
//! This crate is free of I/O and provides:
//! - Tokens, amounts, pools, positions and quotes
//! - Tick math in the AMM's own sqrtPriceX96 representation
//! - Liquidity/amount conversions on the constant-liquidity curve
//! - Position sizing for a tick range
//! - Monitor rules for price-triggered trading

/// Domain error type.
pub mod error;
/// Fee tiers and tick spacing.
pub mod fees;
/// Fixed-point math.
pub mod math;
/// Pool identity and state.
pub mod pool;
/// Liquidity positions.
pub mod position;
/// Quotes and routes.
pub mod quote;
/// Monitor rules.
pub mod rule;
/// Position sizing.
pub mod sizing;
/// Tokens and raw amounts.
pub mod token;
/// Value objects (price, percentage).
pub mod value_objects;

pub use error::DomainError;
pub use fees::FeeTier;
pub use pool::{Pool, PoolKey};
pub use position::{Position, PositionStatus};
pub use quote::{Quote, Route, RouteHop};
pub use rule::{Direction, MonitorRule, TriggerMode};
pub use sizing::{SizedPosition, size_position};
pub use token::{Address, Amount, Token, TokenRegistry, format_address, parse_address};
pub use value_objects::{Percentage, Price, price_to_tick, tick_to_price};
