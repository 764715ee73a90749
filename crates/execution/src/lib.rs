//! Trade execution against a concentrated-liquidity AMM.
//!
//! This crate provides:
//! - Nonce-ordered transaction submission and confirmation
//! - Quote-driven swaps with slippage protection
//! - Opening, closing and collecting liquidity positions
//! - Price monitors that trade when a target is crossed
//! - Trade events for observers

/// Prelude module for convenient imports.
pub mod prelude;

/// Time source for deadlines.
pub mod clock;
/// Execution settings.
pub mod config;
/// Execution error type.
pub mod error;
/// Trade events.
pub mod lifecycle;
/// Price monitoring.
pub mod monitor;
/// Liquidity position management.
pub mod position;
/// Swap execution.
pub mod swap;
/// Transaction sequencing.
pub mod transaction;

#[cfg(test)]
mod test_support;

pub use error::ExecutionError;
