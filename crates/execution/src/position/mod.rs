//! Opening and closing liquidity positions.

mod manager;

pub use manager::{Collected, PositionClosed, PositionManager, PositionOpened};
