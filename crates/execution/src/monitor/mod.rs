//! Price-triggered trading.
//!
//! A [`PriceMonitor`] polls one [`MonitorRule`](clmm_trader_domain::MonitorRule)
//! through a [`PriceFeed`] and fires a [`TriggerAction`] when the condition
//! holds. [`MonitorSet`] runs many rules side by side.

mod feed;
mod price_monitor;
mod runner;
mod trigger;

pub use feed::{OraclePriceFeed, PriceFeed};
pub use price_monitor::{CycleOutcome, CycleReport, MonitorHandle, MonitorState, PriceMonitor};
pub use runner::MonitorSet;
pub use trigger::{SwapTrigger, TriggerAction};
