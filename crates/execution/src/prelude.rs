//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_trader_execution::prelude::*;
//! ```

// Clock
pub use crate::clock::{Clock, ManualClock, SystemClock};

// Config
pub use crate::config::ExecutionConfig;

// Errors
pub use crate::error::{ExecutionError, with_timeout};

// Lifecycle
pub use crate::lifecycle::{EventData, EventSink, TradeEvent, TradeEventType};

// Monitor
pub use crate::monitor::{
    CycleOutcome, CycleReport, MonitorHandle, MonitorSet, MonitorState, OraclePriceFeed,
    PriceFeed, PriceMonitor, SwapTrigger, TriggerAction,
};

// Position
pub use crate::position::{Collected, PositionClosed, PositionManager, PositionOpened};

// Swap
pub use crate::swap::{PendingSwap, SwapExecutor, SwapResult, min_amount_out};

// Transaction
pub use crate::transaction::TransactionSequencer;
