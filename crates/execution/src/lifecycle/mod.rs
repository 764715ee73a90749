//! Trade lifecycle events.
//!
//! Swaps and position changes are reported as [`TradeEvent`]s on an unbounded
//! channel. Nothing is persisted; the receiver decides what to keep.

mod events;

pub use events::*;

use tokio::sync::mpsc;
use tracing::debug;

/// Optional sender for trade events. A disabled or closed sink drops events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<TradeEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<TradeEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: TradeEvent) {
        if let Some(tx) = &self.tx
            && tx.send(event).is_err()
        {
            debug!("trade event receiver dropped");
        }
    }
}
