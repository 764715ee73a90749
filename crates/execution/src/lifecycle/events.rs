//! Event records emitted while trading.

use crate::error::ExecutionError;
use crate::position::{PositionClosed, PositionOpened};
use crate::swap::SwapResult;
use clmm_trader_domain::{Amount, Quote};
use clmm_trader_protocols::TxHash;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Type of trade event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeEventType {
    /// Swap broadcast.
    SwapSubmitted,
    /// Swap mined.
    SwapConfirmed,
    /// Position minted.
    PositionOpened,
    /// Liquidity removed and tokens collected.
    PositionClosed,
    /// Submission or confirmation failed.
    Failed,
}

/// A trade event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: TradeEventType,
    /// Transaction hash, when one exists.
    pub tx_hash: Option<TxHash>,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl TradeEvent {
    /// Creates a new trade event.
    pub fn new(event_type: TradeEventType, tx_hash: Option<TxHash>, data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            tx_hash,
            timestamp: chrono::Utc::now(),
            data,
        }
    }

    pub fn swap_submitted(tx_hash: TxHash, quote: &Quote) -> Self {
        Self::new(
            TradeEventType::SwapSubmitted,
            Some(tx_hash),
            EventData::Swap(SwapData {
                amount_in: quote.amount_in.clone(),
                amount_out: quote.amount_out.clone(),
                gas_used: None,
            }),
        )
    }

    pub fn swap_confirmed(result: &SwapResult) -> Self {
        Self::new(
            TradeEventType::SwapConfirmed,
            Some(result.tx_hash),
            EventData::Swap(SwapData {
                amount_in: result.amount_in.clone(),
                amount_out: result.amount_out.clone(),
                gas_used: Some(result.gas_used),
            }),
        )
    }

    pub fn position_opened(opened: &PositionOpened) -> Self {
        Self::new(
            TradeEventType::PositionOpened,
            Some(opened.tx_hash),
            EventData::PositionOpened(PositionOpenedData {
                token_id: opened.position.token_id,
                tick_lower: opened.position.tick_lower,
                tick_upper: opened.position.tick_upper,
                liquidity: opened.position.liquidity,
                amount0: opened.amount0,
                amount1: opened.amount1,
            }),
        )
    }

    pub fn position_closed(closed: &PositionClosed) -> Self {
        Self::new(
            TradeEventType::PositionClosed,
            closed.collect_tx.or(closed.decrease_tx),
            EventData::PositionClosed(PositionClosedData {
                token_id: closed.token_id,
                liquidity_removed: closed.liquidity_removed,
                amount0: closed.amount0,
                amount1: closed.amount1,
            }),
        )
    }

    pub fn failure(tx_hash: Option<TxHash>, error: &ExecutionError) -> Self {
        Self::new(TradeEventType::Failed, tx_hash, EventData::Failure(error.to_string()))
    }
}

/// Event-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    /// Swap amounts.
    Swap(SwapData),
    /// Position opened data.
    PositionOpened(PositionOpenedData),
    /// Position closed data.
    PositionClosed(PositionClosedData),
    /// Error message.
    Failure(String),
}

/// Data for swap events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapData {
    /// Amount sold.
    pub amount_in: Amount,
    /// Quoted output when submitted, received output when confirmed.
    pub amount_out: Amount,
    /// Gas used, once mined.
    pub gas_used: Option<u64>,
}

/// Data for position opened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedData {
    /// Position NFT id.
    pub token_id: U256,
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
    /// Initial liquidity.
    pub liquidity: u128,
    /// Token0 deposited.
    pub amount0: U256,
    /// Token1 deposited.
    pub amount1: U256,
}

/// Data for position closed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedData {
    /// Position NFT id.
    pub token_id: U256,
    /// Liquidity removed by this close.
    pub liquidity_removed: u128,
    /// Token0 collected, principal and fees.
    pub amount0: U256,
    /// Token1 collected, principal and fees.
    pub amount1: U256,
}
