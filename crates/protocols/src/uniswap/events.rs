//! Decoders for the receipt events the trader reads back.

use super::interfaces::{IERC20, INonfungiblePositionManager};
use crate::convert::{IntoAlloy, IntoLegacy};
use crate::ledger::Log;
use alloy::primitives::LogData;
use alloy::sol_types::SolEvent;
use clmm_trader_domain::Address;
use primitive_types::U256;

/// Liquidity change reported by the position manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityChange {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0: U256,
    pub amount1: U256,
}

/// Tokens paid out by `collect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collected {
    pub token_id: U256,
    pub recipient: Address,
    pub amount0: U256,
    pub amount1: U256,
}

/// ERC-20 transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

fn decode<E: SolEvent>(log: &Log) -> Option<E> {
    E::decode_raw_log(log.topics.iter().map(|t| t.into_alloy()), &log.data).ok()
}

fn to_log(emitter: Address, data: LogData) -> Log {
    Log {
        address: emitter,
        topics: data.topics().iter().map(|t| t.into_legacy()).collect(),
        data: data.data.to_vec(),
    }
}

pub fn decode_increase_liquidity(log: &Log) -> Option<LiquidityChange> {
    decode::<INonfungiblePositionManager::IncreaseLiquidity>(log).map(|e| LiquidityChange {
        token_id: e.tokenId.into_legacy(),
        liquidity: e.liquidity,
        amount0: e.amount0.into_legacy(),
        amount1: e.amount1.into_legacy(),
    })
}

pub fn decode_decrease_liquidity(log: &Log) -> Option<LiquidityChange> {
    decode::<INonfungiblePositionManager::DecreaseLiquidity>(log).map(|e| LiquidityChange {
        token_id: e.tokenId.into_legacy(),
        liquidity: e.liquidity,
        amount0: e.amount0.into_legacy(),
        amount1: e.amount1.into_legacy(),
    })
}

pub fn decode_collect(log: &Log) -> Option<Collected> {
    decode::<INonfungiblePositionManager::Collect>(log).map(|e| Collected {
        token_id: e.tokenId.into_legacy(),
        recipient: e.recipient.into_legacy(),
        amount0: e.amount0.into_legacy(),
        amount1: e.amount1.into_legacy(),
    })
}

/// ERC-20 transfers only; ERC-721 transfers carry a fourth topic and are skipped.
pub fn decode_transfer(log: &Log) -> Option<Transfer> {
    if log.topics.len() != 3 {
        return None;
    }
    decode::<IERC20::Transfer>(log).map(|e| Transfer {
        token: log.address,
        from: e.from.into_legacy(),
        to: e.to.into_legacy(),
        value: e.value.into_legacy(),
    })
}

/// Sum of `token` transferred to `recipient` in a receipt.
pub fn received_amount(logs: &[Log], token: &Address, recipient: &Address) -> U256 {
    logs.iter()
        .filter_map(decode_transfer)
        .filter(|t| &t.token == token && &t.to == recipient)
        .fold(U256::zero(), |acc, t| acc.saturating_add(t.value))
}

/// Builds an `IncreaseLiquidity` log as the position manager emits it. Used by in-memory ledgers.
pub fn increase_liquidity_log(emitter: Address, change: &LiquidityChange) -> Log {
    let event = INonfungiblePositionManager::IncreaseLiquidity {
        tokenId: change.token_id.into_alloy(),
        liquidity: change.liquidity,
        amount0: change.amount0.into_alloy(),
        amount1: change.amount1.into_alloy(),
    };
    to_log(emitter, event.encode_log_data())
}

/// Builds a `DecreaseLiquidity` log. Used by in-memory ledgers.
pub fn decrease_liquidity_log(emitter: Address, change: &LiquidityChange) -> Log {
    let event = INonfungiblePositionManager::DecreaseLiquidity {
        tokenId: change.token_id.into_alloy(),
        liquidity: change.liquidity,
        amount0: change.amount0.into_alloy(),
        amount1: change.amount1.into_alloy(),
    };
    to_log(emitter, event.encode_log_data())
}

/// Builds a `Collect` log. Used by in-memory ledgers.
pub fn collect_log(emitter: Address, collected: &Collected) -> Log {
    let event = INonfungiblePositionManager::Collect {
        tokenId: collected.token_id.into_alloy(),
        recipient: collected.recipient.into_alloy(),
        amount0: collected.amount0.into_alloy(),
        amount1: collected.amount1.into_alloy(),
    };
    to_log(emitter, event.encode_log_data())
}

/// Builds an ERC-20 `Transfer` log. Used by in-memory ledgers.
pub fn transfer_log(transfer: &Transfer) -> Log {
    let event = IERC20::Transfer {
        from: transfer.from.into_alloy(),
        to: transfer.to.into_alloy(),
        value: transfer.value.into_alloy(),
    };
    to_log(transfer.token, event.encode_log_data())
}
