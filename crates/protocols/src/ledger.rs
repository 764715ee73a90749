//! Capability interface to the ledger node.

use crate::error::ProtocolError;
use crate::uniswap::ContractCall;
use async_trait::async_trait;
use clmm_trader_domain::Address;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transaction hash.
pub type TxHash = H256;

/// Pool slot and accumulators read in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
}

/// A position as stored by the position manager contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionState {
    pub token_id: U256,
    pub owner: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

/// A state-changing call ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub call: ContractCall,
    pub value: U256,
    /// Left to the node's estimate when `None`.
    pub gas_limit: Option<u64>,
}

/// One emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    /// False when the transaction reverted.
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<Log>,
    pub revert_reason: Option<String>,
}

/// Read and write access to the ledger.
///
/// Implementations must be safe to share between monitor tasks.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Reads price, tick, in-range liquidity and fee growth of a pool.
    async fn read_pool_state(&self, pool: Address) -> Result<PoolState, ProtocolError>;

    /// Reads a position NFT from the position manager.
    async fn read_position(&self, token_id: U256) -> Result<PositionState, ProtocolError>;

    /// Number of transactions sent by `account`, including pending ones.
    async fn transaction_count(&self, account: Address) -> Result<u64, ProtocolError>;

    /// Broadcasts a transaction and returns its hash without waiting for inclusion.
    async fn submit_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TxHash, ProtocolError>;

    /// Waits until the transaction is mined or `timeout` elapses.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<TransactionReceipt, ProtocolError>;
}
