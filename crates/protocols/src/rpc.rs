//! Ledger access through an alloy provider.
//!
//! Transactions are sent with `eth_sendTransaction`; the node (or a signer
//! proxy in front of it) holds the key for the `from` account.

use crate::convert::{IntoAlloy, IntoLegacy, tick_from};
use crate::error::ProtocolError;
use crate::ledger::{Ledger, Log, PoolState, PositionState, TransactionReceipt, TransactionRequest, TxHash};
use crate::uniswap::interfaces::{INonfungiblePositionManager, IUniswapV3Pool};
use alloy::consensus::Transaction as _;
use alloy::eips::BlockId;
use alloy::network::TransactionBuilder;
use alloy::primitives::U256 as AlloyU256;
use alloy::providers::fillers::FillProvider;
use alloy::providers::utils::JoinedRecommendedFillers;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{TransactionReceipt as RpcReceipt, TransactionRequest as RpcTransactionRequest};
use alloy::transports::http::Http;
use async_trait::async_trait;
use clmm_trader_domain::Address;
use primitive_types::U256;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider built by [`connect_http`].
pub type HttpProvider = FillProvider<JoinedRecommendedFillers, RootProvider>;

/// Connects to a node over HTTP. Each request fails after `request_timeout`.
pub fn connect_http(url: &str, request_timeout: Duration) -> Result<HttpProvider, ProtocolError> {
    let parsed: reqwest::Url = url
        .parse()
        .map_err(|e| ProtocolError::Transport(format!("invalid rpc url {url}: {e}")))?;
    let http = reqwest::Client::builder()
        .timeout(request_timeout)
        .build()
        .map_err(|e| ProtocolError::Transport(e.to_string()))?;
    let client = RpcClient::new(Http::with_client(http, parsed), false);
    Ok(ProviderBuilder::new().connect_client(client))
}

/// [`Ledger`] backed by a node's JSON-RPC endpoint.
pub struct JsonRpcLedger<P> {
    provider: P,
    position_manager: Address,
    receipt_poll_interval: Duration,
}

impl<P: Provider + Clone> JsonRpcLedger<P> {
    pub fn new(provider: P, position_manager: Address, receipt_poll_interval: Duration) -> Self {
        Self {
            provider,
            position_manager,
            receipt_poll_interval,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Replays a reverted transaction at its block to recover the reason.
    async fn replay_revert_reason(&self, receipt: &RpcReceipt) -> Option<String> {
        let (to, block) = (receipt.to?, receipt.block_number?);
        let tx = match self.provider.get_transaction_by_hash(receipt.transaction_hash).await {
            Ok(tx) => tx?,
            Err(err) => {
                debug!(error = %err, "reverted transaction lookup failed");
                return None;
            }
        };
        let replay = RpcTransactionRequest::default()
            .with_from(receipt.from)
            .with_to(to)
            .with_input(tx.input().clone());
        match self.provider.call(replay).block(BlockId::number(block)).await {
            Ok(_) => None,
            Err(err) => match ProtocolError::from(err) {
                ProtocolError::Reverted(reason) => Some(reason),
                other => {
                    debug!(error = %other, "revert replay failed");
                    None
                }
            },
        }
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<Option<TransactionReceipt>, ProtocolError> {
        let Some(receipt) = self.provider.get_transaction_receipt(tx_hash.into_alloy()).await? else {
            return Ok(None);
        };

        let status = receipt.status();
        let revert_reason = if status {
            None
        } else {
            self.replay_revert_reason(&receipt).await
        };
        let logs = receipt
            .inner
            .logs()
            .iter()
            .map(|log| Log {
                address: log.address().into_legacy(),
                topics: log.topics().iter().map(|t| t.into_legacy()).collect(),
                data: log.data().data.to_vec(),
            })
            .collect();

        Ok(Some(TransactionReceipt {
            tx_hash: receipt.transaction_hash.into_legacy(),
            status,
            gas_used: receipt.gas_used,
            logs,
            revert_reason,
        }))
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> Ledger for JsonRpcLedger<P> {
    async fn read_pool_state(&self, pool: Address) -> Result<PoolState, ProtocolError> {
        let contract = IUniswapV3Pool::new(pool.into_alloy(), self.provider.clone());
        let slot0 = contract.slot0();
        let liquidity = contract.liquidity();
        let fee_growth0 = contract.feeGrowthGlobal0X128();
        let fee_growth1 = contract.feeGrowthGlobal1X128();
        let (slot0, liquidity, fee_growth0, fee_growth1) = tokio::try_join!(
            slot0.call().into_future(),
            liquidity.call().into_future(),
            fee_growth0.call().into_future(),
            fee_growth1.call().into_future(),
        )?;
        Ok(PoolState {
            sqrt_price_x96: AlloyU256::from(slot0.sqrtPriceX96).into_legacy(),
            tick: tick_from(slot0.tick)?,
            liquidity,
            fee_growth_global0_x128: fee_growth0.into_legacy(),
            fee_growth_global1_x128: fee_growth1.into_legacy(),
        })
    }

    async fn read_position(&self, token_id: U256) -> Result<PositionState, ProtocolError> {
        let manager = INonfungiblePositionManager::new(self.position_manager.into_alloy(), self.provider.clone());
        let positions = manager.positions(token_id.into_alloy());
        let owner_of = manager.ownerOf(token_id.into_alloy());
        let (position, owner) = tokio::try_join!(
            positions.call().into_future(),
            owner_of.call().into_future(),
        )?;
        Ok(PositionState {
            token_id,
            owner: owner.into_legacy(),
            token0: position.token0.into_legacy(),
            token1: position.token1.into_legacy(),
            fee: position.fee.saturating_to::<u32>(),
            tick_lower: tick_from(position.tickLower)?,
            tick_upper: tick_from(position.tickUpper)?,
            liquidity: position.liquidity,
            tokens_owed0: position.tokensOwed0,
            tokens_owed1: position.tokensOwed1,
        })
    }

    async fn transaction_count(&self, account: Address) -> Result<u64, ProtocolError> {
        Ok(self
            .provider
            .get_transaction_count(account.into_alloy())
            .pending()
            .await?)
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ProtocolError> {
        let mut tx = RpcTransactionRequest::default()
            .with_from(request.from.into_alloy())
            .with_to(request.to.into_alloy())
            .with_nonce(request.nonce)
            .with_value(request.value.into_alloy())
            .with_input(request.call.encode()?);
        if let Some(gas) = request.gas_limit {
            tx.set_gas_limit(gas);
        }
        debug!(call = request.call.name(), nonce = request.nonce, "eth_sendTransaction");
        let pending = self.provider.send_transaction(tx).await?;
        Ok(pending.tx_hash().into_legacy())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Duration) -> Result<TransactionReceipt, ProtocolError> {
        let poll = async {
            loop {
                match self.fetch_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {}
                    Err(ProtocolError::Transport(err)) => {
                        warn!(tx = ?tx_hash, error = %err, "receipt poll failed, retrying");
                    }
                    Err(err) => return Err(err),
                }
                tokio::time::sleep(self.receipt_poll_interval).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ProtocolError::Timeout(format!("receipt for {tx_hash:?}")))?
    }
}
