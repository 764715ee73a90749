use crate::config::ExecutionConfig;
use crate::error::{ExecutionError, with_timeout};
use clmm_trader_domain::Address;
use clmm_trader_protocols::uniswap::ContractCall;
use clmm_trader_protocols::{Ledger, TransactionReceipt, TransactionRequest, TxHash};
use primitive_types::U256;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Single owner of the signer's nonce stream.
///
/// Submissions are serialized so concurrent callers never race for a nonce.
/// The first submission syncs the nonce from the node's pending count; a
/// failed submission drops the cached nonce so the next one re-syncs.
pub struct TransactionSequencer {
    ledger: Arc<dyn Ledger>,
    signer: Address,
    config: ExecutionConfig,
    next_nonce: Mutex<Option<u64>>,
}

impl TransactionSequencer {
    pub fn new(ledger: Arc<dyn Ledger>, signer: Address, config: ExecutionConfig) -> Self {
        Self {
            ledger,
            signer,
            config,
            next_nonce: Mutex::new(None),
        }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Assigns the next nonce and broadcasts `call` to `to`.
    pub async fn submit(
        &self,
        to: Address,
        call: ContractCall,
        gas_limit: Option<u64>,
    ) -> Result<TxHash, ExecutionError> {
        let mut next = self.next_nonce.lock().await;
        let nonce = match *next {
            Some(nonce) => nonce,
            None => {
                let synced = with_timeout(
                    "transaction count",
                    self.config.call_timeout,
                    self.ledger.transaction_count(self.signer),
                )
                .await?;
                debug!(signer = ?self.signer, nonce = synced, "synced nonce from node");
                synced
            }
        };

        let request = TransactionRequest {
            from: self.signer,
            to,
            nonce,
            call,
            value: U256::zero(),
            gas_limit,
        };
        let method = request.call.name();

        match with_timeout(
            "submit transaction",
            self.config.call_timeout,
            self.ledger.submit_transaction(&request),
        )
        .await
        {
            Ok(tx_hash) => {
                *next = Some(nonce + 1);
                info!(method, nonce, tx = ?tx_hash, "transaction submitted");
                Ok(tx_hash)
            }
            Err(err) => {
                *next = None;
                warn!(method, nonce, error = %err, "submission failed, nonce released");
                Err(err)
            }
        }
    }

    /// Waits for the receipt; a reverted transaction becomes
    /// [`ExecutionError::ExecutionReverted`].
    pub async fn confirm(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ExecutionError> {
        let receipt = self
            .ledger
            .wait_for_receipt(tx_hash, self.config.receipt_timeout)
            .await?;
        if !receipt.status {
            let reason = receipt
                .revert_reason
                .clone()
                .unwrap_or_else(|| "reverted without reason".to_string());
            error!(tx = ?tx_hash, %reason, "transaction reverted");
            return Err(ExecutionError::ExecutionReverted { tx_hash, reason });
        }
        debug!(tx = ?tx_hash, gas_used = receipt.gas_used, "transaction confirmed");
        Ok(receipt)
    }

    /// Forgets the cached nonce; the next submission re-syncs from the node.
    pub async fn reset(&self) {
        *self.next_nonce.lock().await = None;
    }
}
