use crate::clock::Clock;
use crate::error::ExecutionError;
use crate::lifecycle::{EventSink, TradeEvent};
use crate::transaction::TransactionSequencer;
use clmm_trader_domain::{Address, Amount, Percentage, Quote};
use clmm_trader_protocols::TxHash;
use clmm_trader_protocols::uniswap::events::received_amount;
use clmm_trader_protocols::uniswap::{ContractCall, ExactInputParams, ExactInputSingleParams, encode_path};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Lowest output accepted for `quote` under `slippage`, rounded down.
pub fn min_amount_out(quote: &Quote, slippage: Percentage) -> Result<U256, ExecutionError> {
    Ok(slippage.min_amount(quote.amount_out.raw)?)
}

/// A swap broadcast but not yet mined.
#[derive(Debug, Clone)]
pub struct PendingSwap {
    pub tx_hash: TxHash,
    pub quote: Quote,
    pub amount_out_min: U256,
}

/// A mined swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResult {
    pub tx_hash: TxHash,
    pub amount_in: Amount,
    /// Output actually received by the signer.
    pub amount_out: Amount,
    pub amount_out_min: U256,
    pub gas_used: u64,
}

/// Turns quotes into router transactions.
pub struct SwapExecutor {
    sequencer: Arc<TransactionSequencer>,
    router: Address,
    clock: Arc<dyn Clock>,
    events: EventSink,
}

impl SwapExecutor {
    pub fn new(sequencer: Arc<TransactionSequencer>, router: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            sequencer,
            router,
            clock,
            events: EventSink::disabled(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn signer(&self) -> Address {
        self.sequencer.signer()
    }

    fn build_call(&self, quote: &Quote, amount_out_min: U256) -> ContractCall {
        let recipient = self.sequencer.signer();
        match quote.route.hops.as_slice() {
            [hop] => ContractCall::ExactInputSingle(ExactInputSingleParams {
                token_in: hop.token_in.address,
                token_out: hop.token_out.address,
                fee: hop.fee_tier.fee(),
                recipient,
                deadline: quote.deadline,
                amount_in: quote.amount_in.raw,
                amount_out_minimum: amount_out_min,
                sqrt_price_limit_x96: U256::zero(),
            }),
            _ => ContractCall::ExactInput(ExactInputParams {
                path: encode_path(&quote.route),
                recipient,
                deadline: quote.deadline,
                amount_in: quote.amount_in.raw,
                amount_out_minimum: amount_out_min,
            }),
        }
    }

    /// Validates the quote and broadcasts the swap without waiting for it to be mined.
    pub async fn submit(&self, quote: &Quote, slippage: Percentage) -> Result<PendingSwap, ExecutionError> {
        let now = self.clock.now();
        if quote.is_expired(now) {
            return Err(ExecutionError::QuoteExpired {
                deadline: quote.deadline,
                now,
            });
        }
        if !quote.is_executable() {
            return Err(ExecutionError::RouteUnavailable(format!(
                "{} hop route does not connect {} to {}",
                quote.route.hops.len(),
                quote.amount_in.token,
                quote.amount_out.token
            )));
        }

        let amount_out_min = min_amount_out(quote, slippage)?;
        info!(
            amount_in = %quote.amount_in,
            expected_out = %quote.amount_out,
            min_out = %amount_out_min,
            hops = quote.route.hops.len(),
            "Submitting swap"
        );
        let call = self.build_call(quote, amount_out_min);
        let tx_hash = self
            .sequencer
            .submit(self.router, call, Some(quote.estimated_gas))
            .await?;

        self.events.emit(TradeEvent::swap_submitted(tx_hash, quote));
        Ok(PendingSwap {
            tx_hash,
            quote: quote.clone(),
            amount_out_min,
        })
    }

    /// Waits for a submitted swap to be mined.
    pub async fn confirm(&self, pending: PendingSwap) -> Result<SwapResult, ExecutionError> {
        let receipt = match self.sequencer.confirm(pending.tx_hash).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.events.emit(TradeEvent::failure(Some(pending.tx_hash), &err));
                return Err(err);
            }
        };

        let token_out = pending.quote.amount_out.token.clone();
        let received = received_amount(&receipt.logs, &token_out.address, &self.sequencer.signer());
        if received.is_zero() {
            warn!(tx = ?pending.tx_hash, "no output transfer found in receipt");
        }
        let result = SwapResult {
            tx_hash: pending.tx_hash,
            amount_in: pending.quote.amount_in,
            amount_out: Amount::new(token_out, received),
            amount_out_min: pending.amount_out_min,
            gas_used: receipt.gas_used,
        };
        info!(
            tx = ?result.tx_hash,
            amount_out = %result.amount_out,
            gas_used = result.gas_used,
            "Swap confirmed"
        );
        self.events.emit(TradeEvent::swap_confirmed(&result));
        Ok(result)
    }

    /// Submits and waits for the receipt.
    pub async fn execute(&self, quote: &Quote, slippage: Percentage) -> Result<SwapResult, ExecutionError> {
        let pending = self.submit(quote, slippage).await?;
        self.confirm(pending).await
    }
}
