use crate::clock::Clock;
use crate::error::{ExecutionError, with_timeout};
use crate::swap::SwapExecutor;
use async_trait::async_trait;
use clmm_trader_domain::{Amount, MonitorRule};
use clmm_trader_protocols::{RouteQuoter, TxHash};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// What a monitor does once its condition is met.
#[async_trait]
pub trait TriggerAction: Send + Sync {
    /// Acts on a satisfied rule and returns the submitted transaction.
    ///
    /// Must return once the transaction is submitted; confirmation is the
    /// action's own concern.
    async fn fire(&self, rule: &MonitorRule, price: Decimal) -> Result<TxHash, ExecutionError>;
}

/// Quotes and submits the rule's swap, then confirms it on a detached task.
pub struct SwapTrigger {
    quoter: Arc<dyn RouteQuoter>,
    executor: Arc<SwapExecutor>,
    clock: Arc<dyn Clock>,
    deadline_secs: u64,
    call_timeout: Duration,
}

impl SwapTrigger {
    pub fn new(
        quoter: Arc<dyn RouteQuoter>,
        executor: Arc<SwapExecutor>,
        clock: Arc<dyn Clock>,
        deadline_secs: u64,
        call_timeout: Duration,
    ) -> Self {
        Self {
            quoter,
            executor,
            clock,
            deadline_secs,
            call_timeout,
        }
    }
}

#[async_trait]
impl TriggerAction for SwapTrigger {
    async fn fire(&self, rule: &MonitorRule, price: Decimal) -> Result<TxHash, ExecutionError> {
        let amount_in = Amount::new(rule.token_in().clone(), rule.trade_amount);
        let token_out = rule.token_out();
        let deadline = self.clock.now() + self.deadline_secs;

        let quote = with_timeout(
            "quote",
            self.call_timeout,
            self.quoter.quote(&amount_in, token_out, deadline),
        )
        .await?
        .ok_or_else(|| ExecutionError::NoRouteFound {
            token_in: amount_in.token.symbol.clone(),
            token_out: token_out.symbol.clone(),
        })?;

        info!(
            rule = %rule.pair_key,
            direction = %rule.direction,
            %price,
            amount_in = %quote.amount_in,
            expected_out = %quote.amount_out,
            "Trigger met, swapping"
        );
        let pending = self.executor.submit(&quote, rule.slippage).await?;
        let tx_hash = pending.tx_hash;

        let executor = self.executor.clone();
        let pair = rule.pair_key.clone();
        tokio::spawn(async move {
            match executor.confirm(pending).await {
                Ok(result) => info!(
                    rule = %pair,
                    tx = ?result.tx_hash,
                    amount_out = %result.amount_out,
                    "Triggered swap confirmed"
                ),
                Err(err @ ExecutionError::ExecutionReverted { .. }) => {
                    error!(rule = %pair, error = %err, "Triggered swap reverted")
                }
                Err(err) => warn!(rule = %pair, error = %err, "Triggered swap not confirmed"),
            }
        });

        Ok(tx_hash)
    }
}
