//! Position manager.
//!
//! Sizes, mints, decreases and collects positions through the
//! nonfungible position manager contract.

use crate::clock::Clock;
use crate::error::{ExecutionError, with_timeout};
use crate::lifecycle::{EventSink, TradeEvent};
use crate::transaction::TransactionSequencer;
use clmm_trader_domain::{
    Address, DomainError, FeeTier, Percentage, Pool, PoolKey, Position, Price, TokenRegistry,
    price_to_tick, size_position,
};
use clmm_trader_protocols::uniswap::events::{decode_collect, decode_decrease_liquidity, decode_increase_liquidity};
use clmm_trader_protocols::uniswap::{CollectParams, ContractCall, DecreaseLiquidityParams, MintParams};
use clmm_trader_protocols::{PositionState, ProtocolError, TxHash};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A freshly minted position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpened {
    pub position: Position,
    /// Token0 actually deposited.
    pub amount0: U256,
    /// Token1 actually deposited.
    pub amount1: U256,
    pub tx_hash: TxHash,
}

/// Tokens paid out by a collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collected {
    pub amount0: U256,
    pub amount1: U256,
    /// `None` when nothing was owed and no transaction was sent.
    pub tx_hash: Option<TxHash>,
}

/// Outcome of a close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosed {
    pub token_id: U256,
    pub liquidity_removed: u128,
    /// Token0 collected, principal and fees.
    pub amount0: U256,
    /// Token1 collected, principal and fees.
    pub amount1: U256,
    pub decrease_tx: Option<TxHash>,
    pub collect_tx: Option<TxHash>,
}

/// Drives the position manager contract for one signer.
pub struct PositionManager {
    sequencer: Arc<TransactionSequencer>,
    contract: Address,
    clock: Arc<dyn Clock>,
    tokens: TokenRegistry,
    events: EventSink,
}

impl PositionManager {
    pub fn new(
        sequencer: Arc<TransactionSequencer>,
        contract: Address,
        clock: Arc<dyn Clock>,
        tokens: TokenRegistry,
    ) -> Self {
        Self {
            sequencer,
            contract,
            clock,
            tokens,
            events: EventSink::disabled(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    fn deadline(&self) -> u64 {
        self.clock.now() + self.sequencer.config().deadline_secs
    }

    async fn read_state(&self, token_id: U256) -> Result<PositionState, ExecutionError> {
        with_timeout(
            "read position",
            self.sequencer.config().call_timeout,
            self.sequencer.ledger().read_position(token_id),
        )
        .await
    }

    /// Mints a position in `[tick_lower, tick_upper)`.
    ///
    /// The mint reverts if the deposited amounts fall below the sized amounts
    /// reduced by `slippage`; pass [`Percentage::ONE_HUNDRED`] to accept any
    /// price movement.
    pub async fn open_position(
        &self,
        pool: &Pool,
        tick_lower: i32,
        tick_upper: i32,
        amount0: U256,
        amount1: U256,
        slippage: Percentage,
    ) -> Result<PositionOpened, ExecutionError> {
        let sized = size_position(pool, tick_lower, tick_upper, amount0, amount1)?;
        let amount0_min = slippage.min_amount(sized.amount0)?;
        let amount1_min = slippage.min_amount(sized.amount1)?;

        info!(
            pool = ?pool.address,
            tick_lower,
            tick_upper,
            liquidity = sized.liquidity,
            amount0 = %sized.amount0,
            amount1 = %sized.amount1,
            "Opening new position"
        );

        let recipient = self.sequencer.signer();
        let call = ContractCall::Mint(MintParams {
            token0: pool.token0.address,
            token1: pool.token1.address,
            fee: pool.fee_tier.fee(),
            tick_lower,
            tick_upper,
            amount0_desired: amount0,
            amount1_desired: amount1,
            amount0_min,
            amount1_min,
            recipient,
            deadline: self.deadline(),
        });
        let tx_hash = self.sequencer.submit(self.contract, call, None).await?;
        let receipt = self.sequencer.confirm(tx_hash).await?;

        let minted = receipt
            .logs
            .iter()
            .find_map(decode_increase_liquidity)
            .ok_or_else(|| ProtocolError::Decode(format!("no IncreaseLiquidity event in {tx_hash:?}")))?;

        let opened = PositionOpened {
            position: Position {
                token_id: minted.token_id,
                owner: recipient,
                pool: pool.key(),
                tick_lower,
                tick_upper,
                liquidity: minted.liquidity,
                tokens_owed0: 0,
                tokens_owed1: 0,
            },
            amount0: minted.amount0,
            amount1: minted.amount1,
            tx_hash,
        };
        info!(token_id = %opened.position.token_id, liquidity = minted.liquidity, "Position opened");
        self.events.emit(TradeEvent::position_opened(&opened));
        Ok(opened)
    }

    /// Mints a position covering `[min_price, max_price]`, prices given as
    /// token1 per token0.
    pub async fn open_position_in_price_range(
        &self,
        pool: &Pool,
        min_price: Decimal,
        max_price: Decimal,
        amount0: U256,
        amount1: U256,
        slippage: Percentage,
    ) -> Result<PositionOpened, ExecutionError> {
        if min_price >= max_price {
            return Err(DomainError::InvalidPrice(format!(
                "min price {min_price} must be below max price {max_price}"
            ))
            .into());
        }
        let tick_lower = price_to_tick(&Price::from_decimal(min_price, &pool.token0, &pool.token1)?, pool.fee_tier)?;
        let tick_upper = price_to_tick(&Price::from_decimal(max_price, &pool.token0, &pool.token1)?, pool.fee_tier)?;
        debug!(%min_price, %max_price, tick_lower, tick_upper, "price range snapped to ticks");

        self.open_position(pool, tick_lower, tick_upper, amount0, amount1, slippage)
            .await
    }

    /// Removes up to `liquidity` and collects everything owed.
    ///
    /// The decrease is clamped to the liquidity left in the position and
    /// skipped when none is left. If the decrease is confirmed but the collect
    /// fails, the error is [`ExecutionError::CollectPending`]: the caller must
    /// then run [`PositionManager::collect`] alone, since calling this again
    /// would remove another `liquidity`.
    pub async fn close_position(
        &self,
        token_id: U256,
        liquidity: u128,
        amount0_min: U256,
        amount1_min: U256,
    ) -> Result<PositionClosed, ExecutionError> {
        let state = self.read_state(token_id).await?;
        let to_remove = liquidity.min(state.liquidity);

        let decrease_tx = if to_remove > 0 {
            info!(%token_id, liquidity = to_remove, "Decreasing liquidity");
            let call = ContractCall::DecreaseLiquidity(DecreaseLiquidityParams {
                token_id,
                liquidity: to_remove,
                amount0_min,
                amount1_min,
                deadline: self.deadline(),
            });
            let tx_hash = self.sequencer.submit(self.contract, call, None).await?;
            let receipt = self.sequencer.confirm(tx_hash).await?;
            if let Some(change) = receipt.logs.iter().find_map(decode_decrease_liquidity) {
                debug!(%token_id, amount0 = %change.amount0, amount1 = %change.amount1, "liquidity decreased");
            }
            Some(tx_hash)
        } else {
            debug!(%token_id, "no liquidity left, skipping decrease");
            None
        };

        let collected = match (self.collect(token_id).await, decrease_tx) {
            (Ok(collected), _) => collected,
            (Err(err), Some(decrease_tx)) => {
                warn!(%token_id, tx = ?decrease_tx, error = %err, "liquidity removed but collect failed");
                return Err(ExecutionError::CollectPending {
                    token_id,
                    decrease_tx,
                    source: Box::new(err),
                });
            }
            (Err(err), None) => return Err(err),
        };
        let closed = PositionClosed {
            token_id,
            liquidity_removed: to_remove,
            amount0: collected.amount0,
            amount1: collected.amount1,
            decrease_tx,
            collect_tx: collected.tx_hash,
        };
        info!(
            %token_id,
            liquidity_removed = to_remove,
            amount0 = %closed.amount0,
            amount1 = %closed.amount1,
            "Position closed"
        );
        self.events.emit(TradeEvent::position_closed(&closed));
        Ok(closed)
    }

    /// Collects all tokens owed to the position. With nothing owed this
    /// succeeds with zero amounts.
    pub async fn collect(&self, token_id: U256) -> Result<Collected, ExecutionError> {
        let state = self.read_state(token_id).await?;
        // Fees still inside the pool can only accrue while liquidity remains.
        if state.liquidity == 0 && state.tokens_owed0 == 0 && state.tokens_owed1 == 0 {
            debug!(%token_id, "nothing owed");
            return Ok(Collected {
                amount0: U256::zero(),
                amount1: U256::zero(),
                tx_hash: None,
            });
        }

        let call = ContractCall::Collect(CollectParams {
            token_id,
            recipient: self.sequencer.signer(),
            amount0_max: u128::MAX,
            amount1_max: u128::MAX,
        });
        let tx_hash = self.sequencer.submit(self.contract, call, None).await?;
        let receipt = self.sequencer.confirm(tx_hash).await?;
        let (amount0, amount1) = receipt
            .logs
            .iter()
            .find_map(decode_collect)
            .map(|c| (c.amount0, c.amount1))
            .unwrap_or_default();
        info!(%token_id, %amount0, %amount1, "Collected");
        Ok(Collected {
            amount0,
            amount1,
            tx_hash: Some(tx_hash),
        })
    }

    /// Reads a position from the ledger, binding its tokens through the registry.
    pub async fn position(&self, token_id: U256) -> Result<Position, ExecutionError> {
        let state = self.read_state(token_id).await?;
        let resolve = |address: &Address| {
            self.tokens.by_address(address).cloned().ok_or_else(|| {
                ExecutionError::Configuration(format!("position {token_id} uses unknown token {address:?}"))
            })
        };
        let pool = PoolKey::new(
            resolve(&state.token0)?,
            resolve(&state.token1)?,
            FeeTier::from_fee(state.fee)?,
        )?;
        Ok(Position {
            token_id,
            owner: state.owner,
            pool,
            tick_lower: state.tick_lower,
            tick_upper: state.tick_upper,
            liquidity: state.liquidity,
            tokens_owed0: state.tokens_owed0,
            tokens_owed1: state.tokens_owed1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ExecutionConfig;
    use crate::test_support::{MockLedger, e18, pool_at_tick, position_manager, signer, token_a, token_b};
    use clmm_trader_domain::PositionStatus;
    use rust_decimal_macros::dec;

    fn manager(ledger: Arc<MockLedger>) -> PositionManager {
        let sequencer = Arc::new(TransactionSequencer::new(ledger, signer(), ExecutionConfig::default()));
        let tokens: TokenRegistry = [token_a(), token_b()].into_iter().collect();
        PositionManager::new(sequencer, position_manager(), Arc::new(ManualClock::new(1_000)), tokens)
    }

    #[tokio::test]
    async fn test_open_position_mints_sized_amounts() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());

        let opened = pm
            .open_position(&pool_at_tick(0), -600, 600, e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap();

        assert_eq!(opened.position.token_id, U256::one());
        assert!(opened.position.liquidity > 0);
        assert!(opened.amount0 <= e18(1));
        assert!(opened.amount1 <= e18(1));
        assert_eq!(opened.position.status(0), PositionStatus::InRange);

        match &ledger.submitted_calls()[0] {
            ContractCall::Mint(p) => {
                assert_eq!(p.deadline, 1_000 + 20 * 60);
                assert!(p.amount0_min > U256::zero());
                assert!(p.amount0_min < opened.amount0);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mint_slippage_guard() {
        // Sized against tick 0, but the pool has moved to tick -300 by the time
        // the mint lands.
        let stale = pool_at_tick(0);
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(-300)));
        let pm = manager(ledger.clone());

        let err = pm
            .open_position(&stale, -600, 600, e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap_err();
        match err {
            ExecutionError::ExecutionReverted { reason, .. } => assert_eq!(reason, "Price slippage check"),
            other => panic!("unexpected error {other:?}"),
        }

        let opened = pm
            .open_position(&stale, -600, 600, e18(1), e18(1), Percentage::ONE_HUNDRED)
            .await
            .unwrap();
        assert!(opened.position.liquidity > 0);
    }

    #[tokio::test]
    async fn test_open_rejects_misaligned_range_before_submitting() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());

        let err = pm
            .open_position(&pool_at_tick(0), -610, 600, e18(1), e18(1), Percentage::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Domain(DomainError::InvalidTickRange { .. })));
        assert!(ledger.submitted_calls().is_empty());
    }

    #[tokio::test]
    async fn test_open_in_price_range() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());

        let opened = pm
            .open_position_in_price_range(&pool_at_tick(0), dec!(0.95), dec!(1.05), e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap();
        // ln(0.95)/ln(1.0001) = -513 -> -540; ln(1.05)/ln(1.0001) = 487 -> 480
        assert_eq!(opened.position.tick_lower, -540);
        assert_eq!(opened.position.tick_upper, 480);

        assert!(
            pm.open_position_in_price_range(&pool_at_tick(0), dec!(2), dec!(1), e18(1), e18(1), Percentage::ZERO)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_close_twice_second_collect_is_zero() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());
        let opened = pm
            .open_position(&pool_at_tick(0), -600, 600, e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap();
        let token_id = opened.position.token_id;

        let first = pm
            .close_position(token_id, u128::MAX, U256::zero(), U256::zero())
            .await
            .unwrap();
        assert_eq!(first.liquidity_removed, opened.position.liquidity);
        assert!(first.amount0 > U256::zero());
        assert!(first.amount1 > U256::zero());
        assert!(first.decrease_tx.is_some());

        let second = pm
            .close_position(token_id, u128::MAX, U256::zero(), U256::zero())
            .await
            .unwrap();
        assert_eq!(second.liquidity_removed, 0);
        assert_eq!(second.amount0, U256::zero());
        assert_eq!(second.amount1, U256::zero());
        assert!(second.decrease_tx.is_none());

        let state = ledger.position_state(token_id).unwrap();
        assert_eq!(state.liquidity, 0);
        assert_eq!((state.tokens_owed0, state.tokens_owed1), (0, 0));
    }

    #[tokio::test]
    async fn test_partial_close_then_report() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());
        let opened = pm
            .open_position(&pool_at_tick(0), -600, 600, e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap();
        let half = opened.position.liquidity / 2;

        let closed = pm
            .close_position(opened.position.token_id, half, U256::zero(), U256::zero())
            .await
            .unwrap();
        assert_eq!(closed.liquidity_removed, half);

        let position = pm.position(opened.position.token_id).await.unwrap();
        assert_eq!(position.liquidity, opened.position.liquidity - half);
        assert_eq!(position.owner, signer());
        assert_eq!(position.pool, pool_at_tick(0).key());
    }

    #[tokio::test]
    async fn test_failed_collect_after_partial_decrease_is_collect_pending() {
        let ledger = Arc::new(MockLedger::new().with_pool(pool_at_tick(0)));
        let pm = manager(ledger.clone());
        let opened = pm
            .open_position(&pool_at_tick(0), -600, 600, e18(1), e18(1), Percentage::from_bps(50).unwrap())
            .await
            .unwrap();
        let token_id = opened.position.token_id;
        let minted = opened.position.liquidity;
        let half = minted / 2;

        ledger.fail_next_submit_of("collect");
        let err = pm
            .close_position(token_id, half, U256::zero(), U256::zero())
            .await
            .unwrap_err();
        let decrease_tx = match err {
            ExecutionError::CollectPending { token_id: id, decrease_tx, .. } => {
                assert_eq!(id, token_id);
                decrease_tx
            }
            other => panic!("unexpected error {other:?}"),
        };
        assert_ne!(decrease_tx, TxHash::zero());

        let state = ledger.position_state(token_id).unwrap();
        assert_eq!(state.liquidity, minted - half);
        assert!(state.tokens_owed0 > 0 || state.tokens_owed1 > 0);

        // Recovery collects without touching the remaining liquidity.
        let collected = pm.collect(token_id).await.unwrap();
        assert!(collected.amount0 > U256::zero() || collected.amount1 > U256::zero());
        let state = ledger.position_state(token_id).unwrap();
        assert_eq!(state.liquidity, minted - half);
        assert_eq!((state.tokens_owed0, state.tokens_owed1), (0, 0));
        let decreases = ledger
            .submitted_calls()
            .iter()
            .filter(|call| matches!(call, ContractCall::DecreaseLiquidity(_)))
            .count();
        assert_eq!(decreases, 1);
    }

    #[tokio::test]
    async fn test_unknown_position_is_ledger_error() {
        let pm = manager(Arc::new(MockLedger::new()));
        let err = pm.position(U256::from(99u8)).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Ledger(ProtocolError::Reverted(_))));
    }
}
