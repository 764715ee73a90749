//! In-memory ledger and quoter used by the unit tests.

use async_trait::async_trait;
use clmm_trader_domain::math::liquidity::get_amounts_for_liquidity;
use clmm_trader_domain::math::tick_math::get_sqrt_ratio_at_tick;
use clmm_trader_domain::{
    Address, Amount, FeeTier, Pool, Quote, Route, RouteHop, Token, parse_address, size_position,
};
use clmm_trader_protocols::uniswap::ContractCall;
use clmm_trader_protocols::uniswap::events::{
    Collected, LiquidityChange, Transfer, collect_log, decrease_liquidity_log, increase_liquidity_log,
    transfer_log,
};
use clmm_trader_protocols::{
    Ledger, Log, PoolState, PositionState, ProtocolError, RouteQuoter, TransactionReceipt,
    TransactionRequest, TxHash,
};
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn signer() -> Address {
    Address::repeat_byte(0x5e)
}

pub fn position_manager() -> Address {
    Address::repeat_byte(0xc3)
}

pub fn router() -> Address {
    Address::repeat_byte(0xe5)
}

pub fn token_a() -> Token {
    Token::new(1, parse_address("0x0000000000000000000000000000000000000a0a").unwrap(), 18, "AAA", "Token A")
}

pub fn token_b() -> Token {
    Token::new(1, parse_address("0x0000000000000000000000000000000000000b0b").unwrap(), 18, "BBB", "Token B")
}

pub fn pool_address() -> Address {
    Address::repeat_byte(0x90)
}

/// A/B pool, 0.3% tier, sitting exactly on `tick`.
pub fn pool_at_tick(tick: i32) -> Pool {
    Pool {
        address: pool_address(),
        token0: token_a(),
        token1: token_b(),
        fee_tier: FeeTier::MEDIUM,
        sqrt_price_x96: get_sqrt_ratio_at_tick(tick).unwrap(),
        tick_current: tick,
        liquidity: 10u128.pow(24),
        fee_growth_global0_x128: U256::zero(),
        fee_growth_global1_x128: U256::zero(),
    }
}

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

#[derive(Default)]
struct State {
    base_count: u64,
    submitted: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    pools: HashMap<Address, Pool>,
    positions: HashMap<U256, PositionState>,
    next_token_id: u64,
    fail_next_submit: bool,
    fail_call: Option<&'static str>,
    swap_output: Option<U256>,
}

/// Ledger that executes position manager and router calls against
/// in-memory pools.
pub struct MockLedger {
    state: Mutex<State>,
    receipt_delay: Duration,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_token_id: 1,
                ..State::default()
            }),
            receipt_delay: Duration::ZERO,
        }
    }

    pub fn with_receipt_delay(mut self, delay: Duration) -> Self {
        self.receipt_delay = delay;
        self
    }

    pub fn with_pool(self, pool: Pool) -> Self {
        self.set_pool(pool);
        self
    }

    pub fn set_pool(&self, pool: Pool) {
        self.state.lock().unwrap().pools.insert(pool.address, pool);
    }

    pub fn set_transaction_count(&self, count: u64) {
        self.state.lock().unwrap().base_count = count;
    }

    pub fn fail_next_submit(&self) {
        self.state.lock().unwrap().fail_next_submit = true;
    }

    /// Rejects the next submission of the named call, e.g. `"collect"`.
    pub fn fail_next_submit_of(&self, name: &'static str) {
        self.state.lock().unwrap().fail_call = Some(name);
    }

    /// Realized output of every following swap.
    pub fn set_swap_output(&self, amount: U256) {
        self.state.lock().unwrap().swap_output = Some(amount);
    }

    pub fn submitted_nonces(&self) -> Vec<u64> {
        self.state.lock().unwrap().submitted.iter().map(|r| r.nonce).collect()
    }

    pub fn submitted_calls(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().submitted.iter().map(|r| r.call.clone()).collect()
    }

    pub fn position_state(&self, token_id: U256) -> Option<PositionState> {
        self.state.lock().unwrap().positions.get(&token_id).cloned()
    }

    fn execute(state: &mut State, request: &TransactionRequest) -> Result<Vec<Log>, String> {
        match &request.call {
            ContractCall::Mint(p) => {
                let pool = state
                    .pools
                    .values()
                    .find(|pool| {
                        pool.token0.address == p.token0
                            && pool.token1.address == p.token1
                            && pool.fee_tier.fee() == p.fee
                    })
                    .cloned()
                    .ok_or("pool not found")?;
                let sized = size_position(&pool, p.tick_lower, p.tick_upper, p.amount0_desired, p.amount1_desired)
                    .map_err(|e| e.to_string())?;
                if sized.amount0 < p.amount0_min || sized.amount1 < p.amount1_min {
                    return Err("Price slippage check".into());
                }
                let token_id = U256::from(state.next_token_id);
                state.next_token_id += 1;
                state.positions.insert(
                    token_id,
                    PositionState {
                        token_id,
                        owner: p.recipient,
                        token0: p.token0,
                        token1: p.token1,
                        fee: p.fee,
                        tick_lower: p.tick_lower,
                        tick_upper: p.tick_upper,
                        liquidity: sized.liquidity,
                        tokens_owed0: 0,
                        tokens_owed1: 0,
                    },
                );
                Ok(vec![increase_liquidity_log(
                    request.to,
                    &LiquidityChange {
                        token_id,
                        liquidity: sized.liquidity,
                        amount0: sized.amount0,
                        amount1: sized.amount1,
                    },
                )])
            }
            ContractCall::DecreaseLiquidity(p) => {
                let pools = state.pools.clone();
                let position = state.positions.get_mut(&p.token_id).ok_or("Invalid token ID")?;
                if p.liquidity == 0 || p.liquidity > position.liquidity {
                    return Err("liquidity".into());
                }
                let pool = pools
                    .values()
                    .find(|pool| pool.token0.address == position.token0 && pool.fee_tier.fee() == position.fee)
                    .ok_or("pool not found")?;
                let (amount0, amount1) = get_amounts_for_liquidity(
                    pool.sqrt_price_x96,
                    get_sqrt_ratio_at_tick(position.tick_lower).map_err(|e| e.to_string())?,
                    get_sqrt_ratio_at_tick(position.tick_upper).map_err(|e| e.to_string())?,
                    p.liquidity,
                )
                .map_err(|e| e.to_string())?;
                if amount0 < p.amount0_min || amount1 < p.amount1_min {
                    return Err("Price slippage check".into());
                }
                position.liquidity -= p.liquidity;
                position.tokens_owed0 += amount0.low_u128();
                position.tokens_owed1 += amount1.low_u128();
                Ok(vec![decrease_liquidity_log(
                    request.to,
                    &LiquidityChange {
                        token_id: p.token_id,
                        liquidity: p.liquidity,
                        amount0,
                        amount1,
                    },
                )])
            }
            ContractCall::Collect(p) => {
                let position = state.positions.get_mut(&p.token_id).ok_or("Invalid token ID")?;
                let amount0 = position.tokens_owed0.min(p.amount0_max);
                let amount1 = position.tokens_owed1.min(p.amount1_max);
                position.tokens_owed0 -= amount0;
                position.tokens_owed1 -= amount1;
                Ok(vec![collect_log(
                    request.to,
                    &Collected {
                        token_id: p.token_id,
                        recipient: p.recipient,
                        amount0: U256::from(amount0),
                        amount1: U256::from(amount1),
                    },
                )])
            }
            ContractCall::ExactInputSingle(p) => {
                let out = state.swap_output.unwrap_or(p.amount_in);
                if out < p.amount_out_minimum {
                    return Err("Too little received".into());
                }
                Ok(vec![transfer_log(&Transfer {
                    token: p.token_out,
                    from: pool_address(),
                    to: p.recipient,
                    value: out,
                })])
            }
            ContractCall::ExactInput(p) => {
                let out = state.swap_output.unwrap_or(p.amount_in);
                if out < p.amount_out_minimum {
                    return Err("Too little received".into());
                }
                let token_out = Address::from_slice(&p.path[p.path.len() - 20..]);
                Ok(vec![transfer_log(&Transfer {
                    token: token_out,
                    from: pool_address(),
                    to: p.recipient,
                    value: out,
                })])
            }
        }
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn read_pool_state(&self, pool: Address) -> Result<PoolState, ProtocolError> {
        let state = self.state.lock().unwrap();
        let pool = state
            .pools
            .get(&pool)
            .ok_or_else(|| ProtocolError::Reverted("no pool".into()))?;
        Ok(PoolState {
            sqrt_price_x96: pool.sqrt_price_x96,
            tick: pool.tick_current,
            liquidity: pool.liquidity,
            fee_growth_global0_x128: pool.fee_growth_global0_x128,
            fee_growth_global1_x128: pool.fee_growth_global1_x128,
        })
    }

    async fn read_position(&self, token_id: U256) -> Result<PositionState, ProtocolError> {
        self.position_state(token_id)
            .ok_or_else(|| ProtocolError::Reverted("Invalid token ID".into()))
    }

    async fn transaction_count(&self, _account: Address) -> Result<u64, ProtocolError> {
        let state = self.state.lock().unwrap();
        Ok(state.base_count + state.submitted.len() as u64)
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<TxHash, ProtocolError> {
        let mut state = self.state.lock().unwrap();
        let call_fails = state.fail_call == Some(request.call.name());
        if call_fails {
            state.fail_call = None;
        }
        if std::mem::take(&mut state.fail_next_submit) || call_fails {
            return Err(ProtocolError::Rpc {
                code: -32000,
                message: "nonce too low".into(),
            });
        }
        state.submitted.push(request.clone());
        let tx_hash = TxHash::from_low_u64_be(state.submitted.len() as u64);
        let receipt = match Self::execute(&mut state, request) {
            Ok(logs) => TransactionReceipt {
                tx_hash,
                status: true,
                gas_used: 120_000,
                logs,
                revert_reason: None,
            },
            Err(reason) => TransactionReceipt {
                tx_hash,
                status: false,
                gas_used: 40_000,
                logs: Vec::new(),
                revert_reason: Some(reason),
            },
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Duration) -> Result<TransactionReceipt, ProtocolError> {
        if self.receipt_delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(ProtocolError::Timeout(format!("receipt for {tx_hash:?}")));
        }
        tokio::time::sleep(self.receipt_delay).await;
        self.state
            .lock()
            .unwrap()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ProtocolError::Timeout(format!("receipt for {tx_hash:?}")))
    }
}

/// Quotes every swap at a fixed rate through the test pool.
pub struct FixedRateQuoter {
    /// Output per unit of input, as numerator / denominator.
    pub rate: (u64, u64),
    pub available: bool,
}

impl FixedRateQuoter {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            rate: (numerator, denominator),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            rate: (1, 1),
            available: false,
        }
    }
}

#[async_trait]
impl RouteQuoter for FixedRateQuoter {
    async fn quote(&self, amount_in: &Amount, token_out: &Token, deadline: u64) -> Result<Option<Quote>, ProtocolError> {
        if !self.available {
            return Ok(None);
        }
        let out = amount_in.raw * U256::from(self.rate.0) / U256::from(self.rate.1);
        Ok(Some(Quote {
            amount_in: amount_in.clone(),
            amount_out: Amount::new(token_out.clone(), out),
            route: Route::single(RouteHop {
                pool: pool_address(),
                token_in: amount_in.token.clone(),
                token_out: token_out.clone(),
                fee_tier: FeeTier::MEDIUM,
            }),
            estimated_gas: 160_000,
            deadline,
        }))
    }
}
