//! Pool price reads.

use crate::error::ProtocolError;
use crate::ledger::Ledger;
use clmm_trader_domain::{Address, FeeTier, Pool, PoolKey, Token};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Human-readable snapshot of a pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolInfo {
    pub address: Address,
    pub token0: String,
    pub token1: String,
    pub fee_tier: FeeTier,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    /// token1 per token0.
    pub token0_price: Decimal,
    /// token0 per token1.
    pub token1_price: Decimal,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
}

impl fmt::Display for PoolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pool          {:?}", self.address)?;
        writeln!(f, "pair          {}/{} {}", self.token0, self.token1, self.fee_tier)?;
        writeln!(f, "sqrtPriceX96  {}", self.sqrt_price_x96)?;
        writeln!(f, "tick          {}", self.tick)?;
        writeln!(f, "liquidity     {}", self.liquidity)?;
        writeln!(f, "{} price    {} {}", self.token0, self.token0_price, self.token1)?;
        write!(f, "{} price    {} {}", self.token1, self.token1_price, self.token0)
    }
}

/// Reads pool state from the ledger and binds it to known tokens.
#[derive(Clone)]
pub struct PoolOracle {
    ledger: Arc<dyn Ledger>,
}

impl PoolOracle {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Current state of the pool at `address` identified by `key`.
    pub async fn read_pool(&self, key: &PoolKey, address: Address) -> Result<Pool, ProtocolError> {
        let state = self.ledger.read_pool_state(address).await?;
        if state.sqrt_price_x96.is_zero() {
            return Err(ProtocolError::Decode(format!("pool {address:?} is not initialized")));
        }
        debug!(pool = ?address, tick = state.tick, liquidity = state.liquidity, "pool state");
        Ok(Pool {
            address,
            token0: key.token0.clone(),
            token1: key.token1.clone(),
            fee_tier: key.fee_tier,
            sqrt_price_x96: state.sqrt_price_x96,
            tick_current: state.tick,
            liquidity: state.liquidity,
            fee_growth_global0_x128: state.fee_growth_global0_x128,
            fee_growth_global1_x128: state.fee_growth_global1_x128,
        })
    }

    /// Price of `base` in the pool's other token.
    pub async fn price_of(&self, key: &PoolKey, address: Address, base: &Token) -> Result<Decimal, ProtocolError> {
        let pool = self.read_pool(key, address).await?;
        pool.price_of(base)
            .map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    pub async fn pool_info(&self, key: &PoolKey, address: Address) -> Result<PoolInfo, ProtocolError> {
        let pool = self.read_pool(key, address).await?;
        let decode = |e: clmm_trader_domain::DomainError| ProtocolError::Decode(e.to_string());
        Ok(PoolInfo {
            address,
            token0: pool.token0.symbol.clone(),
            token1: pool.token1.symbol.clone(),
            fee_tier: pool.fee_tier,
            sqrt_price_x96: pool.sqrt_price_x96,
            tick: pool.tick_current,
            liquidity: pool.liquidity,
            token0_price: pool.token0_price().map_err(decode)?,
            token1_price: pool.token1_price().map_err(decode)?,
            fee_growth_global0_x128: pool.fee_growth_global0_x128,
            fee_growth_global1_x128: pool.fee_growth_global1_x128,
        })
    }
}
