use crate::error::ExecutionError;
use async_trait::async_trait;
use clmm_trader_domain::MonitorRule;
use clmm_trader_protocols::PoolOracle;
use rust_decimal::Decimal;

/// Price source for a monitor rule.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price of the rule's base token in its quote token.
    async fn price(&self, rule: &MonitorRule) -> Result<Decimal, ExecutionError>;
}

/// Reads prices from pool state.
pub struct OraclePriceFeed {
    oracle: PoolOracle,
}

impl OraclePriceFeed {
    pub fn new(oracle: PoolOracle) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl PriceFeed for OraclePriceFeed {
    async fn price(&self, rule: &MonitorRule) -> Result<Decimal, ExecutionError> {
        let key = rule.pool_key()?;
        self.oracle
            .price_of(&key, rule.pool_address, &rule.base)
            .await
            .map_err(|e| ExecutionError::OracleRead(e.to_string()))
    }
}
