use crate::error::DomainError;
use crate::fees::FeeTier;
use crate::token::{Address, Token};
use crate::value_objects::Price;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a pool: canonically ordered token pair plus fee tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub token0: Token,
    pub token1: Token,
    pub fee_tier: FeeTier,
}

impl PoolKey {
    /// Builds a key from tokens in any order; the lower address becomes token0.
    pub fn new(a: Token, b: Token, fee_tier: FeeTier) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::IdenticalTokens(a.symbol));
        }
        let (token0, token1) = if a.sorts_before(&b) { (a, b) } else { (b, a) };
        Ok(Self {
            token0,
            token1,
            fee_tier,
        })
    }

    pub fn involves(&self, token: &Token) -> bool {
        &self.token0 == token || &self.token1 == token
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.token0, self.token1, self.fee_tier)
    }
}

/// Snapshot of a pool's slot and liquidity as read from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub token0: Token,
    pub token1: Token,
    pub fee_tier: FeeTier,
    pub sqrt_price_x96: U256,
    pub tick_current: i32,
    /// In-range liquidity at the current tick.
    pub liquidity: u128,
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
}

impl Pool {
    pub fn key(&self) -> PoolKey {
        PoolKey {
            token0: self.token0.clone(),
            token1: self.token1.clone(),
            fee_tier: self.fee_tier,
        }
    }

    pub fn tick_spacing(&self) -> i32 {
        self.fee_tier.tick_spacing()
    }

    pub fn price(&self) -> Price {
        Price::from_sqrt_price_x96(self.sqrt_price_x96)
    }

    /// token1 per token0, decimal adjusted.
    pub fn token0_price(&self) -> Result<Decimal, DomainError> {
        self.price().to_decimal(&self.token0, &self.token1)
    }

    /// token0 per token1, decimal adjusted.
    pub fn token1_price(&self) -> Result<Decimal, DomainError> {
        self.price().invert()?.to_decimal(&self.token1, &self.token0)
    }

    /// Price of `base` quoted in the other token of the pool.
    pub fn price_of(&self, base: &Token) -> Result<Decimal, DomainError> {
        if base == &self.token0 {
            self.token0_price()
        } else if base == &self.token1 {
            self.token1_price()
        } else {
            Err(DomainError::InvalidPrice(format!(
                "{} is not in pool {}",
                base.symbol,
                self.key()
            )))
        }
    }
}
