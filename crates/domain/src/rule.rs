use crate::error::DomainError;
use crate::fees::FeeTier;
use crate::pool::PoolKey;
use crate::token::{Address, Token};
use crate::value_objects::Percentage;
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Side of a price-triggered trade, from the base token's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Spend the quote token to acquire base once the price falls to the target.
    Buy,
    /// Spend the base token once the price rises to the target.
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

/// How repeated satisfied polls are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Fire on every poll while the condition holds.
    Level,
    /// Fire once per false-to-true transition of the condition.
    #[default]
    Edge,
}

/// A price watch on one pool that trades when the target is crossed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorRule {
    /// Human label for the pair, e.g. `WETH/USDC`.
    pub pair_key: String,
    pub pool_address: Address,
    /// Token whose price is watched.
    pub base: Token,
    /// Token the price is expressed in.
    pub quote: Token,
    pub fee_tier: FeeTier,
    /// Quote tokens per base token.
    pub target_price: Decimal,
    pub direction: Direction,
    /// Raw amount of the token spent (quote for buys, base for sells).
    pub trade_amount: U256,
    pub poll_interval_ms: u64,
    pub trigger_mode: TriggerMode,
    pub slippage: Percentage,
}

impl MonitorRule {
    /// Checks the invariants a rule must hold before a monitor is started.
    pub fn validate(&self) -> Result<(), DomainError> {
        // Canonical ordering check doubles as the identical-token check.
        PoolKey::new(self.base.clone(), self.quote.clone(), self.fee_tier)?;
        if self.target_price <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!(
                "target price must be positive, got {}",
                self.target_price
            )));
        }
        if self.trade_amount.is_zero() {
            return Err(DomainError::InsufficientAmount);
        }
        if self.poll_interval_ms == 0 {
            return Err(DomainError::OutOfRange("poll interval must be positive".into()));
        }
        Ok(())
    }

    pub fn pool_key(&self) -> Result<PoolKey, DomainError> {
        PoolKey::new(self.base.clone(), self.quote.clone(), self.fee_tier)
    }

    pub fn is_satisfied(&self, price: Decimal) -> bool {
        match self.direction {
            Direction::Buy => price <= self.target_price,
            Direction::Sell => price >= self.target_price,
        }
    }

    pub fn token_in(&self) -> &Token {
        match self.direction {
            Direction::Buy => &self.quote,
            Direction::Sell => &self.base,
        }
    }

    pub fn token_out(&self) -> &Token {
        match self.direction {
            Direction::Buy => &self.base,
            Direction::Sell => &self.quote,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_address;
    use rust_decimal_macros::dec;

    fn rule(direction: Direction) -> MonitorRule {
        MonitorRule {
            pair_key: "WETH/USDC".into(),
            pool_address: Address::zero(),
            base: Token::new(
                1,
                parse_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap(),
                18,
                "WETH",
                "Wrapped Ether",
            ),
            quote: Token::new(
                1,
                parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap(),
                6,
                "USDC",
                "USD Coin",
            ),
            fee_tier: FeeTier::MEDIUM,
            target_price: dec!(3000),
            direction,
            trade_amount: U256::from(1_000_000_000u64),
            poll_interval_ms: 1_000,
            trigger_mode: TriggerMode::default(),
            slippage: Percentage::from_bps(50).unwrap(),
        }
    }

    #[test]
    fn test_buy_condition() {
        let r = rule(Direction::Buy);
        assert!(!r.is_satisfied(dec!(3000.01)));
        assert!(r.is_satisfied(dec!(3000)));
        assert!(r.is_satisfied(dec!(2990)));
        assert_eq!(r.token_in().symbol, "USDC");
        assert_eq!(r.token_out().symbol, "WETH");
    }

    #[test]
    fn test_sell_condition() {
        let r = rule(Direction::Sell);
        assert!(!r.is_satisfied(dec!(2999.99)));
        assert!(r.is_satisfied(dec!(3000)));
        assert_eq!(r.token_in().symbol, "WETH");
    }

    #[test]
    fn test_validate() {
        assert!(rule(Direction::Buy).validate().is_ok());
        assert_eq!(TriggerMode::default(), TriggerMode::Edge);

        let mut same = rule(Direction::Buy);
        same.quote = same.base.clone();
        assert!(matches!(same.validate(), Err(DomainError::IdenticalTokens(_))));

        let mut zero = rule(Direction::Sell);
        zero.trade_amount = U256::zero();
        assert_eq!(zero.validate(), Err(DomainError::InsufficientAmount));

        let mut no_interval = rule(Direction::Sell);
        no_interval.poll_interval_ms = 0;
        assert!(no_interval.validate().is_err());
    }
}
