use crate::error::DomainError;
use crate::math::liquidity::get_amounts_for_liquidity;
use crate::math::tick_math::get_sqrt_ratio_at_tick;
use crate::pool::{Pool, PoolKey};
use crate::token::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Where the pool price sits relative to a position's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    /// Price inside `[tick_lower, tick_upper)`: both tokens held.
    InRange,
    /// Price below the range: only token0 held.
    BelowRange,
    /// Price at or above the range: only token1 held.
    AboveRange,
    /// No liquidity left; owed tokens may remain until collected.
    Closed,
}

/// A liquidity position minted by the position manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub token_id: U256,
    pub owner: Address,
    pub pool: PoolKey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Tokens owed to the owner from decreases and fees, not yet collected.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl Position {
    pub fn status(&self, tick_current: i32) -> PositionStatus {
        if self.liquidity == 0 {
            PositionStatus::Closed
        } else if tick_current < self.tick_lower {
            PositionStatus::BelowRange
        } else if tick_current < self.tick_upper {
            PositionStatus::InRange
        } else {
            PositionStatus::AboveRange
        }
    }

    /// Principal held by the position at the pool's current price, excluding
    /// owed tokens.
    pub fn amounts(&self, pool: &Pool) -> Result<(U256, U256), DomainError> {
        get_amounts_for_liquidity(
            pool.sqrt_price_x96,
            get_sqrt_ratio_at_tick(self.tick_lower)?,
            get_sqrt_ratio_at_tick(self.tick_upper)?,
            self.liquidity,
        )
    }

    pub fn has_owed_tokens(&self) -> bool {
        self.tokens_owed0 > 0 || self.tokens_owed1 > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeTier;
    use crate::token::{Token, parse_address};

    fn position(liquidity: u128) -> Position {
        let a = Token::new(1, parse_address("0x0000000000000000000000000000000000000001").unwrap(), 18, "A", "A");
        let b = Token::new(1, parse_address("0x0000000000000000000000000000000000000002").unwrap(), 18, "B", "B");
        Position {
            token_id: U256::from(7u8),
            owner: Address::zero(),
            pool: PoolKey::new(a, b, FeeTier::MEDIUM).unwrap(),
            tick_lower: -600,
            tick_upper: 600,
            liquidity,
            tokens_owed0: 0,
            tokens_owed1: 0,
        }
    }

    #[test]
    fn test_status() {
        let p = position(1_000);
        assert_eq!(p.status(-601), PositionStatus::BelowRange);
        assert_eq!(p.status(-600), PositionStatus::InRange);
        assert_eq!(p.status(599), PositionStatus::InRange);
        assert_eq!(p.status(600), PositionStatus::AboveRange);
        assert_eq!(position(0).status(0), PositionStatus::Closed);
    }
}
