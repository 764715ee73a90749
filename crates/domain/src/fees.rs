use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pool fee tier and its tick spacing.
///
/// `fee` is in hundredths of a basis point, e.g. 3000 for 0.3%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeeTier {
    fee: u32,
    tick_spacing: i32,
}

impl FeeTier {
    /// 0.01%.
    pub const LOWEST: FeeTier = FeeTier { fee: 100, tick_spacing: 1 };
    /// 0.05%.
    pub const LOW: FeeTier = FeeTier { fee: 500, tick_spacing: 10 };
    /// 0.3%.
    pub const MEDIUM: FeeTier = FeeTier { fee: 3000, tick_spacing: 60 };
    /// 1%.
    pub const HIGH: FeeTier = FeeTier { fee: 10000, tick_spacing: 200 };

    /// All tiers enabled on the factory.
    pub const ALL: [FeeTier; 4] = [Self::LOWEST, Self::LOW, Self::MEDIUM, Self::HIGH];

    /// Looks up the tier for a raw fee. Unknown fees fail instead of falling
    /// through to a ledger-side revert.
    pub fn from_fee(fee: u32) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.fee == fee)
            .ok_or(DomainError::UnknownFeeTier(fee))
    }

    /// Fee in hundredths of a basis point.
    pub const fn fee(&self) -> u32 {
        self.fee
    }

    pub const fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = DomainError;

    fn try_from(fee: u32) -> Result<Self, Self::Error> {
        Self::from_fee(fee)
    }
}

impl From<FeeTier> for u32 {
    fn from(tier: FeeTier) -> Self {
        tier.fee
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.fee / 10000, (self.fee % 10000) / 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_spacing_table() {
        assert_eq!(FeeTier::from_fee(500).unwrap().tick_spacing(), 10);
        assert_eq!(FeeTier::from_fee(3000).unwrap().tick_spacing(), 60);
        assert_eq!(FeeTier::from_fee(10000).unwrap().tick_spacing(), 200);
        assert_eq!(FeeTier::from_fee(100).unwrap().tick_spacing(), 1);
    }

    #[test]
    fn test_unknown_fee_tier() {
        assert_eq!(FeeTier::from_fee(2500), Err(DomainError::UnknownFeeTier(2500)));
    }

    #[test]
    fn test_deserialize_checks_table() {
        let tier: FeeTier = serde_json::from_str("500").unwrap();
        assert_eq!(tier, FeeTier::LOW);
        assert!(serde_json::from_str::<FeeTier>("7").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FeeTier::MEDIUM.to_string(), "0.30%");
        assert_eq!(FeeTier::HIGH.to_string(), "1.00%");
        assert_eq!(FeeTier::LOWEST.to_string(), "0.01%");
    }
}
