//! Deployment addresses of the Uniswap V3 periphery.

use clmm_trader_domain::{Address, parse_address};
use serde::{Deserialize, Serialize};

pub const MAINNET_SWAP_ROUTER: &str = "0xE592427A0AEce92De3Edee1F18E0157C05861564";
pub const MAINNET_POSITION_MANAGER: &str = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88";
pub const MAINNET_QUOTER: &str = "0xb27308f9F90D607463bb33eA1BeBb41C27CE5AB6";
pub const MAINNET_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";

/// Periphery contracts the trader talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    pub swap_router: Address,
    pub position_manager: Address,
    pub quoter: Address,
    pub factory: Address,
}

impl Contracts {
    /// Ethereum mainnet deployment.
    pub fn mainnet() -> Self {
        Self {
            swap_router: mainnet(MAINNET_SWAP_ROUTER),
            position_manager: mainnet(MAINNET_POSITION_MANAGER),
            quoter: mainnet(MAINNET_QUOTER),
            factory: mainnet(MAINNET_FACTORY),
        }
    }
}

impl Default for Contracts {
    fn default() -> Self {
        Self::mainnet()
    }
}

fn mainnet(address: &str) -> Address {
    // Constants above are well formed.
    parse_address(address).unwrap_or_default()
}
