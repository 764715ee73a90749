//! Typed periphery calls and their calldata.

use super::interfaces::{INonfungiblePositionManager, ISwapRouter};
use crate::convert::{IntoAlloy, int24, uint24, uint160};
use crate::error::ProtocolError;
use alloy::primitives::{Bytes, U256 as AlloyU256};
use alloy::sol_types::SolCall;
use clmm_trader_domain::{Address, Route};
use primitive_types::U256;

/// `NonfungiblePositionManager.mint` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParams {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount0_desired: U256,
    pub amount1_desired: U256,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub recipient: Address,
    pub deadline: u64,
}

/// `NonfungiblePositionManager.decreaseLiquidity` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecreaseLiquidityParams {
    pub token_id: U256,
    pub liquidity: u128,
    pub amount0_min: U256,
    pub amount1_min: U256,
    pub deadline: u64,
}

/// `NonfungiblePositionManager.collect` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectParams {
    pub token_id: U256,
    pub recipient: Address,
    pub amount0_max: u128,
    pub amount1_max: u128,
}

/// `SwapRouter.exactInputSingle` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactInputSingleParams {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    /// Zero disables the price limit.
    pub sqrt_price_limit_x96: U256,
}

/// `SwapRouter.exactInput` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactInputParams {
    /// Packed `token (20) | fee (3) | token (20) | ...` path.
    pub path: Vec<u8>,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
}

/// State-changing calls the trader submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Mint(MintParams),
    DecreaseLiquidity(DecreaseLiquidityParams),
    Collect(CollectParams),
    ExactInputSingle(ExactInputSingleParams),
    ExactInput(ExactInputParams),
}

impl ContractCall {
    pub fn name(&self) -> &'static str {
        match self {
            ContractCall::Mint(_) => "mint",
            ContractCall::DecreaseLiquidity(_) => "decreaseLiquidity",
            ContractCall::Collect(_) => "collect",
            ContractCall::ExactInputSingle(_) => "exactInputSingle",
            ContractCall::ExactInput(_) => "exactInput",
        }
    }

    /// ABI calldata, selector included.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let data = match self {
            ContractCall::Mint(p) => INonfungiblePositionManager::mintCall {
                params: INonfungiblePositionManager::MintParams {
                    token0: p.token0.into_alloy(),
                    token1: p.token1.into_alloy(),
                    fee: uint24(p.fee)?,
                    tickLower: int24(p.tick_lower)?,
                    tickUpper: int24(p.tick_upper)?,
                    amount0Desired: p.amount0_desired.into_alloy(),
                    amount1Desired: p.amount1_desired.into_alloy(),
                    amount0Min: p.amount0_min.into_alloy(),
                    amount1Min: p.amount1_min.into_alloy(),
                    recipient: p.recipient.into_alloy(),
                    deadline: AlloyU256::from(p.deadline),
                },
            }
            .abi_encode(),
            ContractCall::DecreaseLiquidity(p) => INonfungiblePositionManager::decreaseLiquidityCall {
                params: INonfungiblePositionManager::DecreaseLiquidityParams {
                    tokenId: p.token_id.into_alloy(),
                    liquidity: p.liquidity,
                    amount0Min: p.amount0_min.into_alloy(),
                    amount1Min: p.amount1_min.into_alloy(),
                    deadline: AlloyU256::from(p.deadline),
                },
            }
            .abi_encode(),
            ContractCall::Collect(p) => INonfungiblePositionManager::collectCall {
                params: INonfungiblePositionManager::CollectParams {
                    tokenId: p.token_id.into_alloy(),
                    recipient: p.recipient.into_alloy(),
                    amount0Max: p.amount0_max,
                    amount1Max: p.amount1_max,
                },
            }
            .abi_encode(),
            ContractCall::ExactInputSingle(p) => ISwapRouter::exactInputSingleCall {
                params: ISwapRouter::ExactInputSingleParams {
                    tokenIn: p.token_in.into_alloy(),
                    tokenOut: p.token_out.into_alloy(),
                    fee: uint24(p.fee)?,
                    recipient: p.recipient.into_alloy(),
                    deadline: AlloyU256::from(p.deadline),
                    amountIn: p.amount_in.into_alloy(),
                    amountOutMinimum: p.amount_out_minimum.into_alloy(),
                    sqrtPriceLimitX96: uint160(p.sqrt_price_limit_x96)?,
                },
            }
            .abi_encode(),
            ContractCall::ExactInput(p) => ISwapRouter::exactInputCall {
                params: ISwapRouter::ExactInputParams {
                    path: Bytes::copy_from_slice(&p.path),
                    recipient: p.recipient.into_alloy(),
                    deadline: AlloyU256::from(p.deadline),
                    amountIn: p.amount_in.into_alloy(),
                    amountOutMinimum: p.amount_out_minimum.into_alloy(),
                },
            }
            .abi_encode(),
        };
        Ok(data.into())
    }
}

/// Packs a route into the router's path encoding.
pub fn encode_path(route: &Route) -> Vec<u8> {
    let mut path = Vec::with_capacity(20 + route.hops.len() * 23);
    if let Some(first) = route.hops.first() {
        path.extend_from_slice(first.token_in.address.as_bytes());
    }
    for hop in &route.hops {
        path.extend_from_slice(&hop.fee_tier.fee().to_be_bytes()[1..]);
        path.extend_from_slice(hop.token_out.address.as_bytes());
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::IntoLegacy;
    use clmm_trader_domain::{FeeTier, RouteHop, Token, parse_address};

    fn token(addr: &str, symbol: &str) -> Token {
        Token::new(1, parse_address(addr).unwrap(), 18, symbol, symbol)
    }

    fn mint_params() -> MintParams {
        MintParams {
            token0: Address::repeat_byte(0x11),
            token1: Address::repeat_byte(0x22),
            fee: 3000,
            tick_lower: -60,
            tick_upper: 60,
            amount0_desired: U256::from(1_000u32),
            amount1_desired: U256::from(2_000u32),
            amount0_min: U256::from(990u32),
            amount1_min: U256::from(1_980u32),
            recipient: Address::repeat_byte(0x33),
            deadline: 1_700_000_000,
        }
    }

    #[test]
    fn test_mint_calldata() {
        let data = ContractCall::Mint(mint_params()).encode().unwrap();
        assert_eq!(&data[..4], &[0x88, 0x31, 0x64, 0x56]);
        assert_eq!(data.len(), 4 + 11 * 32);

        let decoded = INonfungiblePositionManager::mintCall::abi_decode(&data).unwrap().params;
        assert_eq!(decoded.token1.into_legacy(), Address::repeat_byte(0x22));
        assert_eq!(decoded.fee, uint24(3000).unwrap());
        assert_eq!(decoded.tickLower, int24(-60).unwrap());
        assert_eq!(decoded.amount1Min.into_legacy(), U256::from(1_980u32));
        assert_eq!(decoded.deadline, AlloyU256::from(1_700_000_000u64));
    }

    #[test]
    fn test_out_of_range_tick_is_an_encode_error() {
        let mut params = mint_params();
        params.tick_upper = 1 << 24;
        assert!(matches!(
            ContractCall::Mint(params).encode(),
            Err(ProtocolError::Encode(_))
        ));
    }

    #[test]
    fn test_exact_input_path_and_calldata() {
        let weth = token("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH");
        let usdc = token("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC");
        let dai = token("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI");
        let route = Route::new(vec![
            RouteHop {
                pool: Address::zero(),
                token_in: weth.clone(),
                token_out: usdc.clone(),
                fee_tier: FeeTier::LOW,
            },
            RouteHop {
                pool: Address::zero(),
                token_in: usdc,
                token_out: dai.clone(),
                fee_tier: FeeTier::LOWEST,
            },
        ]);
        let path = encode_path(&route);
        assert_eq!(path.len(), 20 + 2 * 23);
        assert_eq!(&path[..20], weth.address.as_bytes());
        assert_eq!(&path[20..23], &[0x00, 0x01, 0xf4]);
        assert_eq!(&path[43..46], &[0x00, 0x00, 0x64]);
        assert_eq!(&path[46..], dai.address.as_bytes());

        let data = ContractCall::ExactInput(ExactInputParams {
            path: path.clone(),
            recipient: Address::repeat_byte(0x44),
            deadline: 99,
            amount_in: U256::from(5u8),
            amount_out_minimum: U256::from(4u8),
        })
        .encode()
        .unwrap();
        let decoded = ISwapRouter::exactInputCall::abi_decode(&data).unwrap().params;
        assert_eq!(decoded.path.as_ref(), path.as_slice());
        assert_eq!(decoded.recipient.into_legacy(), Address::repeat_byte(0x44));
        assert_eq!(decoded.amountOutMinimum, AlloyU256::from(4u8));
    }

    #[test]
    fn test_collect_calldata() {
        let data = ContractCall::Collect(CollectParams {
            token_id: U256::from(7u8),
            recipient: Address::repeat_byte(0x55),
            amount0_max: u128::MAX,
            amount1_max: u128::MAX,
        })
        .encode()
        .unwrap();
        let decoded = INonfungiblePositionManager::collectCall::abi_decode(&data).unwrap().params;
        assert_eq!(decoded.tokenId, AlloyU256::from(7u8));
        assert_eq!(decoded.amount0Max, u128::MAX);
    }
}
