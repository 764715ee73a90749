//! Solidity interfaces of the Uniswap V3 contracts the trader calls.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function slot0()
            external
            view
            returns (
                uint160 sqrtPriceX96,
                int24 tick,
                uint16 observationIndex,
                uint16 observationCardinality,
                uint16 observationCardinalityNext,
                uint8 feeProtocol,
                bool unlocked
            );

        function liquidity() external view returns (uint128);

        function feeGrowthGlobal0X128() external view returns (uint256);

        function feeGrowthGlobal1X128() external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        struct DecreaseLiquidityParams {
            uint256 tokenId;
            uint128 liquidity;
            uint256 amount0Min;
            uint256 amount1Min;
            uint256 deadline;
        }

        struct CollectParams {
            uint256 tokenId;
            address recipient;
            uint128 amount0Max;
            uint128 amount1Max;
        }

        event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        event DecreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        event Collect(uint256 indexed tokenId, address recipient, uint256 amount0, uint256 amount1);

        function positions(uint256 tokenId)
            external
            view
            returns (
                uint96 nonce,
                address operator,
                address token0,
                address token1,
                uint24 fee,
                int24 tickLower,
                int24 tickUpper,
                uint128 liquidity,
                uint256 feeGrowthInside0LastX128,
                uint256 feeGrowthInside1LastX128,
                uint128 tokensOwed0,
                uint128 tokensOwed1
            );

        function ownerOf(uint256 tokenId) external view returns (address owner);

        function mint(MintParams calldata params)
            external
            payable
            returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

        function decreaseLiquidity(DecreaseLiquidityParams calldata params)
            external
            payable
            returns (uint256 amount0, uint256 amount1);

        function collect(CollectParams calldata params) external payable returns (uint256 amount0, uint256 amount1);
    }
}

sol! {
    #[sol(rpc)]
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        struct ExactInputParams {
            bytes path;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);

        function exactInput(ExactInputParams calldata params) external payable returns (uint256 amountOut);
    }
}

// QuoterV1 quotes by reverting internally, so these are not `view`.
sol! {
    #[sol(rpc)]
    interface IQuoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);

        function quoteExactInput(bytes path, uint256 amountIn) external returns (uint256 amountOut);
    }
}

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn test_selectors_match_deployed_abi() {
        assert_eq!(INonfungiblePositionManager::mintCall::SELECTOR, [0x88, 0x31, 0x64, 0x56]);
        assert_eq!(INonfungiblePositionManager::decreaseLiquidityCall::SELECTOR, [0x0c, 0x49, 0xcc, 0xbe]);
        assert_eq!(INonfungiblePositionManager::collectCall::SELECTOR, [0xfc, 0x6f, 0x78, 0x65]);
        assert_eq!(INonfungiblePositionManager::positionsCall::SELECTOR, [0x99, 0xfb, 0xab, 0x88]);
        assert_eq!(IUniswapV3Pool::slot0Call::SELECTOR, [0x38, 0x50, 0xc7, 0xbd]);
        assert_eq!(ISwapRouter::exactInputSingleCall::SELECTOR, [0x41, 0x4b, 0xf3, 0x89]);
        assert_eq!(ISwapRouter::exactInputCall::SELECTOR, [0xc0, 0x4b, 0x8d, 0x59]);
        assert_eq!(IQuoter::quoteExactInputSingleCall::SELECTOR, [0xf7, 0x72, 0x9d, 0x43]);
        assert_eq!(IUniswapV3Factory::getPoolCall::SELECTOR, [0x16, 0x98, 0xee, 0x82]);
    }

    #[test]
    fn test_event_signatures() {
        assert_eq!(
            INonfungiblePositionManager::IncreaseLiquidity::SIGNATURE,
            "IncreaseLiquidity(uint256,uint128,uint256,uint256)"
        );
        assert_eq!(
            INonfungiblePositionManager::Collect::SIGNATURE,
            "Collect(uint256,address,uint256,uint256)"
        );
        assert_eq!(IERC20::Transfer::SIGNATURE, "Transfer(address,address,uint256)");
    }
}
