//! Contract ABI surface.
//!
//! The three `positions(uint256)` interfaces share one selector but return
//! differently shaped tuples; which one a position manager actually speaks
//! is resolved at decode time (see `decode::layout`).

use alloy::sol;

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256 balance);
        function totalSupply() external view returns (uint256 supply);
        function symbol() external view returns (string memory sym);
        function decimals() external view returns (uint8 dec);
    }

    interface IPairFactory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    interface IPool {
        function token0() external view returns (address token);
        function token1() external view returns (address token);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function totalSupply() external view returns (uint256 supply);
        function balanceOf(address owner) external view returns (uint256 balance);
        function fee() external view returns (uint24 feeAmount);
        function tickSpacing() external view returns (int24 spacing);
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
    }

    interface IVoter {
        function gauges(address pool) external view returns (address gauge);
        function isAlive(address gauge) external view returns (bool alive);
    }

    interface IGauge {
        function balanceOf(address account) external view returns (uint256 balance);
        function earned(address account) external view returns (uint256 amount);
        function rewardToken() external view returns (address token);
    }

    interface IPositionManager {
        function balanceOf(address owner) external view returns (uint256 balance);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256 tokenId);
        function ownerOf(uint256 tokenId) external view returns (address owner);
        function tokenURI(uint256 tokenId) external view returns (string memory uri);
    }

    /// Classic nonfungible position manager layout (fee field, no pool).
    interface IPositionsV1 {
        function positions(uint256 tokenId) external view returns (uint96 nonce, address operator, address token0, address token1, uint24 fee, int24 tickLower, int24 tickUpper, uint128 liquidity, uint256 feeGrowthInside0LastX128, uint256 feeGrowthInside1LastX128, uint128 tokensOwed0, uint128 tokensOwed1);
    }

    /// Slipstream-style layout (tickSpacing instead of fee, trailing pool).
    interface IPositionsV2 {
        function positions(uint256 tokenId) external view returns (uint96 nonce, address operator, address token0, address token1, int24 tickSpacing, int24 tickLower, int24 tickUpper, uint128 liquidity, uint256 feeGrowthInside0LastX128, uint256 feeGrowthInside1LastX128, uint128 tokensOwed0, uint128 tokensOwed1, address pool);
    }

    /// Minimal layout some managers expose.
    interface IPositionsV3 {
        function positions(uint256 tokenId) external view returns (address token0, address token1, int24 tickLower, int24 tickUpper, uint128 liquidity, uint256 tokensOwed0, uint256 tokensOwed1);
    }

    interface IChainlinkFeed {
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
        function decimals() external view returns (uint8 dec);
    }

    interface IV4Singleton {
        function isValidPool(address pool) external view returns (bool valid);
        function getPosition(address pool, address owner) external view returns (uint256 liquidity, uint256 amount0, uint256 amount1);
    }
}
