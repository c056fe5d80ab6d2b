//! Pre-valuation position data as adapters collect it from chain state.

use alloy::primitives::{Address, U256};

use super::position::Protocol;

/// Token identity with on-chain metadata already resolved.
#[derive(Debug, Clone)]
pub struct RawToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl RawToken {
    /// Placeholder for tokens whose metadata calls failed.
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            symbol: "Unknown".to_string(),
            decimals: 18,
        }
    }
}

/// Unclaimed reward in raw token units.
#[derive(Debug, Clone)]
pub struct RawReward {
    pub token: Option<Address>,
    pub symbol: String,
    pub amount: U256,
    pub decimals: u8,
}

/// A discovered position before pricing and risk scoring.
#[derive(Debug, Clone)]
pub struct RawPosition {
    pub protocol: Protocol,
    pub pool: Option<Address>,
    /// NFT token id for position-manager protocols.
    pub token_id: Option<U256>,
    pub token0: RawToken,
    pub token1: RawToken,
    /// Raw integer token quantities attributable to the wallet.
    pub amount0: U256,
    pub amount1: U256,
    /// Protocol-specific liquidity figure (LP balance, NFT liquidity,
    /// staked balance). Zero-liquidity positions are dropped upstream.
    pub liquidity: U256,
    /// Tick bounds for concentrated positions.
    pub tick_range: Option<(i32, i32)>,
    /// Pool tick at scan time, when the pool was reachable.
    pub current_tick: Option<i32>,
    /// Fee in hundredths of a basis point, as reported by the contract.
    pub fee: Option<u32>,
    pub rewards: Vec<RawReward>,
}

impl RawPosition {
    /// Stable identifier: protocol tag plus the NFT token id when there is
    /// one, otherwise the pool address. Staked and unstaked balances in
    /// the same pool come from different protocols, so ids stay distinct.
    pub fn id(&self) -> String {
        match (self.token_id, self.pool) {
            (Some(token_id), _) => format!("{}-{}", self.protocol.as_str(), token_id),
            (None, Some(pool)) => format!("{}-{}", self.protocol.as_str(), pool),
            (None, None) => format!("{}-unknown", self.protocol.as_str()),
        }
    }
}

/// Wallet share of one pool reserve: `reserve * balance / total_supply`,
/// floor division. Total supply of zero yields zero rather than a panic.
pub fn pro_rata(reserve: U256, balance: U256, total_supply: U256) -> U256 {
    if total_supply.is_zero() {
        return U256::ZERO;
    }
    match reserve.checked_mul(balance) {
        Some(product) => product / total_supply,
        // Reserves fit in 112 bits so this only triggers for absurd LP
        // balances; divide first and accept the rounding.
        None => (balance / total_supply).saturating_mul(reserve),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pro_rata_share() {
        // 10% of the supply gets 10% of each reserve
        let reserve0 = U256::from(100_000_000u64); // 100 tokens at 6 decimals
        let balance = U256::from(1_000_000u64);
        let total = U256::from(10_000_000u64);
        assert_eq!(pro_rata(reserve0, balance, total), U256::from(10_000_000u64));

        let reserve1 = U256::from(50u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(
            pro_rata(reserve1, balance, total),
            U256::from(5u64) * U256::from(10u64).pow(U256::from(18u64))
        );
    }

    #[test]
    fn pro_rata_zero_supply() {
        assert_eq!(
            pro_rata(U256::from(100u64), U256::from(10u64), U256::ZERO),
            U256::ZERO
        );
    }

    #[test]
    fn pro_rata_floors() {
        // 1/3 of 100 floors to 33
        assert_eq!(
            pro_rata(U256::from(100u64), U256::from(1u64), U256::from(3u64)),
            U256::from(33u64)
        );
    }

    #[test]
    fn id_prefers_token_id() {
        let token = RawToken::unknown(Address::ZERO);
        let mut raw = RawPosition {
            protocol: Protocol::ConcentratedUniswapV3,
            pool: Some(Address::ZERO),
            token_id: Some(U256::from(42u64)),
            token0: token.clone(),
            token1: token,
            amount0: U256::ZERO,
            amount1: U256::ZERO,
            liquidity: U256::from(1u64),
            tick_range: None,
            current_tick: None,
            fee: None,
            rewards: vec![],
        };
        assert_eq!(raw.id(), "uniswap_v3-42");

        raw.token_id = None;
        raw.protocol = Protocol::StakedGauge;
        assert_eq!(raw.id(), format!("staked_gauge-{}", Address::ZERO));
    }
}
