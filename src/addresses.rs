//! Well-known Base mainnet contract and token addresses.

use alloy::primitives::{address, Address};
use std::collections::HashMap;

/// A token the wallet scanner checks by default.
#[derive(Debug, Clone)]
pub struct KnownToken {
    pub address: Address,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Deployment addresses for one chain.
#[derive(Debug, Clone)]
pub struct ProtocolAddresses {
    pub uniswap_factory: Address,
    pub uniswap_position_manager: Address,
    pub aerodrome_factory: Address,
    pub aerodrome_voter: Address,
    pub slipstream_position_manager: Address,
    pub v4_singleton: Address,

    pub usdc: Address,
    pub weth: Address,
    pub usdbc: Address,

    /// Pools worth probing for gauge stakes and V4 positions. Pool-level
    /// discovery has no enumeration entrypoint, so this is an allow-list.
    pub candidate_pools: Vec<Address>,
}

impl ProtocolAddresses {
    pub fn base_mainnet() -> Self {
        Self {
            uniswap_factory: address!("33128a8fc17869897dce68ed026d694621f6fdfd"),
            uniswap_position_manager: address!("03a520b32c04bf3be5f46762fce6cd5031f498c2"),
            aerodrome_factory: address!("420dd381b31aef6683db6b902084cb0ffece40da"),
            aerodrome_voter: address!("16613524e02ad97edfef371bc883f2f5d6c480a5"),
            slipstream_position_manager: address!("827922686190790b37229fd06084350e74485b72"),
            v4_singleton: address!("7cad26499621783a986aebbf15d92e5c9cc04aa4"),
            usdc: address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"),
            weth: address!("4200000000000000000000000000000000000006"),
            usdbc: address!("d9aaec86b65d86f6a7b5b1b0c42ffa531710b6ca"),
            candidate_pools: vec![
                address!("4c36388be6f416a29c8d8eee81c771ce6be14b18"),
                address!("7d49e5fab7e31ddf822a759ebc29c8009d535e06"),
            ],
        }
    }

    /// Token pairs the standard-pool adapter probes against each factory.
    pub fn common_pairs(&self) -> Vec<(Address, Address)> {
        vec![
            (self.weth, self.usdc),
            (self.weth, self.usdbc),
            (self.usdc, self.usdbc),
        ]
    }

    /// Chainlink USD price feeds, keyed by upper-case symbol.
    pub fn price_feeds(&self) -> HashMap<String, Address> {
        let eth_usd = address!("71041dddad3595f9ced3dccfbe3d1f4b0a16bb70");
        let usdc_usd = address!("7e860098f58bbfc8648a4311b374b1d669a2bc6b");
        HashMap::from([
            ("ETH".to_string(), eth_usd),
            ("WETH".to_string(), eth_usd),
            ("USDC".to_string(), usdc_usd),
        ])
    }

    /// Tokens scanned for plain wallet balances.
    pub fn common_tokens(&self) -> Vec<KnownToken> {
        vec![
            KnownToken {
                address: self.usdc,
                symbol: "USDC",
                decimals: 6,
            },
            KnownToken {
                address: self.weth,
                symbol: "WETH",
                decimals: 18,
            },
            KnownToken {
                address: self.usdbc,
                symbol: "USDbC",
                decimals: 6,
            },
        ]
    }
}
