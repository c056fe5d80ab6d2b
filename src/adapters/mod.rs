pub mod concentrated_nft;
pub mod staked_gauge;
pub mod standard_pool;
pub mod traits;
pub mod v4_singleton;

pub use concentrated_nft::{ConcentratedNftAdapter, NftVariant};
pub use staked_gauge::StakedGaugeAdapter;
pub use standard_pool::StandardPoolAdapter;
pub use traits::{AdapterError, ProtocolAdapter};
pub use v4_singleton::V4SingletonAdapter;

use crate::abi::IERC20;
use crate::chain::ChainReader;
use crate::models::RawToken;
use alloy::primitives::Address;
use tracing::debug;

/// Resolve symbol and decimals for a token, degrading to placeholders when
/// the token contract is uncooperative. Metadata failures never sink a
/// position.
pub(crate) async fn token_info(reader: &ChainReader, address: Address) -> RawToken {
    let symbol = match reader
        .read("erc20_symbol", address, IERC20::symbolCall {})
        .await
    {
        Ok(ret) => ret.sym,
        Err(e) => {
            debug!(token = %address, error = %e, "Token symbol unavailable");
            "Unknown".to_string()
        }
    };

    let decimals = match reader
        .read("erc20_decimals", address, IERC20::decimalsCall {})
        .await
    {
        Ok(ret) => ret.dec,
        Err(e) => {
            debug!(token = %address, error = %e, "Token decimals unavailable, assuming 18");
            18
        }
    };

    RawToken {
        address,
        symbol,
        decimals,
    }
}
