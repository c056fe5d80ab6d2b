//! Wallet DeFi position discovery, valuation and risk scoring for Base.
//!
//! The pipeline: protocol adapters discover raw positions on-chain, the
//! valuation layer prices them in USD and scores concentrated ranges, and
//! the aggregator fans out across adapters, contains their failures and
//! returns one canonical, deduplicated, value-sorted list.

pub mod abi;
pub mod adapters;
pub mod addresses;
pub mod aggregator;
pub mod chain;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod pricing;
pub mod risk;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use addresses::ProtocolAddresses;
pub use aggregator::{AggregateError, Aggregator};
pub use chain::{ChainClient, ChainReader, RetryConfig, RpcChainClient};
pub use config::Settings;
pub use error::{AddressError, ChainError};
pub use models::{Position, Protocol};
pub use pricing::{PriceOracle, Valuer};
pub use storage::{MemoryStore, PositionStore};
pub use wallet::{TokenBalance, WalletScanner};

/// Install a stderr tracing subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
