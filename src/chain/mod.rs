pub mod client;
pub mod reader;

pub use client::{ChainClient, RpcChainClient};
pub use reader::{ChainReader, RetryConfig};
