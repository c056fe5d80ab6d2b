use alloy::primitives::Address;
use async_trait::async_trait;

use crate::error::ChainError;
use crate::models::RawPosition;

/// Common error type for all protocol adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("chain read failed: {0}")]
    Chain(#[from] ChainError),

    #[error("invalid position data: {0}")]
    InvalidData(String),
}

/// One protocol variant's position discovery.
///
/// Implementations skip candidates they cannot read and only fail the whole
/// scan for errors that make every result meaningless.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn protocol_name(&self) -> &'static str;

    /// Find every live position the wallet holds in this protocol.
    async fn discover_positions(&self, wallet: Address) -> Result<Vec<RawPosition>, AdapterError>;
}
