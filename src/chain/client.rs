use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ChainError;

/// Minimal read-only chain capability used by every adapter.
///
/// Keeping the surface this small lets tests script responses without a
/// network, and keeps the provider type out of the rest of the crate.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `eth_call` against a contract.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Native balance of an account.
    async fn get_balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Chain id the client is connected to.
    fn chain_id(&self) -> u64;
}

/// HTTP JSON-RPC backed client with endpoint failover.
#[derive(Debug, Clone)]
pub struct RpcChainClient {
    provider: RootProvider<Http<Client>>,
    endpoint: String,
    chain_id: u64,
}

impl RpcChainClient {
    /// Try each endpoint in order and keep the first one that responds on
    /// the expected chain. Endpoints that answer with a different chain id
    /// are skipped, not trusted.
    pub async fn connect(endpoints: &[String], expected_chain_id: u64) -> Result<Self, ChainError> {
        for endpoint in endpoints {
            let url = match endpoint.parse() {
                Ok(url) => url,
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Skipping malformed RPC URL");
                    continue;
                }
            };

            let provider = ProviderBuilder::new().on_http(url);
            match provider.get_chain_id().await {
                Ok(id) if id == expected_chain_id => {
                    info!(endpoint = %endpoint, chain_id = id, "Connected to RPC endpoint");
                    return Ok(Self {
                        provider,
                        endpoint: endpoint.clone(),
                        chain_id: id,
                    });
                }
                Ok(id) => {
                    warn!(
                        endpoint = %endpoint,
                        got = id,
                        expected = expected_chain_id,
                        "RPC endpoint is on the wrong network"
                    );
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "RPC endpoint unreachable");
                }
            }
        }

        Err(ChainError::NoReachableEndpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(&tx)
            .await
            .map_err(|e| classify_rpc_error(&e.to_string()))
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| classify_rpc_error(&e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| classify_rpc_error(&e.to_string()))
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

/// Bucket a provider error into the retryable/terminal taxonomy based on
/// the message, since transports do not expose structured causes uniformly.
fn classify_rpc_error(message: &str) -> ChainError {
    let lower = message.to_lowercase();

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
    {
        ChainError::RateLimited(message.to_string())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        ChainError::Timeout(message.to_string())
    } else if lower.contains("revert") {
        ChainError::Revert(message.to_string())
    } else {
        ChainError::Transport(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit() {
        assert!(matches!(
            classify_rpc_error("HTTP 429 Too Many Requests"),
            ChainError::RateLimited(_)
        ));
        assert!(matches!(
            classify_rpc_error("rate limit exceeded, retry later"),
            ChainError::RateLimited(_)
        ));
    }

    #[test]
    fn classifies_timeout_and_revert() {
        assert!(matches!(
            classify_rpc_error("request timed out after 30s"),
            ChainError::Timeout(_)
        ));
        assert!(matches!(
            classify_rpc_error("execution reverted: STF"),
            ChainError::Revert(_)
        ));
    }

    #[test]
    fn unknown_errors_are_transport() {
        let err = classify_rpc_error("connection reset by peer");
        assert!(matches!(err, ChainError::Transport(_)));
        assert!(err.is_transient());
    }
}
