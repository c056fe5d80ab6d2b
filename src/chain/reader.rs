use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::chain::client::ChainClient;
use crate::error::ChainError;

/// Bounded-retry policy. Delay before attempt `n+1` is
/// `initial_delay_ms * 2^n`, capped at [`RetryConfig::MAX_DELAY`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl RetryConfig {
    pub const MAX_DELAY: Duration = Duration::from_secs(10);

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let millis = self.initial_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(millis).min(Self::MAX_DELAY)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

/// All contract reads go through here so retry behavior, backoff and error
/// classification live in exactly one place.
pub struct ChainReader {
    client: Arc<dyn ChainClient>,
    config: RetryConfig,
    last_delays: Mutex<Vec<Duration>>,
}

impl ChainReader {
    pub fn new(client: Arc<dyn ChainClient>, config: RetryConfig) -> Self {
        Self {
            client,
            config,
            last_delays: Mutex::new(Vec::new()),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.client.chain_id()
    }

    /// Backoff delays slept during the most recent retried operation.
    pub fn last_backoff_delays(&self) -> Vec<Duration> {
        self.last_delays.lock().unwrap().clone()
    }

    /// Run `operation` with bounded retries. Only transient errors are
    /// retried; deterministic failures (reverts, decode errors) return
    /// immediately. When the budget runs out the last error is wrapped in
    /// [`ChainError::Exhausted`] so callers can tell retry exhaustion apart
    /// from a first-shot failure.
    pub async fn execute<T, F, Fut>(&self, operation: &'static str, f: F) -> Result<T, ChainError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ChainError>>,
    {
        let mut delays = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            match f().await {
                Ok(value) => {
                    *self.last_delays.lock().unwrap() = delays;
                    return Ok(value);
                }
                Err(err) if !err.is_transient() => {
                    *self.last_delays.lock().unwrap() = delays;
                    debug!(operation, error = %err, "Non-transient chain error, not retrying");
                    return Err(err);
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.max_retries {
                        *self.last_delays.lock().unwrap() = delays;
                        warn!(operation, attempts = attempt, error = %err, "Retry budget exhausted");
                        return Err(ChainError::Exhausted {
                            operation,
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }

                    let delay = self.config.delay_for(attempt - 1);
                    debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient chain error, backing off"
                    );
                    delays.push(delay);
                    sleep(delay).await;
                }
            }
        }
    }

    /// Raw `eth_call` with retries. An empty response body counts as
    /// transient and is retried with the rest.
    pub async fn call_raw(
        &self,
        operation: &'static str,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, ChainError> {
        let client = Arc::clone(&self.client);
        self.execute(operation, move || {
            let client = Arc::clone(&client);
            let data = data.clone();
            async move {
                let out = client.call(to, data).await?;
                if out.is_empty() {
                    return Err(ChainError::EmptyResponse { operation });
                }
                Ok(out)
            }
        })
        .await
    }

    /// Typed contract read: encode the call, run it with retries, decode
    /// the return. Decode failures are deterministic and never retried.
    pub async fn read<C>(
        &self,
        operation: &'static str,
        to: Address,
        call: C,
    ) -> Result<C::Return, ChainError>
    where
        C: SolCall + Send + Sync,
    {
        let data = Bytes::from(call.abi_encode());
        let raw = self.call_raw(operation, to, data).await?;
        C::abi_decode_returns(&raw, true).map_err(|e| ChainError::Decode {
            operation,
            detail: e.to_string(),
        })
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        let client = Arc::clone(&self.client);
        self.execute("get_balance", move || {
            let client = Arc::clone(&client);
            async move { client.get_balance(address).await }
        })
        .await
    }

    pub async fn block_number(&self) -> Result<u64, ChainError> {
        let client = Arc::clone(&self.client);
        self.execute("block_number", move || {
            let client = Arc::clone(&client);
            async move { client.block_number().await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn reader_with(config: RetryConfig) -> ChainReader {
        struct NoopClient;
        #[async_trait::async_trait]
        impl ChainClient for NoopClient {
            async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ChainError> {
                Ok(Bytes::new())
            }
            async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
                Ok(U256::ZERO)
            }
            async fn block_number(&self) -> Result<u64, ChainError> {
                Ok(0)
            }
            fn chain_id(&self) -> u64 {
                8453
            }
        }
        ChainReader::new(Arc::new(NoopClient), config)
    }

    #[tokio::test(start_paused = true)]
    async fn two_transient_failures_then_success() {
        let reader = reader_with(RetryConfig {
            max_retries: 3,
            initial_delay_ms: 100,
        });
        let calls = AtomicU32::new(0);

        let result = reader
            .execute("flaky", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ChainError::Timeout("deadline".into()))
                    } else {
                        Ok(42u64)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let delays = reader.last_backoff_delays();
        assert_eq!(delays.len(), 2);
        assert!(delays[1] >= delays[0]);
        assert!(delays.iter().all(|d| *d <= RetryConfig::MAX_DELAY));
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[1], Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_is_tagged() {
        let reader = reader_with(RetryConfig {
            max_retries: 3,
            initial_delay_ms: 10,
        });
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = reader
            .execute("always_down", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ChainError::Transport("connection refused".into())) }
            })
            .await;

        match result {
            Err(ChainError::Exhausted {
                operation,
                attempts,
                ..
            }) => {
                assert_eq!(operation, "always_down");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_fails_fast() {
        let reader = reader_with(RetryConfig::default());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = reader
            .execute("revert", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ChainError::Revert("execution reverted".into())) }
            })
            .await;

        assert!(matches!(result, Err(ChainError::Revert(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(reader.last_backoff_delays().is_empty());
    }

    #[test]
    fn delays_are_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay_ms: 8000,
        };
        assert_eq!(config.delay_for(0), Duration::from_millis(8000));
        assert_eq!(config.delay_for(1), RetryConfig::MAX_DELAY);
        assert_eq!(config.delay_for(9), RetryConfig::MAX_DELAY);
    }
}
