use thiserror::Error;

/// Errors surfaced by the chain access layer.
///
/// Transient variants are eligible for retry by the chain reader; everything
/// else propagates immediately.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no reachable rpc endpoint")]
    NoReachableEndpoint,

    #[error("chain read exhausted after {attempts} attempts ({operation}): {source}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: Box<ChainError>,
    },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("rpc timeout: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty response ({operation})")]
    EmptyResponse { operation: &'static str },

    #[error("abi decode failed ({operation}): {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    #[error("call reverted: {0}")]
    Revert(String),
}

impl ChainError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Reverts and decode failures are deterministic; an empty `eth_call`
    /// response usually means a flaky endpoint, so it counts as transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainError::RateLimited(_)
                | ChainError::Timeout(_)
                | ChainError::Transport(_)
                | ChainError::EmptyResponse { .. }
        )
    }
}

/// Wallet address could not be normalized into checksummed form.
#[derive(Debug, Error)]
#[error("invalid address: {0}")]
pub struct AddressError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ChainError::RateLimited("429".into()).is_transient());
        assert!(ChainError::Timeout("deadline".into()).is_transient());
        assert!(ChainError::Transport("connection reset".into()).is_transient());
        assert!(ChainError::EmptyResponse { operation: "slot0" }.is_transient());

        assert!(!ChainError::Revert("execution reverted".into()).is_transient());
        assert!(!ChainError::Decode {
            operation: "positions",
            detail: "length mismatch".into()
        }
        .is_transient());
        assert!(!ChainError::NoReachableEndpoint.is_transient());
    }

    #[test]
    fn exhausted_is_terminal() {
        let err = ChainError::Exhausted {
            operation: "get_reserves",
            attempts: 3,
            source: Box::new(ChainError::Timeout("deadline".into())),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("get_reserves"));
        assert!(err.to_string().contains("3 attempts"));
    }
}
