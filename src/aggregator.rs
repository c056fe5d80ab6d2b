//! Fan-out position aggregation across protocol adapters.

use alloy::primitives::Address;
use futures::future::join_all;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::adapters::{
    ConcentratedNftAdapter, NftVariant, ProtocolAdapter, StakedGaugeAdapter, StandardPoolAdapter,
    V4SingletonAdapter,
};
use crate::addresses::ProtocolAddresses;
use crate::chain::{ChainReader, RpcChainClient};
use crate::config::Settings;
use crate::decode::MetadataResolver;
use crate::error::ChainError;
use crate::models::Position;
use crate::pricing::{PriceOracle, Valuer};
use crate::storage::PositionStore;
use crate::utils::{self, SystemClock};

/// The only failures that abort a whole scan. Per-adapter trouble is
/// contained and logged instead.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

pub struct Aggregator {
    adapters: Vec<Box<dyn ProtocolAdapter>>,
    valuer: Valuer,
    store: Option<Arc<dyn PositionStore>>,
    position_ttl: std::time::Duration,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn ProtocolAdapter>>, valuer: Valuer) -> Self {
        Self {
            adapters,
            valuer,
            store: None,
            position_ttl: std::time::Duration::from_secs(300),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn PositionStore>, ttl: std::time::Duration) -> Self {
        self.store = Some(store);
        self.position_ttl = ttl;
        self
    }

    /// Connect to the chain and assemble the full adapter set for one
    /// deployment.
    pub async fn connect(
        settings: &Settings,
        addresses: &ProtocolAddresses,
    ) -> Result<(Self, Arc<ChainReader>, Arc<PriceOracle>), AggregateError> {
        let client =
            RpcChainClient::connect(&settings.chain.rpc_endpoints, settings.chain.chain_id).await?;
        let reader = Arc::new(ChainReader::new(Arc::new(client), settings.retry_config()));
        let clock = Arc::new(SystemClock);
        let oracle = Arc::new(PriceOracle::new(
            Arc::clone(&reader),
            addresses,
            std::time::Duration::from_secs(settings.scan.price_cache_ttl_secs),
            clock,
        ));
        let delay = settings.rate_limit_delay();

        let adapters: Vec<Box<dyn ProtocolAdapter>> = vec![
            Box::new(StandardPoolAdapter::new(
                Arc::clone(&reader),
                addresses.aerodrome_factory,
                addresses.common_pairs(),
                delay,
            )),
            Box::new(StandardPoolAdapter::new(
                Arc::clone(&reader),
                addresses.uniswap_factory,
                addresses.common_pairs(),
                delay,
            )),
            Box::new(ConcentratedNftAdapter::new(
                Arc::clone(&reader),
                addresses.uniswap_position_manager,
                NftVariant::UniswapV3,
                MetadataResolver::default(),
                delay,
            )),
            Box::new(ConcentratedNftAdapter::new(
                Arc::clone(&reader),
                addresses.slipstream_position_manager,
                NftVariant::Slipstream,
                MetadataResolver::default(),
                delay,
            )),
            Box::new(StakedGaugeAdapter::new(
                Arc::clone(&reader),
                addresses.aerodrome_voter,
                addresses.candidate_pools.clone(),
                delay,
            )),
            Box::new(V4SingletonAdapter::new(
                Arc::clone(&reader),
                addresses.v4_singleton,
                addresses.candidate_pools.clone(),
                delay,
            )),
        ];

        let valuer = Valuer::new(Arc::clone(&oracle));
        Ok((Self::new(adapters, valuer), reader, oracle))
    }

    /// Scan every adapter concurrently and return priced, scored,
    /// deduplicated positions, largest USD value first.
    pub async fn aggregate(&self, wallet: &str) -> Result<Vec<Position>, AggregateError> {
        let normalized = utils::normalize(wallet)
            .ok_or_else(|| AggregateError::InvalidAddress(wallet.to_string()))?;
        let address = Address::from_str(&normalized)
            .map_err(|_| AggregateError::InvalidAddress(wallet.to_string()))?;

        let scans = self.adapters.iter().map(|adapter| {
            let name = adapter.protocol_name();
            async move {
                match adapter.discover_positions(address).await {
                    Ok(positions) => positions,
                    Err(e) => {
                        warn!(adapter = name, error = %e, "Adapter scan failed, continuing without it");
                        vec![]
                    }
                }
            }
        });

        let raw_positions: Vec<_> = join_all(scans).await.into_iter().flatten().collect();

        let mut positions = Vec::with_capacity(raw_positions.len());
        for raw in raw_positions {
            // adapters already skip closed positions; enforce it at the
            // boundary too so no zero-liquidity entry ever leaves here
            if raw.liquidity.is_zero() {
                continue;
            }
            positions.push(self.valuer.enrich(raw).await);
        }

        let positions = dedup_and_sort(positions);
        info!(wallet = %normalized, count = positions.len(), "Aggregation complete");
        Ok(positions)
    }

    /// Like [`Self::aggregate`], but served from the store when a recent
    /// scan exists, and persisted after a fresh one.
    pub async fn aggregate_cached(&self, wallet: &str) -> Result<Vec<Position>, AggregateError> {
        let normalized = utils::normalize(wallet)
            .ok_or_else(|| AggregateError::InvalidAddress(wallet.to_string()))?;

        if let Some(store) = &self.store {
            let cached = store.get_fresh(&normalized, self.position_ttl);
            if !cached.is_empty() {
                info!(wallet = %normalized, count = cached.len(), "Serving cached positions");
                return Ok(dedup_and_sort(cached));
            }
        }

        let positions = self.aggregate(&normalized).await?;
        if let Some(store) = &self.store {
            for position in &positions {
                store.upsert(&normalized, position);
            }
        }
        Ok(positions)
    }
}

/// Drop duplicate ids (first occurrence wins) and order by USD value,
/// largest first; unpriceable positions sort last.
fn dedup_and_sort(positions: Vec<Position>) -> Vec<Position> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Position> = Vec::with_capacity(positions.len());
    for position in positions {
        if seen.insert(position.id.clone()) {
            unique.push(position);
        } else {
            warn!(id = %position.id, "Duplicate position id, keeping first");
        }
    }

    unique.sort_by(|a, b| {
        b.value_usd_f64()
            .partial_cmp(&a.value_usd_f64())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Protocol, TokenAmounts, TokenInfo};

    fn position(id: &str, value: Option<&str>) -> Position {
        Position {
            id: id.to_string(),
            protocol: Protocol::StandardPool,
            pool_address: None,
            token0: TokenInfo::default(),
            token1: TokenInfo::default(),
            amounts: TokenAmounts {
                token0: "0".into(),
                token1: "0".into(),
            },
            liquidity: "1".into(),
            price_range: None,
            value_usd: value.map(String::from),
            rewards: vec![],
            fee_tier: None,
            apr: None,
            risk_score: None,
        }
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let out = dedup_and_sort(vec![
            position("a", Some("5.00")),
            position("a", Some("9.00")),
            position("b", Some("1.00")),
        ]);
        assert_eq!(out.len(), 2);
        let a = out.iter().find(|p| p.id == "a").unwrap();
        assert_eq!(a.value_usd.as_deref(), Some("5.00"));
    }

    #[test]
    fn sorted_by_value_descending_with_unpriced_last() {
        let out = dedup_and_sort(vec![
            position("small", Some("3.50")),
            position("unpriced", None),
            position("big", Some("1000.00")),
        ]);
        let ids: Vec<_> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["big", "small", "unpriced"]);
    }
}
