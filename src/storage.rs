//! Pluggable position persistence.
//!
//! The aggregator only needs two operations: read back positions newer
//! than a staleness cutoff, and write positions keyed by (wallet, id) so
//! a rescan overwrites rather than duplicates.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::Position;
use crate::utils::Clock;

pub trait PositionStore: Send + Sync {
    /// Positions stored for the wallet that are younger than `max_age`.
    fn get_fresh(&self, wallet: &str, max_age: std::time::Duration) -> Vec<Position>;

    /// Insert or overwrite by (wallet, position id).
    fn upsert(&self, wallet: &str, position: &Position);
}

/// In-memory store, suitable for a single process.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<(String, String), (Position, DateTime<Utc>)>>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl PositionStore for MemoryStore {
    fn get_fresh(&self, wallet: &str, max_age: std::time::Duration) -> Vec<Position> {
        let max_age =
            ChronoDuration::from_std(max_age).unwrap_or_else(|_| ChronoDuration::seconds(300));
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|((w, _), (_, stored_at))| w.as_str() == wallet && now - *stored_at <= max_age)
            .map(|(_, (position, _))| position.clone())
            .collect()
    }

    fn upsert(&self, wallet: &str, position: &Position) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            (wallet.to_string(), position.id.clone()),
            (position.clone(), self.clock.now()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Protocol, TokenAmounts, TokenInfo};
    use crate::utils::ManualClock;

    fn sample(id: &str, value: &str) -> Position {
        Position {
            id: id.to_string(),
            protocol: Protocol::StandardPool,
            pool_address: None,
            token0: TokenInfo::default(),
            token1: TokenInfo::default(),
            amounts: TokenAmounts {
                token0: "1".into(),
                token1: "2".into(),
            },
            liquidity: "100".into(),
            price_range: None,
            value_usd: Some(value.to_string()),
            rewards: vec![],
            fee_tier: None,
            apr: None,
            risk_score: None,
        }
    }

    const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn upsert_overwrites_same_id() {
        let clock = ManualClock::new(Utc::now());
        let store = MemoryStore::new(Arc::new(clock));

        store.upsert(WALLET, &sample("a", "10.00"));
        store.upsert(WALLET, &sample("a", "20.00"));

        let fresh = store.get_fresh(WALLET, std::time::Duration::from_secs(300));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].value_usd.as_deref(), Some("20.00"));
    }

    #[test]
    fn stale_entries_are_filtered() {
        let clock = ManualClock::new(Utc::now());
        let store = MemoryStore::new(Arc::new(clock.clone()));

        store.upsert(WALLET, &sample("a", "10.00"));
        clock.advance(ChronoDuration::seconds(200));
        store.upsert(WALLET, &sample("b", "20.00"));
        clock.advance(ChronoDuration::seconds(200));

        // "a" is now 400s old, "b" only 200s
        let fresh = store.get_fresh(WALLET, std::time::Duration::from_secs(300));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "b");
    }

    #[test]
    fn wallets_are_isolated() {
        let clock = ManualClock::new(Utc::now());
        let store = MemoryStore::new(Arc::new(clock));

        store.upsert(WALLET, &sample("a", "10.00"));
        let other = store.get_fresh("0x0000000000000000000000000000000000000001", std::time::Duration::from_secs(300));
        assert!(other.is_empty());
    }
}
