//! USD price resolution.
//!
//! Resolution works down a fixed ladder: Chainlink feed, stablecoin
//! passthrough, spot ratio against the USDC pool, then a hard-coded
//! fallback for a handful of majors. A token that survives all four
//! stages prices at zero, and the position layer reports that as
//! "unpriceable" rather than a zero value.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::abi::{IChainlinkFeed, IERC20, IPairFactory, IPool};
use crate::addresses::ProtocolAddresses;
use crate::chain::ChainReader;
use crate::utils::Clock;

/// Symbol-keyed price cache with explicit TTL and an injected clock.
pub struct PriceCache {
    ttl: ChronoDuration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, (f64, DateTime<Utc>)>>,
}

impl PriceCache {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(60)),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        let entries = self.entries.lock().unwrap();
        let (price, stored_at) = entries.get(symbol)?;
        if self.clock.now() - *stored_at > self.ttl {
            return None;
        }
        Some(*price)
    }

    pub fn put(&self, symbol: String, price: f64) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(symbol, (price, self.clock.now()));
    }
}

pub struct PriceOracle {
    reader: Arc<ChainReader>,
    feeds: HashMap<String, Address>,
    stables: HashSet<&'static str>,
    fallbacks: HashMap<&'static str, f64>,
    factory: Address,
    usdc: Address,
    cache: PriceCache,
}

impl PriceOracle {
    pub fn new(
        reader: Arc<ChainReader>,
        addresses: &ProtocolAddresses,
        cache_ttl: std::time::Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            feeds: addresses.price_feeds(),
            stables: HashSet::from(["USDC", "USDT", "DAI", "USDBC"]),
            fallbacks: HashMap::from([("ETH", 3000.0), ("WETH", 3000.0)]),
            factory: addresses.aerodrome_factory,
            usdc: addresses.usdc,
            cache: PriceCache::new(cache_ttl, clock),
        }
    }

    /// USD price for a token; `0.0` means unpriceable. Only successful
    /// resolutions are cached, so a flaky feed gets another chance on the
    /// next scan.
    pub async fn price_of(&self, symbol: &str, address: Option<Address>) -> f64 {
        let key = symbol.to_uppercase();
        if let Some(price) = self.cache.get(&key) {
            return price;
        }

        let price = self.resolve(&key, address).await;
        if price > 0.0 {
            self.cache.put(key, price);
        }
        price
    }

    async fn resolve(&self, symbol: &str, address: Option<Address>) -> f64 {
        if let Some(feed) = self.feeds.get(symbol) {
            if let Some(price) = self.read_feed(*feed).await {
                return price;
            }
        }

        if self.stables.contains(symbol) {
            return 1.0;
        }

        if let Some(token) = address {
            if let Some(price) = self.infer_from_usdc_pool(token).await {
                debug!(symbol, price, "Priced via USDC pool ratio");
                return price;
            }
        }

        if let Some(price) = self.fallbacks.get(symbol) {
            warn!(symbol, price, "Using hard-coded fallback price");
            return *price;
        }

        debug!(symbol, "Token is unpriceable");
        0.0
    }

    async fn read_feed(&self, feed: Address) -> Option<f64> {
        let round = self
            .reader
            .read("feed_latest_round", feed, IChainlinkFeed::latestRoundDataCall {})
            .await
            .ok()?;
        let answer = i128::try_from(round.answer).ok()?;
        if answer <= 0 {
            return None;
        }
        let decimals = self
            .reader
            .read("feed_decimals", feed, IChainlinkFeed::decimalsCall {})
            .await
            .map(|ret| ret.dec)
            .unwrap_or(8);
        Some(answer as f64 / 10f64.powi(decimals as i32))
    }

    /// Spot price from the token's pair against USDC, if the factory has
    /// one.
    async fn infer_from_usdc_pool(&self, token: Address) -> Option<f64> {
        if token == self.usdc {
            return Some(1.0);
        }

        let pair = self
            .reader
            .read(
                "factory_get_pair",
                self.factory,
                IPairFactory::getPairCall {
                    tokenA: token,
                    tokenB: self.usdc,
                },
            )
            .await
            .ok()?
            .pair;
        if pair == Address::ZERO {
            return None;
        }

        let token0 = self
            .reader
            .read("pool_token0", pair, IPool::token0Call {})
            .await
            .ok()?
            .token;
        let reserves = self
            .reader
            .read("pool_get_reserves", pair, IPool::getReservesCall {})
            .await
            .ok()?;
        let decimals = self
            .reader
            .read("erc20_decimals", token, IERC20::decimalsCall {})
            .await
            .map(|ret| ret.dec)
            .unwrap_or(18);

        let (token_reserve, usdc_reserve) = if token0 == token {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };

        let token_units = token_reserve.to::<U256>().to_string().parse::<f64>().ok()?
            / 10f64.powi(decimals as i32);
        let usdc_units =
            usdc_reserve.to::<U256>().to_string().parse::<f64>().ok()? / 1e6;
        if token_units <= 0.0 || usdc_units <= 0.0 {
            return None;
        }
        Some(usdc_units / token_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;

    fn cache_with_clock() -> (PriceCache, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let cache = PriceCache::new(std::time::Duration::from_secs(300), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn cache_hits_within_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("WETH".into(), 2500.0);
        assert_eq!(cache.get("WETH"), Some(2500.0));

        clock.advance(ChronoDuration::seconds(299));
        assert_eq!(cache.get("WETH"), Some(2500.0));
    }

    #[test]
    fn cache_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.put("WETH".into(), 2500.0);
        clock.advance(ChronoDuration::seconds(301));
        assert_eq!(cache.get("WETH"), None);

        // a fresh write resets the entry's age
        cache.put("WETH".into(), 2600.0);
        assert_eq!(cache.get("WETH"), Some(2600.0));
    }

    #[test]
    fn cache_misses_unknown_symbols() {
        let (cache, _clock) = cache_with_clock();
        assert_eq!(cache.get("AERO"), None);
    }
}
