use serde::{Deserialize, Serialize};
use std::env;

use crate::chain::RetryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub chain: ChainSettings,
    pub retry: RetrySettings,
    pub scan: ScanSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    /// Tried in order until one answers on the expected chain.
    pub rpc_endpoints: Vec<String>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Pause between consecutive candidate probes, to stay under public
    /// endpoint rate limits. Zero disables pacing (tests).
    pub rate_limit_delay_ms: u64,
    pub position_cache_ttl_secs: u64,
    pub price_cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            chain: ChainSettings::default(),
            retry: RetrySettings::default(),
            scan: ScanSettings::default(),
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        ChainSettings {
            rpc_endpoints: vec![
                "https://mainnet.base.org".to_string(),
                "https://base.llamarpc.com".to_string(),
                "https://base-rpc.publicnode.com".to_string(),
                "https://1rpc.io/base".to_string(),
            ],
            chain_id: 8453,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            rate_limit_delay_ms: 100,
            position_cache_ttl_secs: 300,
            price_cache_ttl_secs: 60,
        }
    }
}

impl Settings {
    /// Defaults overridden by environment variables, `.env` honored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Settings::default();

        Settings {
            chain: ChainSettings {
                rpc_endpoints: env::var("BASEFOLIO_RPC_URLS")
                    .map(|urls| {
                        urls.split(',')
                            .map(|u| u.trim().to_string())
                            .filter(|u| !u.is_empty())
                            .collect()
                    })
                    .unwrap_or(defaults.chain.rpc_endpoints),
                chain_id: env_parse("BASEFOLIO_CHAIN_ID", defaults.chain.chain_id),
            },
            retry: RetrySettings {
                max_retries: env_parse("BASEFOLIO_MAX_RETRIES", defaults.retry.max_retries),
                initial_delay_ms: env_parse(
                    "BASEFOLIO_RETRY_DELAY_MS",
                    defaults.retry.initial_delay_ms,
                ),
            },
            scan: ScanSettings {
                rate_limit_delay_ms: env_parse(
                    "BASEFOLIO_RATE_LIMIT_DELAY_MS",
                    defaults.scan.rate_limit_delay_ms,
                ),
                position_cache_ttl_secs: env_parse(
                    "BASEFOLIO_POSITION_CACHE_TTL_SECS",
                    defaults.scan.position_cache_ttl_secs,
                ),
                price_cache_ttl_secs: env_parse(
                    "BASEFOLIO_PRICE_CACHE_TTL_SECS",
                    defaults.scan.price_cache_ttl_secs,
                ),
            },
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry.max_retries,
            initial_delay_ms: self.retry.initial_delay_ms,
        }
    }

    pub fn rate_limit_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scan.rate_limit_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.chain.chain_id, 8453);
        assert!(!settings.chain.rpc_endpoints.is_empty());
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.scan.position_cache_ttl_secs, 300);
    }

    #[test]
    fn retry_config_mirrors_settings() {
        let mut settings = Settings::default();
        settings.retry.max_retries = 5;
        settings.retry.initial_delay_ms = 250;
        let retry = settings.retry_config();
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.initial_delay_ms, 250);
    }
}
