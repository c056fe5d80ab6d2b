use alloy::primitives::U256;
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use serde::{Deserialize, Serialize};

/// Which protocol family a position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    StandardPool,
    ConcentratedUniswapV3,
    ConcentratedSlipstream,
    StakedGauge,
    V4Singleton,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::StandardPool => "standard_pool",
            Protocol::ConcentratedUniswapV3 => "uniswap_v3",
            Protocol::ConcentratedSlipstream => "slipstream",
            Protocol::StakedGauge => "staked_gauge",
            Protocol::V4Singleton => "uniswap_v4",
        }
    }

    /// Human-readable name for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::StandardPool => "Standard Pool",
            Protocol::ConcentratedUniswapV3 => "Uniswap V3",
            Protocol::ConcentratedSlipstream => "Aerodrome Slipstream",
            Protocol::StakedGauge => "Aerodrome Gauge",
            Protocol::V4Singleton => "Uniswap V4",
        }
    }
}

/// One side of a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Checksummed address; `None` for the native asset.
    pub address: Option<String>,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenInfo {
    fn default() -> Self {
        Self {
            address: None,
            symbol: "Unknown".to_string(),
            decimals: 18,
        }
    }
}

/// Human-unit token amounts, decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub token0: String,
    pub token1: String,
}

/// Price bounds for a concentrated position, token1-per-token0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower: String,
    pub upper: String,
    pub current: String,
}

/// An unclaimed reward attached to a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub symbol: String,
    pub amount: String,
    pub usd_value: Option<String>,
}

/// Canonical position shape every adapter normalizes into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Stable identifier, unique per (protocol, pool-or-token-id).
    pub id: String,
    pub protocol: Protocol,
    pub pool_address: Option<String>,
    pub token0: TokenInfo,
    pub token1: TokenInfo,
    pub amounts: TokenAmounts,
    /// Raw liquidity figure; magnitude is protocol-specific and not
    /// comparable across protocols.
    pub liquidity: String,
    pub price_range: Option<PriceRange>,
    /// Total USD value, 2 decimal places. `None` means "could not price",
    /// which is distinct from a genuine zero.
    pub value_usd: Option<String>,
    pub rewards: Vec<Reward>,
    /// Fee in hundredths of a basis point as contracts report it
    /// (3000 ⇒ 0.3%).
    pub fee_tier: Option<u32>,
    /// Estimated fee APR in percent. Derived from an assumed volume/TVL
    /// ratio, so indicative only.
    pub apr: Option<f64>,
    /// Range-health score, 0–100, higher is safer.
    pub risk_score: Option<u8>,
}

impl Position {
    /// USD value as a float for ordering; unpriced sorts as zero.
    pub fn value_usd_f64(&self) -> f64 {
        self.value_usd
            .as_deref()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

/// Convert a raw integer token quantity into human units by shifting the
/// decimal point, exactly. `12345` with 3 decimals is `12.345`.
pub fn amount_from_raw(raw: U256, decimals: u8) -> BigDecimal {
    let digits = BigInt::parse_bytes(raw.to_string().as_bytes(), 10)
        .unwrap_or_else(|| BigInt::from(0));
    BigDecimal::new(digits, decimals as i64).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn amount_shifts_decimal_point() {
        assert_eq!(
            amount_from_raw(U256::from(12345u64), 3),
            BigDecimal::from_str("12.345").unwrap()
        );
        assert_eq!(
            amount_from_raw(U256::from(1_500_000u64), 6).to_string(),
            "1.5"
        );
        assert_eq!(amount_from_raw(U256::ZERO, 18).to_string(), "0");
    }

    #[test]
    fn amount_survives_large_values() {
        // 2^255 with 18 decimals must not lose precision
        let raw = U256::from(1u8) << 255;
        let amount = amount_from_raw(raw, 18);
        let scaled = amount * BigDecimal::from_str("1000000000000000000").unwrap();
        assert_eq!(scaled.normalized().to_string(), raw.to_string());
    }

    #[test]
    fn protocol_serde_tags() {
        let json = serde_json::to_string(&Protocol::ConcentratedUniswapV3).unwrap();
        assert_eq!(json, "\"concentrated_uniswap_v3\"");
        let back: Protocol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Protocol::ConcentratedUniswapV3);
    }

    proptest! {
        #[test]
        fn amount_round_trips_through_scaling(raw in any::<u64>(), decimals in 0u8..=24) {
            let amount = amount_from_raw(U256::from(raw), decimals);
            prop_assert!(amount >= BigDecimal::from(0));
            let factor = BigDecimal::new(bigdecimal::num_bigint::BigInt::from(1), -(decimals as i64));
            let scaled = (amount * factor).normalized();
            prop_assert_eq!(scaled.to_string(), BigDecimal::from(raw).normalized().to_string());
        }
    }
}
