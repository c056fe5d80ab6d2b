use bigdecimal::{BigDecimal, RoundingMode};
use std::sync::Arc;
use tracing::debug;

use crate::models::{
    amount_from_raw, Position, PriceRange, Protocol, RawPosition, Reward, TokenAmounts, TokenInfo,
};
use crate::pricing::PriceOracle;
use crate::risk;

/// Display price for one token0 in token1, from a pool tick.
/// Approximation good enough for display, not for settlement.
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    1.0001f64.powi(tick) * 10f64.powi(decimals1 as i32 - decimals0 as i32)
}

/// Fee APR in percent. `fee_percent` is the pool fee as a percentage
/// (0.3 for a 0.3% pool). An empty pool earns nothing; zero TVL yields
/// zero rather than a division error.
pub fn compute_apr(volume_24h: f64, tvl: f64, fee_percent: f64) -> f64 {
    if tvl <= 0.0 {
        return 0.0;
    }
    let daily_fee_revenue = volume_24h * (fee_percent / 100.0);
    (daily_fee_revenue * 365.0 / tvl) * 100.0
}

/// Assumed 24h volume as a fraction of TVL. No volume API is wired in, so
/// this is an admitted estimate; the fraction is per protocol family.
pub fn estimated_volume_24h(tvl: f64, protocol: Protocol) -> f64 {
    let fraction = match protocol {
        Protocol::ConcentratedSlipstream | Protocol::StakedGauge => 0.08,
        Protocol::StandardPool | Protocol::ConcentratedUniswapV3 | Protocol::V4Singleton => 0.10,
    };
    tvl * fraction
}

/// Total USD value of a pair of human-unit amounts.
///
/// Returns `None` when neither token could be priced: "we don't know" is
/// not the same as "worth nothing". A single priced side still values,
/// with the unpriced side contributing zero.
pub fn value_usd(
    amount0: &BigDecimal,
    amount1: &BigDecimal,
    price0: f64,
    price1: f64,
) -> Option<BigDecimal> {
    if price0 <= 0.0 && price1 <= 0.0 {
        return None;
    }
    let p0 = BigDecimal::try_from(price0).unwrap_or_else(|_| BigDecimal::from(0));
    let p1 = BigDecimal::try_from(price1).unwrap_or_else(|_| BigDecimal::from(0));
    Some(amount0 * p0 + amount1 * p1)
}

fn format_usd(value: &BigDecimal) -> String {
    // rounding normalizes zero to scale 0; re-apply the scale so zero
    // still prints as "0.00"
    value
        .with_scale_round(2, RoundingMode::HalfUp)
        .with_scale(2)
        .to_string()
}

fn format_price(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

/// Turns raw discovered positions into fully priced, scored ones.
pub struct Valuer {
    oracle: Arc<PriceOracle>,
}

impl Valuer {
    pub fn new(oracle: Arc<PriceOracle>) -> Self {
        Self { oracle }
    }

    pub async fn enrich(&self, raw: RawPosition) -> Position {
        let amount0 = amount_from_raw(raw.amount0, raw.token0.decimals);
        let amount1 = amount_from_raw(raw.amount1, raw.token1.decimals);

        let price0 = self
            .oracle
            .price_of(&raw.token0.symbol, Some(raw.token0.address))
            .await;
        let price1 = self
            .oracle
            .price_of(&raw.token1.symbol, Some(raw.token1.address))
            .await;

        let value = value_usd(&amount0, &amount1, price0, price1);
        if value.is_none() {
            debug!(id = %raw.id(), "Position is unpriceable");
        }

        let price_range = raw.tick_range.map(|(lower_tick, upper_tick)| {
            let lower = tick_to_price(lower_tick, raw.token0.decimals, raw.token1.decimals);
            let upper = tick_to_price(upper_tick, raw.token0.decimals, raw.token1.decimals);
            let current = match raw.current_tick {
                Some(tick) => tick_to_price(tick, raw.token0.decimals, raw.token1.decimals),
                // no pool tick available; fall back to the oracle ratio
                None if price1 > 0.0 => price0 / price1,
                None => 0.0,
            };
            PriceRange {
                lower: format_price(lower),
                upper: format_price(upper),
                current: format_price(current),
            }
        });

        let risk_score = price_range.as_ref().and_then(risk::score_price_range);

        let mut rewards = Vec::with_capacity(raw.rewards.len());
        for reward in &raw.rewards {
            let amount = amount_from_raw(reward.amount, reward.decimals);
            let price = self.oracle.price_of(&reward.symbol, reward.token).await;
            let usd_value = (price > 0.0)
                .then(|| BigDecimal::try_from(price).ok())
                .flatten()
                .map(|p| format_usd(&(&amount * p)));
            rewards.push(Reward {
                symbol: reward.symbol.clone(),
                amount: amount.to_string(),
                usd_value,
            });
        }

        let apr = match (raw.fee, &value) {
            (Some(fee), Some(value)) => {
                let tvl = value.to_string().parse::<f64>().unwrap_or(0.0);
                let volume = estimated_volume_24h(tvl, raw.protocol);
                Some(compute_apr(volume, tvl, fee as f64 / 10_000.0))
            }
            _ => None,
        };

        Position {
            id: raw.id(),
            protocol: raw.protocol,
            pool_address: raw.pool.map(|p| p.to_checksum(None)),
            token0: TokenInfo {
                address: Some(raw.token0.address.to_checksum(None)),
                symbol: raw.token0.symbol,
                decimals: raw.token0.decimals,
            },
            token1: TokenInfo {
                address: Some(raw.token1.address.to_checksum(None)),
                symbol: raw.token1.symbol,
                decimals: raw.token1.decimals,
            },
            amounts: TokenAmounts {
                token0: amount0.to_string(),
                token1: amount1.to_string(),
            },
            liquidity: raw.liquidity.to_string(),
            price_range,
            value_usd: value.as_ref().map(format_usd),
            rewards,
            fee_tier: raw.fee,
            apr,
            risk_score,
        }
    }
}
