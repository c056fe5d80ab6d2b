//! Last-resort position recovery from NFT `tokenURI` metadata.
//!
//! Position managers embed the pair, the fee and the price range in the
//! NFT's display metadata. When every struct layout fails to decode, the
//! adapter falls back to parsing that text. Ranges recovered this way are
//! display-grade only; valuation never depends on them.

use alloy::primitives::{Address, U256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

use super::layout::DecodeError;

const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// JSON document behind a `tokenURI`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NftMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Whatever could be salvaged from the metadata text.
#[derive(Debug, Clone, Default)]
pub struct MetadataFields {
    pub pool: Option<Address>,
    pub token0: Option<Address>,
    pub token1: Option<Address>,
    /// Display price range, token1 per token0 in human units.
    pub price_range: Option<(f64, f64)>,
    /// Tick bounds back-derived from the display range, aligned to the
    /// tick spacing. Assumes equal token decimals since the metadata does
    /// not say otherwise.
    pub tick_range: Option<(i32, i32)>,
    pub liquidity: Option<U256>,
}

/// Fetches and parses tokenURI documents: inline data URIs, ipfs:// and
/// plain http(s).
pub struct MetadataResolver {
    http: reqwest::Client,
    ipfs_gateway: String,
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IPFS_GATEWAY)
    }
}

impl MetadataResolver {
    pub fn new(ipfs_gateway: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            ipfs_gateway: ipfs_gateway.to_string(),
        }
    }

    pub async fn fetch(&self, token_uri: &str) -> Result<NftMetadata, DecodeError> {
        if let Some(rest) = token_uri.strip_prefix("data:") {
            return parse_data_uri(rest);
        }

        let target = if let Some(hash) = token_uri.strip_prefix("ipfs://") {
            format!("{}{}", self.ipfs_gateway, hash.trim_start_matches("ipfs/"))
        } else {
            token_uri.to_string()
        };
        let url = Url::parse(&target)
            .map_err(|e| DecodeError::Metadata(format!("bad tokenURI {target}: {e}")))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DecodeError::Metadata(format!("metadata fetch failed: {e}")))?;
        response
            .json::<NftMetadata>()
            .await
            .map_err(|e| DecodeError::Metadata(format!("metadata is not valid JSON: {e}")))
    }
}

fn parse_data_uri(rest: &str) -> Result<NftMetadata, DecodeError> {
    let payload = rest
        .split_once(',')
        .map(|(_, p)| p)
        .ok_or_else(|| DecodeError::Metadata("data URI has no payload".into()))?;

    let json = if rest.split_once(',').map(|(head, _)| head).unwrap_or("").contains("base64") {
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| DecodeError::Metadata(format!("bad base64 payload: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| DecodeError::Metadata(format!("metadata is not utf-8: {e}")))?
    } else {
        payload.to_string()
    };

    serde_json::from_str(&json)
        .map_err(|e| DecodeError::Metadata(format!("metadata is not valid JSON: {e}")))
}

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // display names encode the range as "2257.5<>3047.3"
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)<>(\d+\.?\d*)").unwrap())
}

fn labeled_address_regex(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i){label}\s*(?:address)?\s*:?\s*(0x[0-9a-fA-F]{{40}})"
    ))
    .unwrap()
}

fn liquidity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)liquidity\s*:?\s*(\d+)").unwrap())
}

/// Pull structured fields out of the metadata text.
pub fn extract_fields(metadata: &NftMetadata, tick_spacing: i32) -> MetadataFields {
    let name = metadata.name.as_deref().unwrap_or("");
    let description = metadata.description.as_deref().unwrap_or("");
    let text = format!("{name}\n{description}");

    let find_address = |label: &str| -> Option<Address> {
        labeled_address_regex(label)
            .captures(&text)
            .and_then(|c| Address::from_str(&c[1]).ok())
    };

    let price_range = range_regex().captures(&text).and_then(|c| {
        let lower: f64 = c[1].parse().ok()?;
        let upper: f64 = c[2].parse().ok()?;
        (lower > 0.0 && upper > lower).then_some((lower, upper))
    });

    let tick_range = price_range.map(|(lower, upper)| {
        (
            align_tick(price_to_tick(lower), tick_spacing),
            align_tick(price_to_tick(upper), tick_spacing),
        )
    });

    let liquidity = liquidity_regex()
        .captures(&text)
        .and_then(|c| U256::from_str(&c[1]).ok());

    MetadataFields {
        pool: find_address("pool"),
        token0: find_address("token\\s*0"),
        token1: find_address("token\\s*1"),
        price_range,
        tick_range,
        liquidity,
    }
}

/// Nearest tick at or below the given price, `price = 1.0001^tick`.
pub fn price_to_tick(price: f64) -> i32 {
    (price.ln() / 1.0001f64.ln()).floor() as i32
}

/// Round a tick down to a multiple of the spacing.
pub fn align_tick(tick: i32, spacing: i32) -> i32 {
    if spacing <= 0 {
        return tick;
    }
    tick.div_euclid(spacing) * spacing
}
