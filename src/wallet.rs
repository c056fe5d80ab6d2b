//! Plain wallet holdings: native balance plus a known-token sweep.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::abi::IERC20;
use crate::addresses::KnownToken;
use crate::chain::ChainReader;
use crate::error::ChainError;
use crate::models::amount_from_raw;
use crate::pricing::PriceOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Native,
    Erc20,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub kind: AssetKind,
    pub token_address: Option<String>,
    pub balance: String,
    pub decimals: u8,
    pub usd_value: Option<String>,
}

/// Scans a wallet's spot balances across the native asset and a fixed
/// token list. Zero balances are omitted.
pub struct WalletScanner {
    reader: Arc<ChainReader>,
    oracle: Arc<PriceOracle>,
    tokens: Vec<KnownToken>,
    scan_delay: Duration,
}

impl WalletScanner {
    pub fn new(
        reader: Arc<ChainReader>,
        oracle: Arc<PriceOracle>,
        tokens: Vec<KnownToken>,
        scan_delay: Duration,
    ) -> Self {
        Self {
            reader,
            oracle,
            tokens,
            scan_delay,
        }
    }

    pub async fn scan(&self, wallet: Address) -> Result<Vec<TokenBalance>, ChainError> {
        let mut balances = Vec::new();

        let native = self.reader.get_balance(wallet).await?;
        if !native.is_zero() {
            let amount = amount_from_raw(native, 18);
            let price = self.oracle.price_of("ETH", None).await;
            balances.push(TokenBalance {
                symbol: "ETH".to_string(),
                kind: AssetKind::Native,
                token_address: None,
                balance: amount.to_string(),
                decimals: 18,
                usd_value: usd_string(&amount, price),
            });
        }

        for token in &self.tokens {
            if !self.scan_delay.is_zero() {
                sleep(self.scan_delay).await;
            }

            let raw = match self
                .reader
                .read(
                    "erc20_balance_of",
                    token.address,
                    IERC20::balanceOfCall { owner: wallet },
                )
                .await
            {
                Ok(ret) => ret.balance,
                Err(e) => {
                    warn!(token = token.symbol, error = %e, "Skipping unreadable token balance");
                    continue;
                }
            };
            if raw.is_zero() {
                debug!(token = token.symbol, "Zero balance");
                continue;
            }

            let amount = amount_from_raw(raw, token.decimals);
            let price = self
                .oracle
                .price_of(token.symbol, Some(token.address))
                .await;
            balances.push(TokenBalance {
                symbol: token.symbol.to_string(),
                kind: AssetKind::Erc20,
                token_address: Some(token.address.to_checksum(None)),
                balance: amount.to_string(),
                decimals: token.decimals,
                usd_value: usd_string(&amount, price),
            });
        }

        Ok(balances)
    }
}

fn usd_string(amount: &bigdecimal::BigDecimal, price: f64) -> Option<String> {
    if price <= 0.0 {
        return None;
    }
    let price = bigdecimal::BigDecimal::try_from(price).ok()?;
    Some(
        (amount * price)
            .with_scale_round(2, bigdecimal::RoundingMode::HalfUp)
            .to_string(),
    )
}
