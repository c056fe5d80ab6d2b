use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::abi::{IPool, IPositionManager, IPositionsV1};
use crate::adapters::{token_info, AdapterError, ProtocolAdapter};
use crate::chain::ChainReader;
use crate::decode::{
    decode_layout, decode_position, extract_fields, DecodedPosition, MetadataResolver,
    PositionLayout,
};
use crate::error::ChainError;
use crate::models::{Protocol, RawPosition};

/// Tick spacing assumed when back-deriving ticks from metadata text.
const FALLBACK_TICK_SPACING: i32 = 100;

/// Which NFT position-manager family the adapter talks to. They share the
/// ERC-721 enumeration surface but disagree on the `positions()` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NftVariant {
    UniswapV3,
    Slipstream,
}

impl NftVariant {
    fn protocol(&self) -> Protocol {
        match self {
            NftVariant::UniswapV3 => Protocol::ConcentratedUniswapV3,
            NftVariant::Slipstream => Protocol::ConcentratedSlipstream,
        }
    }

    /// (primary, alternate) decode order for this manager family.
    fn layout_preference(&self) -> (PositionLayout, PositionLayout) {
        match self {
            NftVariant::UniswapV3 => (PositionLayout::V1, PositionLayout::V2),
            NftVariant::Slipstream => (PositionLayout::V2, PositionLayout::V1),
        }
    }
}

/// What the position-struct fetch cascade produced.
enum Fetched {
    Struct(DecodedPosition),
    Metadata {
        token0: Address,
        token1: Address,
        pool: Option<Address>,
        liquidity: U256,
        tick_range: Option<(i32, i32)>,
    },
}

/// Concentrated-liquidity positions held as ERC-721 tokens.
pub struct ConcentratedNftAdapter {
    reader: Arc<ChainReader>,
    manager: Address,
    variant: NftVariant,
    metadata: MetadataResolver,
    scan_delay: Duration,
}

impl ConcentratedNftAdapter {
    pub fn new(
        reader: Arc<ChainReader>,
        manager: Address,
        variant: NftVariant,
        metadata: MetadataResolver,
        scan_delay: Duration,
    ) -> Self {
        Self {
            reader,
            manager,
            variant,
            metadata,
            scan_delay,
        }
    }

    /// NFT count, tolerating managers whose `balanceOf` response does not
    /// decode as a clean uint256 word. A count that does not fit a u64 is
    /// not a wallet, it is a broken or hostile contract.
    async fn nft_balance(&self, wallet: Address) -> Result<u64, AdapterError> {
        fn as_count(value: U256) -> Result<u64, AdapterError> {
            u64::try_from(value).map_err(|_| {
                AdapterError::InvalidData(format!("balanceOf returned implausible count {value}"))
            })
        }

        let call = IPositionManager::balanceOfCall { owner: wallet };
        match self.reader.read("nft_balance_of", self.manager, call).await {
            Ok(ret) => as_count(ret.balance),
            Err(ChainError::Decode { .. }) => {
                let data = Bytes::from(IPositionManager::balanceOfCall { owner: wallet }.abi_encode());
                let raw = self
                    .reader
                    .call_raw("nft_balance_of_raw", self.manager, data)
                    .await?;
                let value = U256::try_from_be_slice(&raw).ok_or_else(|| {
                    AdapterError::InvalidData(format!(
                        "balanceOf returned {} unparseable bytes",
                        raw.len()
                    ))
                })?;
                as_count(value)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch one token's position struct, working down the cascade:
    /// primary layout, alternate layout, blind layout dispatch, and
    /// finally the tokenURI metadata text.
    async fn fetch_position(&self, token_id: U256) -> Result<Fetched, AdapterError> {
        // All layouts answer the same selector, so one raw call serves
        // every decode attempt.
        let data = Bytes::from(IPositionsV1::positionsCall { tokenId: token_id }.abi_encode());
        let raw = self.reader.call_raw("positions", self.manager, data).await?;

        let (primary, alternate) = self.variant.layout_preference();
        if let Ok(decoded) = decode_layout(primary, &raw) {
            return Ok(Fetched::Struct(decoded));
        }
        if let Ok(decoded) = decode_layout(alternate, &raw) {
            debug!(token_id = %token_id, layout = ?alternate, "Position decoded with alternate layout");
            return Ok(Fetched::Struct(decoded));
        }
        match decode_position(&raw) {
            Ok(decoded) => {
                debug!(token_id = %token_id, layout = ?decoded.layout, "Position decoded by blind dispatch");
                Ok(Fetched::Struct(decoded))
            }
            Err(e) => {
                warn!(token_id = %token_id, error = %e, "Position struct undecodable, trying tokenURI metadata");
                self.position_from_metadata(token_id).await
            }
        }
    }

    async fn position_from_metadata(&self, token_id: U256) -> Result<Fetched, AdapterError> {
        let uri = self
            .reader
            .read(
                "nft_token_uri",
                self.manager,
                IPositionManager::tokenURICall { tokenId: token_id },
            )
            .await?
            .uri;
        let document = self
            .metadata
            .fetch(&uri)
            .await
            .map_err(|e| AdapterError::InvalidData(e.to_string()))?;
        let fields = extract_fields(&document, FALLBACK_TICK_SPACING);

        match (fields.token0, fields.token1, fields.liquidity) {
            (Some(token0), Some(token1), Some(liquidity)) => {
                warn!(
                    token_id = %token_id,
                    "Position recovered from display metadata; range is low-confidence"
                );
                Ok(Fetched::Metadata {
                    token0,
                    token1,
                    pool: fields.pool,
                    liquidity,
                    tick_range: fields.tick_range,
                })
            }
            _ => Err(AdapterError::InvalidData(format!(
                "metadata for token {token_id} is missing pair or liquidity"
            ))),
        }
    }

    async fn current_tick(&self, pool: Option<Address>) -> Option<i32> {
        let pool = pool?;
        self.reader
            .read("pool_slot0", pool, IPool::slot0Call {})
            .await
            .ok()
            .map(|slot| slot.tick.as_i32())
    }

    async fn build_position(&self, token_id: U256, fetched: Fetched) -> Option<RawPosition> {
        match fetched {
            Fetched::Struct(decoded) => {
                if decoded.liquidity == 0 {
                    debug!(token_id = %token_id, "Skipping closed position");
                    return None;
                }
                let token0 = token_info(&self.reader, decoded.token0).await;
                let token1 = token_info(&self.reader, decoded.token1).await;
                let current_tick = self.current_tick(decoded.pool).await;
                Some(RawPosition {
                    protocol: self.variant.protocol(),
                    pool: decoded.pool,
                    token_id: Some(token_id),
                    token0,
                    token1,
                    amount0: decoded.tokens_owed0,
                    amount1: decoded.tokens_owed1,
                    liquidity: U256::from(decoded.liquidity),
                    tick_range: Some((decoded.tick_lower, decoded.tick_upper)),
                    current_tick,
                    fee: decoded.fee,
                    rewards: vec![],
                })
            }
            Fetched::Metadata {
                token0,
                token1,
                pool,
                liquidity,
                tick_range,
            } => {
                if liquidity.is_zero() {
                    return None;
                }
                let token0 = token_info(&self.reader, token0).await;
                let token1 = token_info(&self.reader, token1).await;
                let current_tick = self.current_tick(pool).await;
                Some(RawPosition {
                    protocol: self.variant.protocol(),
                    pool,
                    token_id: Some(token_id),
                    token0,
                    token1,
                    amount0: U256::ZERO,
                    amount1: U256::ZERO,
                    liquidity,
                    tick_range,
                    current_tick,
                    fee: None,
                    rewards: vec![],
                })
            }
        }
    }
}

#[async_trait]
impl ProtocolAdapter for ConcentratedNftAdapter {
    fn protocol_name(&self) -> &'static str {
        match self.variant {
            NftVariant::UniswapV3 => "uniswap_v3",
            NftVariant::Slipstream => "slipstream",
        }
    }

    async fn discover_positions(&self, wallet: Address) -> Result<Vec<RawPosition>, AdapterError> {
        let balance = self.nft_balance(wallet).await?;
        if balance == 0 {
            return Ok(vec![]);
        }
        info!(manager = %self.manager, count = balance, "Enumerating position NFTs");

        let mut positions = Vec::new();
        for index in 0..balance {
            if index > 0 && !self.scan_delay.is_zero() {
                sleep(self.scan_delay).await;
            }

            let token_id = match self
                .reader
                .read(
                    "nft_token_by_index",
                    self.manager,
                    IPositionManager::tokenOfOwnerByIndexCall {
                        owner: wallet,
                        index: U256::from(index),
                    },
                )
                .await
            {
                Ok(ret) => ret.tokenId,
                Err(e) => {
                    warn!(index, error = %e, "Skipping unreadable token index");
                    continue;
                }
            };

            // Enumeration can lag transfers; only trust tokens the wallet
            // still owns.
            match self
                .reader
                .read(
                    "nft_owner_of",
                    self.manager,
                    IPositionManager::ownerOfCall { tokenId: token_id },
                )
                .await
            {
                Ok(ret) if ret.owner == wallet => {}
                Ok(_) => {
                    debug!(token_id = %token_id, "Token no longer owned by wallet, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(token_id = %token_id, error = %e, "ownerOf failed, skipping token");
                    continue;
                }
            }

            match self.fetch_position(token_id).await {
                Ok(fetched) => {
                    if let Some(position) = self.build_position(token_id, fetched).await {
                        positions.push(position);
                    }
                }
                Err(e) => {
                    warn!(token_id = %token_id, error = %e, "Skipping unfetchable position");
                }
            }
        }

        Ok(positions)
    }
}
