//! Position-struct decoding across manager ABI variants.
//!
//! Every known `positions(uint256)` return shape is a fixed tuple of
//! static types, so the encoded length pins down the candidate layout
//! before any field decoding happens. The set of layouts is closed and
//! tried in a fixed priority order; adding a variant means adding an enum
//! case here, not another nested fallback at a call site.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use thiserror::Error;

use crate::abi::{IPositionsV1, IPositionsV2, IPositionsV3};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no known layout matches a {len} byte positions() response")]
    NoLayoutMatched { len: usize },

    #[error("layout {layout:?} rejected: {detail}")]
    LayoutRejected {
        layout: PositionLayout,
        detail: String,
    },

    #[error("metadata extraction failed: {0}")]
    Metadata(String),
}

/// Known `positions(uint256)` return shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    /// 12-field classic manager: fee, no pool address.
    V1,
    /// 13-field slipstream manager: tickSpacing, trailing pool address.
    V2,
    /// 7-field minimal manager.
    V3,
}

impl PositionLayout {
    /// Priority order for blind decoding.
    pub const ALL: [PositionLayout; 3] =
        [PositionLayout::V1, PositionLayout::V2, PositionLayout::V3];

    /// Exact encoded length; all fields are head-only static types.
    fn encoded_len(&self) -> usize {
        match self {
            PositionLayout::V1 => 12 * 32,
            PositionLayout::V2 => 13 * 32,
            PositionLayout::V3 => 7 * 32,
        }
    }
}

/// Fields common to all layouts, with layout-specific extras as options.
#[derive(Debug, Clone)]
pub struct DecodedPosition {
    pub layout: PositionLayout,
    pub token0: Address,
    pub token1: Address,
    pub fee: Option<u32>,
    pub tick_spacing: Option<i32>,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed0: U256,
    pub tokens_owed1: U256,
    /// Only the V2 layout carries the pool address inline.
    pub pool: Option<Address>,
}

/// Decode a raw `positions()` response as one specific layout.
pub fn decode_layout(layout: PositionLayout, raw: &[u8]) -> Result<DecodedPosition, DecodeError> {
    if raw.len() != layout.encoded_len() {
        return Err(DecodeError::LayoutRejected {
            layout,
            detail: format!(
                "expected {} bytes, got {}",
                layout.encoded_len(),
                raw.len()
            ),
        });
    }

    let rejected = |e: alloy::sol_types::Error| DecodeError::LayoutRejected {
        layout,
        detail: e.to_string(),
    };

    match layout {
        PositionLayout::V1 => {
            let ret = IPositionsV1::positionsCall::abi_decode_returns(raw, true).map_err(rejected)?;
            Ok(DecodedPosition {
                layout,
                token0: ret.token0,
                token1: ret.token1,
                fee: Some(ret.fee.to::<u32>()),
                tick_spacing: None,
                tick_lower: ret.tickLower.as_i32(),
                tick_upper: ret.tickUpper.as_i32(),
                liquidity: ret.liquidity,
                tokens_owed0: U256::from(ret.tokensOwed0),
                tokens_owed1: U256::from(ret.tokensOwed1),
                pool: None,
            })
        }
        PositionLayout::V2 => {
            let ret = IPositionsV2::positionsCall::abi_decode_returns(raw, true).map_err(rejected)?;
            Ok(DecodedPosition {
                layout,
                token0: ret.token0,
                token1: ret.token1,
                fee: None,
                tick_spacing: Some(ret.tickSpacing.as_i32()),
                tick_lower: ret.tickLower.as_i32(),
                tick_upper: ret.tickUpper.as_i32(),
                liquidity: ret.liquidity,
                tokens_owed0: U256::from(ret.tokensOwed0),
                tokens_owed1: U256::from(ret.tokensOwed1),
                pool: Some(ret.pool),
            })
        }
        PositionLayout::V3 => {
            let ret = IPositionsV3::positionsCall::abi_decode_returns(raw, true).map_err(rejected)?;
            Ok(DecodedPosition {
                layout,
                token0: ret.token0,
                token1: ret.token1,
                fee: None,
                tick_spacing: None,
                tick_lower: ret.tickLower.as_i32(),
                tick_upper: ret.tickUpper.as_i32(),
                liquidity: ret.liquidity,
                tokens_owed0: ret.tokensOwed0,
                tokens_owed1: ret.tokensOwed1,
                pool: None,
            })
        }
    }
}

/// Try every known layout in priority order.
pub fn decode_position(raw: &[u8]) -> Result<DecodedPosition, DecodeError> {
    for layout in PositionLayout::ALL {
        if let Ok(decoded) = decode_layout(layout, raw) {
            return Ok(decoded);
        }
    }
    Err(DecodeError::NoLayoutMatched { len: raw.len() })
}
