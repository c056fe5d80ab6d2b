use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::abi::{IPool, IV4Singleton};
use crate::adapters::{token_info, AdapterError, ProtocolAdapter};
use crate::chain::ChainReader;
use crate::models::{Protocol, RawPosition};

/// Positions held directly against a V4-style singleton manager, probed
/// per candidate pool. No fabricated range: the singleton's position query
/// does not expose tick bounds, so these positions carry none.
pub struct V4SingletonAdapter {
    reader: Arc<ChainReader>,
    singleton: Address,
    pools: Vec<Address>,
    scan_delay: Duration,
}

impl V4SingletonAdapter {
    pub fn new(
        reader: Arc<ChainReader>,
        singleton: Address,
        pools: Vec<Address>,
        scan_delay: Duration,
    ) -> Self {
        Self {
            reader,
            singleton,
            pools,
            scan_delay,
        }
    }

    async fn check_pool(
        &self,
        wallet: Address,
        pool: Address,
    ) -> Result<Option<RawPosition>, AdapterError> {
        let valid = self
            .reader
            .read(
                "singleton_is_valid_pool",
                self.singleton,
                IV4Singleton::isValidPoolCall { pool },
            )
            .await?
            .valid;
        if !valid {
            return Ok(None);
        }

        let position = self
            .reader
            .read(
                "singleton_get_position",
                self.singleton,
                IV4Singleton::getPositionCall {
                    pool,
                    owner: wallet,
                },
            )
            .await?;
        if position.liquidity.is_zero() {
            return Ok(None);
        }

        let token0_addr = self
            .reader
            .read("pool_token0", pool, IPool::token0Call {})
            .await?
            .token;
        let token1_addr = self
            .reader
            .read("pool_token1", pool, IPool::token1Call {})
            .await?
            .token;
        let token0 = token_info(&self.reader, token0_addr).await;
        let token1 = token_info(&self.reader, token1_addr).await;

        info!(pool = %pool, "Found singleton position");

        Ok(Some(RawPosition {
            protocol: Protocol::V4Singleton,
            pool: Some(pool),
            token_id: None,
            token0,
            token1,
            amount0: position.amount0,
            amount1: position.amount1,
            liquidity: position.liquidity,
            tick_range: None,
            current_tick: None,
            fee: None,
            rewards: vec![],
        }))
    }
}

#[async_trait]
impl ProtocolAdapter for V4SingletonAdapter {
    fn protocol_name(&self) -> &'static str {
        "uniswap_v4"
    }

    async fn discover_positions(&self, wallet: Address) -> Result<Vec<RawPosition>, AdapterError> {
        let mut positions = Vec::new();

        for (i, pool) in self.pools.iter().enumerate() {
            if i > 0 && !self.scan_delay.is_zero() {
                sleep(self.scan_delay).await;
            }

            match self.check_pool(wallet, *pool).await {
                Ok(Some(position)) => positions.push(position),
                Ok(None) => {
                    debug!(pool = %pool, "No singleton position in pool");
                }
                Err(e) => {
                    warn!(pool = %pool, error = %e, "Skipping unreadable singleton pool");
                }
            }
        }

        Ok(positions)
    }
}
