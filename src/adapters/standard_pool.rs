use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::abi::{IPairFactory, IPool};
use crate::adapters::{token_info, AdapterError, ProtocolAdapter};
use crate::chain::ChainReader;
use crate::models::{pro_rata, Protocol, RawPosition};

/// Full-range pool positions held as fungible LP tokens.
///
/// Factories expose no "pools of this wallet" query, so discovery probes an
/// allow-list of token pairs through `getPair` and checks the wallet's LP
/// balance in each resulting pool.
pub struct StandardPoolAdapter {
    reader: Arc<ChainReader>,
    factory: Address,
    pairs: Vec<(Address, Address)>,
    scan_delay: Duration,
}

impl StandardPoolAdapter {
    pub fn new(
        reader: Arc<ChainReader>,
        factory: Address,
        pairs: Vec<(Address, Address)>,
        scan_delay: Duration,
    ) -> Self {
        Self {
            reader,
            factory,
            pairs,
            scan_delay,
        }
    }

    async fn check_pair(
        &self,
        wallet: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<RawPosition>, AdapterError> {
        let pair = self
            .reader
            .read(
                "factory_get_pair",
                self.factory,
                IPairFactory::getPairCall {
                    tokenA: token_a,
                    tokenB: token_b,
                },
            )
            .await?
            .pair;
        if pair == Address::ZERO {
            return Ok(None);
        }

        let balance = self
            .reader
            .read("pool_balance_of", pair, IPool::balanceOfCall { owner: wallet })
            .await?
            .balance;
        if balance.is_zero() {
            return Ok(None);
        }

        let total_supply = self
            .reader
            .read("pool_total_supply", pair, IPool::totalSupplyCall {})
            .await?
            .supply;
        let reserves = self
            .reader
            .read("pool_get_reserves", pair, IPool::getReservesCall {})
            .await?;
        let token0_addr = self
            .reader
            .read("pool_token0", pair, IPool::token0Call {})
            .await?
            .token;
        let token1_addr = self
            .reader
            .read("pool_token1", pair, IPool::token1Call {})
            .await?
            .token;

        let token0 = token_info(&self.reader, token0_addr).await;
        let token1 = token_info(&self.reader, token1_addr).await;

        let amount0 = pro_rata(reserves.reserve0.to::<U256>(), balance, total_supply);
        let amount1 = pro_rata(reserves.reserve1.to::<U256>(), balance, total_supply);

        // Not every factory's pools expose fee(); absence is fine.
        let fee = self
            .reader
            .read("pool_fee", pair, IPool::feeCall {})
            .await
            .ok()
            .map(|ret| ret.feeAmount.to::<u32>());

        info!(
            pool = %pair,
            token0 = %token0.symbol,
            token1 = %token1.symbol,
            "Found LP position"
        );

        Ok(Some(RawPosition {
            protocol: Protocol::StandardPool,
            pool: Some(pair),
            token_id: None,
            token0,
            token1,
            amount0,
            amount1,
            liquidity: balance,
            tick_range: None,
            current_tick: None,
            fee,
            rewards: vec![],
        }))
    }
}

#[async_trait]
impl ProtocolAdapter for StandardPoolAdapter {
    fn protocol_name(&self) -> &'static str {
        "standard_pool"
    }

    async fn discover_positions(&self, wallet: Address) -> Result<Vec<RawPosition>, AdapterError> {
        let mut positions = Vec::new();

        for (i, (token_a, token_b)) in self.pairs.iter().enumerate() {
            if i > 0 && !self.scan_delay.is_zero() {
                sleep(self.scan_delay).await;
            }

            match self.check_pair(wallet, *token_a, *token_b).await {
                Ok(Some(position)) => positions.push(position),
                Ok(None) => {
                    debug!(token_a = %token_a, token_b = %token_b, "No LP balance in pair");
                }
                Err(e) => {
                    warn!(
                        token_a = %token_a,
                        token_b = %token_b,
                        error = %e,
                        "Skipping unreadable pair"
                    );
                }
            }
        }

        Ok(positions)
    }
}
