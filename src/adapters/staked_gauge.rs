use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::abi::{IGauge, IPool, IVoter};
use crate::adapters::{token_info, AdapterError, ProtocolAdapter};
use crate::chain::ChainReader;
use crate::models::{pro_rata, Protocol, RawPosition, RawReward};

/// LP tokens staked into ve(3,3) gauges. The wallet's pool balance is zero
/// while staked, so these are invisible to the standard-pool scan; the
/// voter contract maps each pool to its gauge, and the gauge holds the
/// stake and the accrued emissions.
pub struct StakedGaugeAdapter {
    reader: Arc<ChainReader>,
    voter: Address,
    pools: Vec<Address>,
    scan_delay: Duration,
}

impl StakedGaugeAdapter {
    pub fn new(
        reader: Arc<ChainReader>,
        voter: Address,
        pools: Vec<Address>,
        scan_delay: Duration,
    ) -> Self {
        Self {
            reader,
            voter,
            pools,
            scan_delay,
        }
    }

    async fn check_pool(
        &self,
        wallet: Address,
        pool: Address,
    ) -> Result<Option<RawPosition>, AdapterError> {
        let gauge = self
            .reader
            .read("voter_gauges", self.voter, IVoter::gaugesCall { pool })
            .await?
            .gauge;
        if gauge == Address::ZERO {
            return Ok(None);
        }

        let alive = self
            .reader
            .read("voter_is_alive", self.voter, IVoter::isAliveCall { gauge })
            .await?
            .alive;
        if !alive {
            debug!(pool = %pool, gauge = %gauge, "Gauge is killed, skipping");
            return Ok(None);
        }

        let staked = self
            .reader
            .read(
                "gauge_balance_of",
                gauge,
                IGauge::balanceOfCall { account: wallet },
            )
            .await?
            .balance;
        if staked.is_zero() {
            return Ok(None);
        }

        // Emissions are display data; a failed read must not drop the stake.
        let earned = match self
            .reader
            .read("gauge_earned", gauge, IGauge::earnedCall { account: wallet })
            .await
        {
            Ok(ret) => ret.amount,
            Err(e) => {
                warn!(gauge = %gauge, error = %e, "earned() unreadable, reporting zero rewards");
                U256::ZERO
            }
        };
        let (reward_token, reward_symbol) = match self
            .reader
            .read("gauge_reward_token", gauge, IGauge::rewardTokenCall {})
            .await
        {
            Ok(ret) => (
                Some(ret.token),
                token_info(&self.reader, ret.token).await.symbol,
            ),
            Err(_) => (None, "AERO".to_string()),
        };

        let total_supply = self
            .reader
            .read("pool_total_supply", pool, IPool::totalSupplyCall {})
            .await?
            .supply;
        let reserves = self
            .reader
            .read("pool_get_reserves", pool, IPool::getReservesCall {})
            .await?;
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

        // Staked LP is still a share of the pool; same pro-rata math as an
        // unstaked balance, against the pool's own total supply.
        let amount0 = pro_rata(reserves.reserve0.to::<U256>(), staked, total_supply);
        let amount1 = pro_rata(reserves.reserve1.to::<U256>(), staked, total_supply);

        info!(
            pool = %pool,
            gauge = %gauge,
            token0 = %token0.symbol,
            token1 = %token1.symbol,
            "Found staked gauge position"
        );

        let mut rewards = vec![];
        if !earned.is_zero() {
            rewards.push(RawReward {
                token: reward_token,
                symbol: reward_symbol,
                amount: earned,
                decimals: 18,
            });
        }

        Ok(Some(RawPosition {
            protocol: Protocol::StakedGauge,
            pool: Some(pool),
            token_id: None,
            token0,
            token1,
            amount0,
            amount1,
            liquidity: staked,
            tick_range: None,
            current_tick: None,
            fee: None,
            rewards,
        }))
    }
}

#[async_trait]
impl ProtocolAdapter for StakedGaugeAdapter {
    fn protocol_name(&self) -> &'static str {
        "staked_gauge"
    }

    async fn discover_positions(&self, wallet: Address) -> Result<Vec<RawPosition>, AdapterError> {
        let mut positions = Vec::new();

        for (i, pool) in self.pools.iter().enumerate() {
            if i > 0 && !self.scan_delay.is_zero() {
                sleep(self.scan_delay).await;
            }

            match self.check_pool(wallet, *pool).await {
                Ok(Some(position)) => positions.push(position),
                Ok(None) => {}
                Err(e) => {
                    warn!(pool = %pool, error = %e, "Skipping unreadable gauge pool");
                }
            }
        }

        Ok(positions)
    }
}
