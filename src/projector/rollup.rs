//! Daily rollups: per-user action counting and the pool snapshot refreshed on every
//! pool-level event.

use super::{Projector, ProjectorError};
use crate::domain::daily::user_daily_id;
use crate::domain::{
    ActionKind, Address, Amount, Pool, PoolDailyData, ProtocolDailyData, UserDailyData,
};
use tracing::{debug, warn};

impl Projector {
    /// Count one action by `user` in today's rollups and persist the user-daily and
    /// protocol-daily records.
    pub(super) async fn record_user_action(
        &self,
        protocol_daily: &mut ProtocolDailyData,
        user: &Address,
        kind: ActionKind,
        timestamp: i64,
    ) -> Result<(), ProjectorError> {
        let id = user_daily_id(user, timestamp);
        let mut user_daily = match self.repo.load_user_daily(&id).await? {
            Some(daily) => daily,
            None => {
                protocol_daily.unique_user_count += 1;
                UserDailyData::new(user.clone(), timestamp)
            }
        };

        let first_today = user_daily.count_action(kind);
        protocol_daily.count_action(kind, first_today);

        self.repo.save_user_daily(&user_daily).await?;
        self.repo.save_protocol_daily(protocol_daily).await?;
        debug!(%user, action = %kind, first_today, "user action recorded");
        Ok(())
    }

    /// Load today's pool record and overwrite its snapshot fields from the pool contract.
    ///
    /// A failed read keeps the field's previous value. Token distributions are rebuilt from
    /// zero whenever the price feed resolves.
    pub(super) async fn refresh_pool_daily(
        &self,
        pool: &Pool,
        timestamp: i64,
    ) -> Result<PoolDailyData, ProjectorError> {
        let token_count = usize::try_from(pool.token_count).unwrap_or(0);
        let mut daily = self
            .load_or_create_pool_daily(&pool.address, timestamp, token_count)
            .await?;

        match self.chain.pool_value(&pool.address).await {
            Ok(value) => daily.pool_value = value,
            Err(e) => warn!(pool = %pool.address, error = %e, "pool value read failed"),
        }

        match self.chain.lp_token(&pool.address).await {
            Ok(lp_token) => match self.chain.total_supply(&lp_token).await {
                Ok(supply) => daily.total_supply = supply,
                Err(e) => warn!(%lp_token, error = %e, "lp supply read failed"),
            },
            Err(e) => warn!(pool = %pool.address, error = %e, "lp token read failed"),
        }

        let oracle = match self.chain.oracle(&pool.address).await {
            Ok(oracle) => oracle,
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "oracle read failed, distributions kept");
                daily.token_distributions.resize(token_count, Amount::zero());
                return Ok(daily);
            }
        };

        let mut distributions = vec![Amount::zero(); token_count];
        for (index, slot) in (0u32..).zip(distributions.iter_mut()) {
            let token = match self.chain.whitelisted_token(&pool.address, index).await {
                Ok(token) => token,
                Err(e) => {
                    warn!(
                        pool = %pool.address,
                        index,
                        error = %e,
                        "whitelisted token read failed"
                    );
                    continue;
                }
            };
            let amount = self.chain.pool_amount(&pool.address, &token).await;
            let price = self.chain.get_price(&oracle, &token).await;
            match (amount, price) {
                (Ok(amount), Ok(price)) => *slot = amount * price,
                (Err(e), _) | (_, Err(e)) => {
                    warn!(pool = %pool.address, %token, error = %e, "distribution read failed")
                }
            }
        }
        daily.token_distributions = distributions;
        Ok(daily)
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::MockChainReader;
    use crate::config::ProjectorConfig;
    use crate::db::{init_db, Repository};
    use crate::domain::{ActionKind, Address, Amount, Pool, ProtocolDailyData, PROTOCOL_ID};
    use crate::projector::Projector;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn addr(byte: char) -> Address {
        Address::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    async fn projector(chain: MockChainReader) -> (TempDir, Projector) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = init_db(db_path.to_str().unwrap()).await.unwrap();
        let repo = Arc::new(Repository::new(pool));
        let projector = Projector::new(repo, Arc::new(chain), ProjectorConfig::default());
        (dir, projector)
    }

    #[tokio::test]
    async fn test_record_user_action_counts_unique_once_per_day() {
        let (_dir, projector) = projector(MockChainReader::new()).await;
        let mut daily = ProtocolDailyData::new(1_700_000_000);
        let user = addr('1');

        projector
            .record_user_action(&mut daily, &user, ActionKind::Swap, 1_700_000_000)
            .await
            .unwrap();
        projector
            .record_user_action(&mut daily, &user, ActionKind::Swap, 1_700_000_100)
            .await
            .unwrap();
        projector
            .record_user_action(&mut daily, &user, ActionKind::Trade, 1_700_000_200)
            .await
            .unwrap();

        assert_eq!(daily.swap_count, 2);
        assert_eq!(daily.unique_swap_count, 1);
        assert_eq!(daily.trade_count, 1);
        assert_eq!(daily.unique_trade_count, 1);
        assert_eq!(daily.unique_user_count, 1);

        let stored = projector
            .repo
            .load_protocol_daily(&daily.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, daily);
    }

    #[tokio::test]
    async fn test_refresh_pool_daily_snapshot() {
        let pool_addr = addr('a');
        let oracle = addr('0');
        let lp = addr('b');
        let (t1, t2) = (addr('1'), addr('2'));
        let chain = MockChainReader::new()
            .with_pool_value(pool_addr.clone(), Amount::from(5000i64))
            .with_lp_token(pool_addr.clone(), lp.clone())
            .with_total_supply(lp, Amount::from(100i64))
            .with_oracle(pool_addr.clone(), oracle.clone())
            .with_whitelisted_token(pool_addr.clone(), t1.clone())
            .with_whitelisted_token(pool_addr.clone(), t2.clone())
            .with_pool_amount(pool_addr.clone(), t1.clone(), Amount::from(3i64))
            .with_price(oracle.clone(), t1, Amount::from(7i64));
        let (_dir, projector) = projector(chain).await;

        let mut pool = Pool::new(pool_addr, PROTOCOL_ID);
        pool.token_count = 2;
        let daily = projector
            .refresh_pool_daily(&pool, 1_700_000_000)
            .await
            .unwrap();

        assert_eq!(daily.pool_value, Amount::from(5000i64));
        assert_eq!(daily.total_supply, Amount::from(100i64));
        // the second token has no pooled amount configured
        assert_eq!(
            daily.token_distributions,
            vec![Amount::from(21i64), Amount::zero()]
        );
    }

    #[tokio::test]
    async fn test_refresh_pool_daily_without_oracle_keeps_previous() {
        let pool_addr = addr('a');
        let (_dir, projector) = projector(MockChainReader::new()).await;
        let mut pool = Pool::new(pool_addr, PROTOCOL_ID);
        pool.token_count = 1;

        let mut stored = projector
            .refresh_pool_daily(&pool, 1_700_000_000)
            .await
            .unwrap();
        stored.pool_value = Amount::from(9i64);
        stored.token_distributions = vec![Amount::from(4i64)];
        projector.repo.save_pool_daily(&stored).await.unwrap();

        pool.token_count = 2;
        let daily = projector
            .refresh_pool_daily(&pool, 1_700_000_050)
            .await
            .unwrap();
        assert_eq!(daily.pool_value, Amount::from(9i64));
        assert_eq!(
            daily.token_distributions,
            vec![Amount::from(4i64), Amount::zero()]
        );
    }
}
