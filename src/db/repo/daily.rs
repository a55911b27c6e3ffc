//! Daily rollup persistence.

use super::{decode_error, get_address, get_amount, now_ms, Repository};
use crate::domain::{Address, Amount, PoolDailyData, ProtocolDailyData, UserDailyData};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn pool_daily_from_row(row: &SqliteRow) -> Result<PoolDailyData, sqlx::Error> {
    let distributions: String = row.try_get("token_distributions")?;
    let token_distributions: Vec<Amount> = serde_json::from_str(&distributions)
        .map_err(|e| decode_error("token_distributions", e))?;

    Ok(PoolDailyData {
        id: row.try_get("id")?,
        pool: get_address(row, "pool")?,
        timestamp: row.try_get("timestamp")?,
        pool_value: get_amount(row, "pool_value")?,
        total_supply: get_amount(row, "total_supply")?,
        swap_volume: get_amount(row, "swap_volume")?,
        swap_fee: get_amount(row, "swap_fee")?,
        mint_lp_value: get_amount(row, "mint_lp_value")?,
        mint_lp_fee: get_amount(row, "mint_lp_fee")?,
        burn_lp_value: get_amount(row, "burn_lp_value")?,
        burn_lp_fee: get_amount(row, "burn_lp_fee")?,
        liquidated_value: get_amount(row, "liquidated_value")?,
        liquidated_fee: get_amount(row, "liquidated_fee")?,
        trading_volume: get_amount(row, "trading_volume")?,
        trading_fee: get_amount(row, "trading_fee")?,
        token_distributions,
        total_long_positions: get_amount(row, "total_long_positions")?,
        total_short_positions: get_amount(row, "total_short_positions")?,
    })
}

fn protocol_daily_from_row(row: &SqliteRow) -> Result<ProtocolDailyData, sqlx::Error> {
    Ok(ProtocolDailyData {
        id: row.try_get("id")?,
        timestamp: row.try_get("timestamp")?,
        swap_volume: get_amount(row, "swap_volume")?,
        swap_fee: get_amount(row, "swap_fee")?,
        mint_lp_value: get_amount(row, "mint_lp_value")?,
        mint_lp_fee: get_amount(row, "mint_lp_fee")?,
        burn_lp_value: get_amount(row, "burn_lp_value")?,
        burn_lp_fee: get_amount(row, "burn_lp_fee")?,
        liquidated_value: get_amount(row, "liquidated_value")?,
        liquidated_fee: get_amount(row, "liquidated_fee")?,
        trading_volume: get_amount(row, "trading_volume")?,
        trading_fee: get_amount(row, "trading_fee")?,
        total_long_positions: get_amount(row, "total_long_positions")?,
        total_short_positions: get_amount(row, "total_short_positions")?,
        profit: get_amount(row, "profit")?,
        loss: get_amount(row, "loss")?,
        cumulative_loss: get_amount(row, "cumulative_loss")?,
        cumulative_profit: get_amount(row, "cumulative_profit")?,
        cumulative_volume: get_amount(row, "cumulative_volume")?,
        cumulative_fee: get_amount(row, "cumulative_fee")?,
        swap_count: row.try_get("swap_count")?,
        burn_lp_count: row.try_get("burn_lp_count")?,
        mint_lp_count: row.try_get("mint_lp_count")?,
        trade_count: row.try_get("trade_count")?,
        unique_swap_count: row.try_get("unique_swap_count")?,
        unique_mint_lp_count: row.try_get("unique_mint_lp_count")?,
        unique_burn_lp_count: row.try_get("unique_burn_lp_count")?,
        unique_trade_count: row.try_get("unique_trade_count")?,
        unique_user_count: row.try_get("unique_user_count")?,
    })
}

fn user_daily_from_row(row: &SqliteRow) -> Result<UserDailyData, sqlx::Error> {
    Ok(UserDailyData {
        id: row.try_get("id")?,
        address: get_address(row, "address")?,
        timestamp: row.try_get("timestamp")?,
        swap_count: row.try_get("swap_count")?,
        burn_lp_count: row.try_get("burn_lp_count")?,
        mint_lp_count: row.try_get("mint_lp_count")?,
        trade_count: row.try_get("trade_count")?,
    })
}

impl Repository {
    pub async fn load_pool_daily(&self, id: &str) -> Result<Option<PoolDailyData>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM pool_daily_data WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(pool_daily_from_row).transpose()
    }

    pub async fn save_pool_daily(&self, data: &PoolDailyData) -> Result<(), sqlx::Error> {
        let distributions = serde_json::to_string(&data.token_distributions)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO pool_daily_data (id, pool, timestamp, pool_value, total_supply, swap_volume,
                                         swap_fee, mint_lp_value, mint_lp_fee, burn_lp_value,
                                         burn_lp_fee, liquidated_value, liquidated_fee,
                                         trading_volume, trading_fee, token_distributions,
                                         total_long_positions, total_short_positions, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                pool_value = excluded.pool_value,
                total_supply = excluded.total_supply,
                swap_volume = excluded.swap_volume,
                swap_fee = excluded.swap_fee,
                mint_lp_value = excluded.mint_lp_value,
                mint_lp_fee = excluded.mint_lp_fee,
                burn_lp_value = excluded.burn_lp_value,
                burn_lp_fee = excluded.burn_lp_fee,
                liquidated_value = excluded.liquidated_value,
                liquidated_fee = excluded.liquidated_fee,
                trading_volume = excluded.trading_volume,
                trading_fee = excluded.trading_fee,
                token_distributions = excluded.token_distributions,
                total_long_positions = excluded.total_long_positions,
                total_short_positions = excluded.total_short_positions,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&data.id)
        .bind(data.pool.as_str())
        .bind(data.timestamp)
        .bind(data.pool_value.to_canonical_string())
        .bind(data.total_supply.to_canonical_string())
        .bind(data.swap_volume.to_canonical_string())
        .bind(data.swap_fee.to_canonical_string())
        .bind(data.mint_lp_value.to_canonical_string())
        .bind(data.mint_lp_fee.to_canonical_string())
        .bind(data.burn_lp_value.to_canonical_string())
        .bind(data.burn_lp_fee.to_canonical_string())
        .bind(data.liquidated_value.to_canonical_string())
        .bind(data.liquidated_fee.to_canonical_string())
        .bind(data.trading_volume.to_canonical_string())
        .bind(data.trading_fee.to_canonical_string())
        .bind(distributions)
        .bind(data.total_long_positions.to_canonical_string())
        .bind(data.total_short_positions.to_canonical_string())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Pool buckets whose start lies in `[from, to]`, oldest first.
    pub async fn list_pool_daily(
        &self,
        pool: &Address,
        from: i64,
        to: i64,
    ) -> Result<Vec<PoolDailyData>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM pool_daily_data
            WHERE pool = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(pool.as_str())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(pool_daily_from_row).collect()
    }

    pub async fn load_protocol_daily(
        &self,
        id: &str,
    ) -> Result<Option<ProtocolDailyData>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM protocol_daily_data WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(protocol_daily_from_row).transpose()
    }

    pub async fn save_protocol_daily(&self, data: &ProtocolDailyData) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO protocol_daily_data (id, timestamp, swap_volume, swap_fee, mint_lp_value,
                                             mint_lp_fee, burn_lp_value, burn_lp_fee,
                                             liquidated_value, liquidated_fee, trading_volume,
                                             trading_fee, total_long_positions,
                                             total_short_positions, profit, loss, cumulative_loss,
                                             cumulative_profit, cumulative_volume, cumulative_fee,
                                             swap_count, burn_lp_count, mint_lp_count, trade_count,
                                             unique_swap_count, unique_mint_lp_count,
                                             unique_burn_lp_count, unique_trade_count,
                                             unique_user_count, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                swap_volume = excluded.swap_volume,
                swap_fee = excluded.swap_fee,
                mint_lp_value = excluded.mint_lp_value,
                mint_lp_fee = excluded.mint_lp_fee,
                burn_lp_value = excluded.burn_lp_value,
                burn_lp_fee = excluded.burn_lp_fee,
                liquidated_value = excluded.liquidated_value,
                liquidated_fee = excluded.liquidated_fee,
                trading_volume = excluded.trading_volume,
                trading_fee = excluded.trading_fee,
                total_long_positions = excluded.total_long_positions,
                total_short_positions = excluded.total_short_positions,
                profit = excluded.profit,
                loss = excluded.loss,
                cumulative_loss = excluded.cumulative_loss,
                cumulative_profit = excluded.cumulative_profit,
                cumulative_volume = excluded.cumulative_volume,
                cumulative_fee = excluded.cumulative_fee,
                swap_count = excluded.swap_count,
                burn_lp_count = excluded.burn_lp_count,
                mint_lp_count = excluded.mint_lp_count,
                trade_count = excluded.trade_count,
                unique_swap_count = excluded.unique_swap_count,
                unique_mint_lp_count = excluded.unique_mint_lp_count,
                unique_burn_lp_count = excluded.unique_burn_lp_count,
                unique_trade_count = excluded.unique_trade_count,
                unique_user_count = excluded.unique_user_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&data.id)
        .bind(data.timestamp)
        .bind(data.swap_volume.to_canonical_string())
        .bind(data.swap_fee.to_canonical_string())
        .bind(data.mint_lp_value.to_canonical_string())
        .bind(data.mint_lp_fee.to_canonical_string())
        .bind(data.burn_lp_value.to_canonical_string())
        .bind(data.burn_lp_fee.to_canonical_string())
        .bind(data.liquidated_value.to_canonical_string())
        .bind(data.liquidated_fee.to_canonical_string())
        .bind(data.trading_volume.to_canonical_string())
        .bind(data.trading_fee.to_canonical_string())
        .bind(data.total_long_positions.to_canonical_string())
        .bind(data.total_short_positions.to_canonical_string())
        .bind(data.profit.to_canonical_string())
        .bind(data.loss.to_canonical_string())
        .bind(data.cumulative_loss.to_canonical_string())
        .bind(data.cumulative_profit.to_canonical_string())
        .bind(data.cumulative_volume.to_canonical_string())
        .bind(data.cumulative_fee.to_canonical_string())
        .bind(data.swap_count)
        .bind(data.burn_lp_count)
        .bind(data.mint_lp_count)
        .bind(data.trade_count)
        .bind(data.unique_swap_count)
        .bind(data.unique_mint_lp_count)
        .bind(data.unique_burn_lp_count)
        .bind(data.unique_trade_count)
        .bind(data.unique_user_count)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Protocol buckets whose start lies in `[from, to]`, oldest first.
    pub async fn list_protocol_daily(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<ProtocolDailyData>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM protocol_daily_data
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(protocol_daily_from_row).collect()
    }

    pub async fn load_user_daily(&self, id: &str) -> Result<Option<UserDailyData>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, address, timestamp, swap_count, burn_lp_count, mint_lp_count, trade_count
            FROM user_daily_data WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_daily_from_row).transpose()
    }

    pub async fn save_user_daily(&self, data: &UserDailyData) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_daily_data (id, address, timestamp, swap_count, burn_lp_count,
                                         mint_lp_count, trade_count, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                swap_count = excluded.swap_count,
                burn_lp_count = excluded.burn_lp_count,
                mint_lp_count = excluded.mint_lp_count,
                trade_count = excluded.trade_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&data.id)
        .bind(data.address.as_str())
        .bind(data.timestamp)
        .bind(data.swap_count)
        .bind(data.burn_lp_count)
        .bind(data.mint_lp_count)
        .bind(data.trade_count)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{init_db, Repository};
    use crate::domain::{
        ActionKind, Address, Amount, PoolDailyData, ProtocolDailyData, UserDailyData,
    };
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daily.db").to_string_lossy().to_string();
        (dir, Repository::new(init_db(&path).await.unwrap()))
    }

    fn addr(byte: char) -> Address {
        Address::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn test_pool_daily_roundtrip_keeps_distributions() {
        let (_dir, repo) = setup().await;
        let mut data = PoolDailyData::new(addr('a'), 90_000, 2);
        data.token_distributions[1] =
            Amount::parse("123456789012345678901234567890123456789").unwrap();
        data.swap_volume = Amount::from(10i64);
        repo.save_pool_daily(&data).await.unwrap();
        assert_eq!(repo.load_pool_daily(&data.id).await.unwrap(), Some(data));
    }

    #[tokio::test]
    async fn test_pool_daily_upsert_replaces_distributions() {
        let (_dir, repo) = setup().await;
        let mut data = PoolDailyData::new(addr('a'), 90_000, 0);
        repo.save_pool_daily(&data).await.unwrap();
        let stored = repo.load_pool_daily(&data.id).await.unwrap().unwrap();
        assert!(stored.token_distributions.is_empty());

        data.token_distributions = vec![Amount::from(7i64), Amount::zero(), Amount::from(9i64)];
        repo.save_pool_daily(&data).await.unwrap();
        let stored = repo.load_pool_daily(&data.id).await.unwrap().unwrap();
        assert_eq!(
            stored.token_distributions,
            vec![Amount::from(7i64), Amount::zero(), Amount::from(9i64)]
        );
    }

    #[tokio::test]
    async fn test_pool_daily_range() {
        let (_dir, repo) = setup().await;
        for ts in [10, 86_400 + 10, 2 * 86_400 + 10] {
            repo.save_pool_daily(&PoolDailyData::new(addr('a'), ts, 0))
                .await
                .unwrap();
        }
        repo.save_pool_daily(&PoolDailyData::new(addr('b'), 10, 0))
            .await
            .unwrap();

        let rows = repo.list_pool_daily(&addr('a'), 86_400, i64::MAX).await.unwrap();
        let buckets: Vec<i64> = rows.iter().map(|row| row.timestamp).collect();
        assert_eq!(buckets, vec![86_400, 172_800]);
    }

    #[tokio::test]
    async fn test_protocol_daily_roundtrip() {
        let (_dir, repo) = setup().await;
        let mut data = ProtocolDailyData::new(1_700_000_000);
        data.count_action(ActionKind::Swap, true);
        data.unique_user_count = 1;
        data.cumulative_volume = Amount::from(5000i64);
        repo.save_protocol_daily(&data).await.unwrap();
        assert_eq!(repo.load_protocol_daily(&data.id).await.unwrap(), Some(data.clone()));
        assert_eq!(repo.list_protocol_daily(0, i64::MAX).await.unwrap(), vec![data]);
    }

    #[tokio::test]
    async fn test_user_daily_roundtrip() {
        let (_dir, repo) = setup().await;
        let mut data = UserDailyData::new(addr('1'), 100);
        data.count_action(ActionKind::Burn);
        repo.save_user_daily(&data).await.unwrap();
        assert_eq!(repo.load_user_daily(&data.id).await.unwrap(), Some(data));
    }
}
