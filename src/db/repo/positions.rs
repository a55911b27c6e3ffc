//! Position and Trade persistence.

use super::{
    address_column, get_address, get_amount, get_label, get_opt_address, get_opt_side,
    get_side, now_ms, side_column, Repository,
};
use crate::domain::{Address, Position, PositionStatus, Trade};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn position_from_row(row: &SqliteRow) -> Result<Position, sqlx::Error> {
    Ok(Position {
        id: row.try_get("id")?,
        size: get_amount(row, "size")?,
        status: get_label(row, "status")?,
        collateral_value: get_amount(row, "collateral_value")?,
        leverage: get_amount(row, "leverage")?,
        reserve_amount: get_amount(row, "reserve_amount")?,
        entry_price: get_amount(row, "entry_price")?,
        entry_interest_rate: get_amount(row, "entry_interest_rate")?,
        owner: get_opt_address(row, "owner")?,
        side: get_opt_side(row, "side")?,
        market: get_opt_address(row, "market")?,
        collateral_token: get_opt_address(row, "collateral_token")?,
        created_at_timestamp: row.try_get("created_at_timestamp")?,
    })
}

fn trade_from_row(row: &SqliteRow) -> Result<Trade, sqlx::Error> {
    Ok(Trade {
        id: row.try_get("id")?,
        owner: get_address(row, "owner")?,
        date: row.try_get("date")?,
        market: get_address(row, "market")?,
        side: get_side(row, "side")?,
        update_type: get_label(row, "update_type")?,
        price: get_amount(row, "price")?,
        size: get_amount(row, "size")?,
        tx: row.try_get("tx")?,
    })
}

impl Repository {
    pub async fn load_position(&self, id: &str) -> Result<Option<Position>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM positions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(position_from_row).transpose()
    }

    pub async fn save_position(&self, position: &Position) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO positions (id, size, status, collateral_value, leverage, reserve_amount,
                                   entry_price, entry_interest_rate, owner, side, market,
                                   collateral_token, created_at_timestamp, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                size = excluded.size,
                status = excluded.status,
                collateral_value = excluded.collateral_value,
                leverage = excluded.leverage,
                reserve_amount = excluded.reserve_amount,
                entry_price = excluded.entry_price,
                entry_interest_rate = excluded.entry_interest_rate,
                owner = excluded.owner,
                side = excluded.side,
                market = excluded.market,
                collateral_token = excluded.collateral_token,
                created_at_timestamp = excluded.created_at_timestamp,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&position.id)
        .bind(position.size.to_canonical_string())
        .bind(position.status.as_str())
        .bind(position.collateral_value.to_canonical_string())
        .bind(position.leverage.to_canonical_string())
        .bind(position.reserve_amount.to_canonical_string())
        .bind(position.entry_price.to_canonical_string())
        .bind(position.entry_interest_rate.to_canonical_string())
        .bind(address_column(&position.owner))
        .bind(side_column(position.side))
        .bind(address_column(&position.market))
        .bind(address_column(&position.collateral_token))
        .bind(position.created_at_timestamp)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Open positions owned by `owner`.
    pub async fn list_open_positions(&self, owner: &Address) -> Result<Vec<Position>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM positions WHERE owner = ? AND status = ? ORDER BY created_at_timestamp ASC, id ASC",
        )
        .bind(owner.as_str())
        .bind(PositionStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(position_from_row).collect()
    }

    /// Append a Trade row; false when the id is already taken.
    pub async fn insert_trade(&self, trade: &Trade) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (id, owner, date, market, side, update_type, price, size, tx, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&trade.id)
        .bind(trade.owner.as_str())
        .bind(trade.date)
        .bind(trade.market.as_str())
        .bind(i64::from(trade.side.as_u8()))
        .bind(trade.update_type.as_str())
        .bind(trade.price.to_canonical_string())
        .bind(trade.size.to_canonical_string())
        .bind(&trade.tx)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn load_trade(&self, id: &str) -> Result<Option<Trade>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, owner, date, market, side, update_type, price, size, tx FROM trades WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(trade_from_row).transpose()
    }

    /// Trades on one market, oldest first.
    pub async fn list_trades_by_market(&self, market: &Address) -> Result<Vec<Trade>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, date, market, side, update_type, price, size, tx
            FROM trades WHERE market = ?
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(market.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(trade_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{init_db, Repository};
    use crate::domain::{Address, Amount, Position, PositionStatus, Side, Trade, UpdateType};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("positions.db").to_string_lossy().to_string();
        (dir, Repository::new(init_db(&path).await.unwrap()))
    }

    fn addr(byte: char) -> Address {
        Address::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn test_position_roundtrip() {
        let (_dir, repo) = setup().await;
        let fresh = Position::new("0xp1".to_string(), 100);
        repo.save_position(&fresh).await.unwrap();
        assert_eq!(repo.load_position("0xp1").await.unwrap(), Some(fresh.clone()));

        let open = Position {
            status: PositionStatus::Open,
            size: Amount::from(1000i64),
            owner: Some(addr('1')),
            side: Some(Side::Short),
            market: Some(addr('3')),
            collateral_token: Some(addr('4')),
            ..fresh
        };
        repo.save_position(&open).await.unwrap();
        assert_eq!(repo.load_position("0xp1").await.unwrap(), Some(open));
        assert_eq!(repo.list_open_positions(&addr('1')).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trade_append_only() {
        let (_dir, repo) = setup().await;
        let trade = Trade {
            id: Trade::trade_id(&addr('3'), 100),
            owner: addr('1'),
            date: 100,
            market: addr('3'),
            side: Side::Long,
            update_type: UpdateType::Increase,
            price: Amount::from(1500i64),
            size: Amount::from(1000i64),
            tx: "0xtx".to_string(),
        };
        assert!(repo.insert_trade(&trade).await.unwrap());
        assert!(!repo.insert_trade(&trade).await.unwrap());
        assert_eq!(repo.load_trade(&trade.id).await.unwrap(), Some(trade.clone()));
        assert_eq!(repo.list_trades_by_market(&addr('3')).await.unwrap(), vec![trade]);
    }
}
