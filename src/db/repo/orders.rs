//! Order, OrderIndex and History persistence.

use super::{
    address_column, amount_column, get_address, get_amount, get_label,
    get_opt_address, get_opt_amount, get_opt_label, get_opt_side, now_ms, side_column,
    Repository,
};
use crate::domain::{Address, Direction, History, Order, OrderIndex, OrderStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn order_from_row(row: &SqliteRow) -> Result<Order, sqlx::Error> {
    Ok(Order {
        id: row.try_get("id")?,
        owner: get_address(row, "owner")?,
        pool: get_address(row, "pool")?,
        market: get_opt_address(row, "market")?,
        collateral_token: get_opt_address(row, "collateral_token")?,
        pay_token: get_opt_address(row, "pay_token")?,
        token_in: get_opt_address(row, "token_in")?,
        token_out: get_opt_address(row, "token_out")?,
        size_change: get_opt_amount(row, "size_change")?,
        amount_in: get_opt_amount(row, "amount_in")?,
        min_amount_out: get_opt_amount(row, "min_amount_out")?,
        amount_out: get_opt_amount(row, "amount_out")?,
        execution_fee: get_amount(row, "execution_fee")?,
        expires_at: get_opt_amount(row, "expires_at")?,
        submission_block: row.try_get("submission_block")?,
        submission_timestamp: row.try_get("submission_timestamp")?,
        price: get_amount(row, "price")?,
        trigger_above_threshold: row.try_get("trigger_above_threshold")?,
        execution_timestamp: row.try_get("execution_timestamp")?,
        execution_price: get_amount(row, "execution_price")?,
        side: get_opt_side(row, "side")?,
        update_type: get_label(row, "update_type")?,
        order_type: get_label(row, "order_type")?,
        collateral_value: get_opt_amount(row, "collateral_value")?,
        status: get_label(row, "status")?,
    })
}

fn order_index_from_row(row: &SqliteRow) -> Result<OrderIndex, sqlx::Error> {
    Ok(OrderIndex {
        id: row.try_get("id")?,
        direction: get_label(row, "direction")?,
        status: get_label(row, "status")?,
        market: get_address(row, "market")?,
        trigger_price: get_amount(row, "trigger_price")?,
        created_at: row.try_get("created_at")?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<History, sqlx::Error> {
    Ok(History {
        id: row.try_get("id")?,
        owner: get_opt_address(row, "owner")?,
        size: get_opt_amount(row, "size")?,
        collateral_value: get_opt_amount(row, "collateral_value")?,
        side: get_opt_side(row, "side")?,
        order_type: get_opt_label(row, "order_type")?,
        update_type: get_opt_label(row, "update_type")?,
        collateral_token: get_opt_address(row, "collateral_token")?,
        market: get_opt_address(row, "market")?,
        trigger_price: get_opt_amount(row, "trigger_price")?,
        execution_price: get_opt_amount(row, "execution_price")?,
        trigger_above_threshold: row.try_get("trigger_above_threshold")?,
        token_in: get_opt_address(row, "token_in")?,
        token_out: get_opt_address(row, "token_out")?,
        amount_in: get_opt_amount(row, "amount_in")?,
        amount_out: get_opt_amount(row, "amount_out")?,
        min_amount_out: get_opt_amount(row, "min_amount_out")?,
        liquidated_price: get_opt_amount(row, "liquidated_price")?,
        status: get_label(row, "status")?,
        created_at_timestamp: row.try_get("created_at_timestamp")?,
        tx: row.try_get("tx")?,
    })
}

const HISTORY_COLUMNS: &str = "id, owner, size, collateral_value, side, order_type, update_type, \
     collateral_token, market, trigger_price, execution_price, trigger_above_threshold, token_in, \
     token_out, amount_in, amount_out, min_amount_out, liquidated_price, status, \
     created_at_timestamp, tx";

impl Repository {
    pub async fn load_order(&self, id: &str) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    pub async fn save_order(&self, order: &Order) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, owner, pool, market, collateral_token, pay_token, token_in,
                                token_out, size_change, amount_in, min_amount_out, amount_out,
                                execution_fee, expires_at, submission_block, submission_timestamp,
                                price, trigger_above_threshold, execution_timestamp,
                                execution_price, side, update_type, order_type, collateral_value,
                                status, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner = excluded.owner,
                pool = excluded.pool,
                market = excluded.market,
                collateral_token = excluded.collateral_token,
                pay_token = excluded.pay_token,
                token_in = excluded.token_in,
                token_out = excluded.token_out,
                size_change = excluded.size_change,
                amount_in = excluded.amount_in,
                min_amount_out = excluded.min_amount_out,
                amount_out = excluded.amount_out,
                execution_fee = excluded.execution_fee,
                expires_at = excluded.expires_at,
                submission_block = excluded.submission_block,
                submission_timestamp = excluded.submission_timestamp,
                price = excluded.price,
                trigger_above_threshold = excluded.trigger_above_threshold,
                execution_timestamp = excluded.execution_timestamp,
                execution_price = excluded.execution_price,
                side = excluded.side,
                update_type = excluded.update_type,
                order_type = excluded.order_type,
                collateral_value = excluded.collateral_value,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&order.id)
        .bind(order.owner.as_str())
        .bind(order.pool.as_str())
        .bind(address_column(&order.market))
        .bind(address_column(&order.collateral_token))
        .bind(address_column(&order.pay_token))
        .bind(address_column(&order.token_in))
        .bind(address_column(&order.token_out))
        .bind(amount_column(&order.size_change))
        .bind(amount_column(&order.amount_in))
        .bind(amount_column(&order.min_amount_out))
        .bind(amount_column(&order.amount_out))
        .bind(order.execution_fee.to_canonical_string())
        .bind(amount_column(&order.expires_at))
        .bind(order.submission_block)
        .bind(order.submission_timestamp)
        .bind(order.price.to_canonical_string())
        .bind(order.trigger_above_threshold)
        .bind(order.execution_timestamp)
        .bind(order.execution_price.to_canonical_string())
        .bind(side_column(order.side))
        .bind(order.update_type.as_str())
        .bind(order.order_type.as_str())
        .bind(amount_column(&order.collateral_value))
        .bind(order.status.as_str())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Orders owned by `owner`, newest submission first.
    pub async fn list_orders_by_owner(&self, owner: &Address) -> Result<Vec<Order>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE owner = ? ORDER BY submission_timestamp DESC, id ASC",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(order_from_row).collect()
    }

    pub async fn load_order_index(&self, id: &str) -> Result<Option<OrderIndex>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, direction, status, market, trigger_price, created_at FROM order_index WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(order_index_from_row).transpose()
    }

    pub async fn save_order_index(&self, index: &OrderIndex) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO order_index (id, direction, status, market, trigger_price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                direction = excluded.direction,
                status = excluded.status,
                market = excluded.market,
                trigger_price = excluded.trigger_price,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&index.id)
        .bind(index.direction.as_str())
        .bind(index.status.as_str())
        .bind(index.market.as_str())
        .bind(index.trigger_price.to_canonical_string())
        .bind(index.created_at)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Open book rows for one market side.
    ///
    /// Bids are ordered by trigger price descending, asks ascending. Prices are compared as
    /// amounts after loading since the stored text does not sort numerically.
    pub async fn list_open_book(
        &self,
        market: &Address,
        direction: Direction,
    ) -> Result<Vec<OrderIndex>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, direction, status, market, trigger_price, created_at
            FROM order_index
            WHERE market = ? AND direction = ? AND status = ?
            "#,
        )
        .bind(market.as_str())
        .bind(direction.as_str())
        .bind(OrderStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut book = rows
            .iter()
            .map(order_index_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        book.sort_by(|a, b| {
            let by_price = match direction {
                Direction::Bid => b.trigger_price.cmp(&a.trigger_price),
                Direction::Ask => a.trigger_price.cmp(&b.trigger_price),
            };
            by_price
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(book)
    }

    /// Append a History row. Returns false, leaving the stored row untouched, when the id is
    /// already taken.
    pub async fn insert_history(&self, history: &History) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "INSERT INTO histories ({}, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
            HISTORY_COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(&history.id)
            .bind(address_column(&history.owner))
            .bind(amount_column(&history.size))
            .bind(amount_column(&history.collateral_value))
            .bind(side_column(history.side))
            .bind(history.order_type.map(|t| t.as_str()))
            .bind(history.update_type.map(|t| t.as_str()))
            .bind(address_column(&history.collateral_token))
            .bind(address_column(&history.market))
            .bind(amount_column(&history.trigger_price))
            .bind(amount_column(&history.execution_price))
            .bind(history.trigger_above_threshold)
            .bind(address_column(&history.token_in))
            .bind(address_column(&history.token_out))
            .bind(amount_column(&history.amount_in))
            .bind(amount_column(&history.amount_out))
            .bind(amount_column(&history.min_amount_out))
            .bind(amount_column(&history.liquidated_price))
            .bind(history.status.as_str())
            .bind(history.created_at_timestamp)
            .bind(&history.tx)
            .bind(now_ms())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn load_history(&self, id: &str) -> Result<Option<History>, sqlx::Error> {
        let sql = format!("SELECT {} FROM histories WHERE id = ?", HISTORY_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(history_from_row).transpose()
    }

    /// History rows recorded for an order or position key, oldest first.
    pub async fn list_histories_for_key(&self, key: &str) -> Result<Vec<History>, sqlx::Error> {
        let prefix = format!("{}-", key);
        let sql = format!(
            "SELECT {} FROM histories WHERE substr(id, 1, ?) = ? \
             ORDER BY created_at_timestamp ASC, id ASC",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(prefix.len() as i64)
            .bind(&prefix)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(history_from_row).collect()
    }

    /// History rows owned by `owner`, newest first, at most `limit`.
    pub async fn list_histories_by_owner(
        &self,
        owner: &Address,
        limit: i64,
    ) -> Result<Vec<History>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM histories WHERE owner = ? \
             ORDER BY created_at_timestamp DESC, id DESC LIMIT ?",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(history_from_row).collect()
    }
}
