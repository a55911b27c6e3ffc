//! Repository layer over the SQLite store.
//!
//! Every `save_*` is an upsert keyed by the entity id and is durable on return. Append-only
//! records (`History`, `Trade`) use `insert_*`, which never overwrites and reports whether a
//! row was written. Methods are split across submodules by entity group:
//! - `orders.rs` - Order, OrderIndex, History
//! - `positions.rs` - Position, Trade
//! - `daily.rs` - pool, protocol and user daily rollups

mod daily;
mod orders;
mod positions;

use crate::domain::{Address, Amount, Block, Market, Pool, Protocol, Side, Token, User, PROTOCOL_ID};
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn decode_error<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn parse_amount(column: &str, raw: &str) -> Amount {
    Amount::parse(raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "Failed to parse stored amount, using zero");
        Amount::zero()
    })
}

fn get_amount(row: &SqliteRow, column: &str) -> Result<Amount, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Ok(parse_amount(column, &raw))
}

fn get_opt_amount(row: &SqliteRow, column: &str) -> Result<Option<Amount>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    Ok(raw.map(|raw| parse_amount(column, &raw)))
}

fn get_address(row: &SqliteRow, column: &str) -> Result<Address, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Address::parse(&raw).map_err(|e| decode_error(column, e))
}

fn get_opt_address(row: &SqliteRow, column: &str) -> Result<Option<Address>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| Address::parse(&raw).map_err(|e| decode_error(column, e)))
        .transpose()
}

/// Stored uppercase label back into its enum.
fn get_label<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| decode_error(column, e))
}

fn get_opt_label<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| raw.parse::<T>().map_err(|e| decode_error(column, e)))
        .transpose()
}

fn side_from_i64(column: &str, raw: i64) -> Result<Side, sqlx::Error> {
    let byte = u8::try_from(raw).map_err(|e| decode_error(column, e))?;
    Side::try_from(byte).map_err(|e| decode_error(column, e))
}

fn get_side(row: &SqliteRow, column: &str) -> Result<Side, sqlx::Error> {
    side_from_i64(column, row.try_get(column)?)
}

fn get_opt_side(row: &SqliteRow, column: &str) -> Result<Option<Side>, sqlx::Error> {
    let raw: Option<i64> = row.try_get(column)?;
    raw.map(|raw| side_from_i64(column, raw)).transpose()
}

fn side_column(side: Option<Side>) -> Option<i64> {
    side.map(|side| i64::from(side.as_u8()))
}

fn amount_column(value: &Option<Amount>) -> Option<String> {
    value.as_ref().map(Amount::to_canonical_string)
}

fn address_column(value: &Option<Address>) -> Option<&str> {
    value.as_ref().map(Address::as_str)
}

fn protocol_from_row(row: &SqliteRow) -> Result<Protocol, sqlx::Error> {
    Ok(Protocol {
        id: row.try_get("id")?,
        address: get_address(row, "address")?,
        total_fee: get_amount(row, "total_fee")?,
        total_volume: get_amount(row, "total_volume")?,
        total_long_positions: get_amount(row, "total_long_positions")?,
        total_short_positions: get_amount(row, "total_short_positions")?,
        profit: get_amount(row, "profit")?,
        loss: get_amount(row, "loss")?,
        total_users: row.try_get("total_users")?,
    })
}

fn pool_from_row(row: &SqliteRow) -> Result<Pool, sqlx::Error> {
    Ok(Pool {
        address: get_address(row, "address")?,
        total_fee: get_amount(row, "total_fee")?,
        total_volume: get_amount(row, "total_volume")?,
        total_long_positions: get_amount(row, "total_long_positions")?,
        total_short_positions: get_amount(row, "total_short_positions")?,
        protocol: row.try_get("protocol")?,
        token_count: row.try_get("token_count")?,
    })
}

fn market_from_row(row: &SqliteRow) -> Result<Market, sqlx::Error> {
    Ok(Market {
        index_token: get_address(row, "index_token")?,
        pool: get_address(row, "pool")?,
    })
}

fn token_from_row(row: &SqliteRow) -> Result<Token, sqlx::Error> {
    Ok(Token {
        address: get_address(row, "address")?,
        decimals: row.try_get("decimals")?,
        symbol: row.try_get("symbol")?,
        price: get_amount(row, "price")?,
        last_updated_block: row.try_get("last_updated_block")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        address: get_address(row, "address")?,
        position_count: row.try_get("position_count")?,
        order_count: row.try_get("order_count")?,
    })
}

fn block_from_row(row: &SqliteRow) -> Result<Block, sqlx::Error> {
    Ok(Block {
        hash: row.try_get("hash")?,
        parent_hash: row.try_get("parent_hash")?,
        uncles_hash: row.try_get("uncles_hash")?,
        author: row.try_get("author")?,
        state_root: row.try_get("state_root")?,
        transactions_root: row.try_get("transactions_root")?,
        receipts_root: row.try_get("receipts_root")?,
        number: row.try_get("number")?,
        gas_used: get_amount(row, "gas_used")?,
        gas_limit: get_amount(row, "gas_limit")?,
        timestamp: row.try_get("timestamp")?,
        difficulty: get_amount(row, "difficulty")?,
        total_difficulty: get_amount(row, "total_difficulty")?,
        size: get_opt_amount(row, "size")?,
    })
}

/// Repository for projected entities.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap round trip used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Protocol
    // =========================================================================

    pub async fn load_protocol(&self) -> Result<Option<Protocol>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, address, total_fee, total_volume, total_long_positions,
                   total_short_positions, profit, loss, total_users
            FROM protocols WHERE id = ?
            "#,
        )
        .bind(PROTOCOL_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(protocol_from_row).transpose()
    }

    pub async fn save_protocol(&self, protocol: &Protocol) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO protocols (id, address, total_fee, total_volume, total_long_positions,
                                   total_short_positions, profit, loss, total_users, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                address = excluded.address,
                total_fee = excluded.total_fee,
                total_volume = excluded.total_volume,
                total_long_positions = excluded.total_long_positions,
                total_short_positions = excluded.total_short_positions,
                profit = excluded.profit,
                loss = excluded.loss,
                total_users = excluded.total_users,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&protocol.id)
        .bind(protocol.address.as_str())
        .bind(protocol.total_fee.to_canonical_string())
        .bind(protocol.total_volume.to_canonical_string())
        .bind(protocol.total_long_positions.to_canonical_string())
        .bind(protocol.total_short_positions.to_canonical_string())
        .bind(protocol.profit.to_canonical_string())
        .bind(protocol.loss.to_canonical_string())
        .bind(protocol.total_users)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Pool
    // =========================================================================

    pub async fn load_pool(&self, address: &Address) -> Result<Option<Pool>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT address, total_fee, total_volume, total_long_positions, total_short_positions,
                   protocol, token_count
            FROM pools WHERE address = ?
            "#,
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(pool_from_row).transpose()
    }

    pub async fn save_pool(&self, pool: &Pool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO pools (address, total_fee, total_volume, total_long_positions,
                               total_short_positions, protocol, token_count, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                total_fee = excluded.total_fee,
                total_volume = excluded.total_volume,
                total_long_positions = excluded.total_long_positions,
                total_short_positions = excluded.total_short_positions,
                protocol = excluded.protocol,
                token_count = excluded.token_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(pool.address.as_str())
        .bind(pool.total_fee.to_canonical_string())
        .bind(pool.total_volume.to_canonical_string())
        .bind(pool.total_long_positions.to_canonical_string())
        .bind(pool.total_short_positions.to_canonical_string())
        .bind(&pool.protocol)
        .bind(pool.token_count)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Addresses of every stored pool, in address order.
    pub async fn list_pool_ids(&self) -> Result<Vec<Address>, sqlx::Error> {
        let rows = sqlx::query("SELECT address FROM pools ORDER BY address ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| get_address(row, "address")).collect()
    }

    // =========================================================================
    // Market / Token / User
    // =========================================================================

    pub async fn load_market(&self, index_token: &Address) -> Result<Option<Market>, sqlx::Error> {
        let row = sqlx::query("SELECT index_token, pool FROM markets WHERE index_token = ?")
            .bind(index_token.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(market_from_row).transpose()
    }

    pub async fn save_market(&self, market: &Market) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO markets (index_token, pool, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(index_token) DO UPDATE SET
                pool = excluded.pool,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(market.index_token.as_str())
        .bind(market.pool.as_str())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_token(&self, address: &Address) -> Result<Option<Token>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT address, decimals, symbol, price, last_updated_block FROM tokens WHERE address = ?",
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(token_from_row).transpose()
    }

    pub async fn save_token(&self, token: &Token) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tokens (address, decimals, symbol, price, last_updated_block, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                decimals = excluded.decimals,
                symbol = excluded.symbol,
                price = excluded.price,
                last_updated_block = excluded.last_updated_block,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(token.address.as_str())
        .bind(token.decimals)
        .bind(&token.symbol)
        .bind(token.price.to_canonical_string())
        .bind(token.last_updated_block)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_user(&self, address: &Address) -> Result<Option<User>, sqlx::Error> {
        let row =
            sqlx::query("SELECT address, position_count, order_count FROM users WHERE address = ?")
                .bind(address.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn save_user(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (address, position_count, order_count, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                position_count = excluded.position_count,
                order_count = excluded.order_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.address.as_str())
        .bind(user.position_count)
        .bind(user.order_count)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Blocks and replay bookkeeping
    // =========================================================================

    pub async fn load_block(&self, hash: &str) -> Result<Option<Block>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT hash, parent_hash, uncles_hash, author, state_root, transactions_root,
                   receipts_root, number, gas_used, gas_limit, timestamp, difficulty,
                   total_difficulty, size
            FROM blocks WHERE hash = ?
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(block_from_row).transpose()
    }

    pub async fn save_block(&self, block: &Block) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO blocks (hash, parent_hash, uncles_hash, author, state_root,
                                transactions_root, receipts_root, number, gas_used, gas_limit,
                                timestamp, difficulty, total_difficulty, size, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(hash) DO UPDATE SET
                parent_hash = excluded.parent_hash,
                uncles_hash = excluded.uncles_hash,
                author = excluded.author,
                state_root = excluded.state_root,
                transactions_root = excluded.transactions_root,
                receipts_root = excluded.receipts_root,
                number = excluded.number,
                gas_used = excluded.gas_used,
                gas_limit = excluded.gas_limit,
                timestamp = excluded.timestamp,
                difficulty = excluded.difficulty,
                total_difficulty = excluded.total_difficulty,
                size = excluded.size,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&block.hash)
        .bind(&block.parent_hash)
        .bind(&block.uncles_hash)
        .bind(&block.author)
        .bind(&block.state_root)
        .bind(&block.transactions_root)
        .bind(&block.receipts_root)
        .bind(block.number)
        .bind(block.gas_used.to_canonical_string())
        .bind(block.gas_limit.to_canonical_string())
        .bind(block.timestamp)
        .bind(block.difficulty.to_canonical_string())
        .bind(block.total_difficulty.to_canonical_string())
        .bind(amount_column(&block.size))
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn is_event_processed(&self, event_id: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM processed_events WHERE event_id = ?")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Record a log identity; returns false when it was already recorded.
    pub async fn mark_event_processed(
        &self,
        event_id: &str,
        block_number: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_events (event_id, block_number, processed_at)
            VALUES (?, ?, ?)
            ON CONFLICT(event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(block_number)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
