//! Load-or-create access to stored entities and the append-only id rule for History and
//! Trade rows.

use super::{Projector, ProjectorError};
use crate::domain::daily::{pool_daily_id, protocol_daily_id};
use crate::domain::{
    Address, History, PoolDailyData, Position, ProtocolDailyData, Token, Trade, User,
};
use tracing::{debug, warn};

const NATIVE_DECIMALS: i32 = 18;
const NATIVE_SYMBOL: &str = "ETH";

/// Decrement a counter that must never go below zero.
pub(super) fn decrement_count(count: i32, counter: &'static str, owner: &Address) -> i32 {
    if count <= 0 {
        warn!(%owner, counter, "counter already at zero, decrement skipped");
        0
    } else {
        count - 1
    }
}

impl Projector {
    /// Existing user, or a fresh one. With `count_new` set, creation bumps
    /// `Protocol.total_users` right away; only order-manager handlers count users.
    pub(super) async fn load_or_create_user(
        &self,
        address: &Address,
        count_new: bool,
    ) -> Result<User, ProjectorError> {
        if let Some(user) = self.repo.load_user(address).await? {
            return Ok(user);
        }
        if count_new {
            if let Some(mut protocol) = self.repo.load_protocol().await? {
                protocol.total_users += 1;
                self.repo.save_protocol(&protocol).await?;
            }
        }
        debug!(user = %address, count_new, "new user");
        Ok(User::new(address.clone()))
    }

    pub(super) async fn load_or_create_position(
        &self,
        key: &str,
        timestamp: i64,
    ) -> Result<Position, ProjectorError> {
        Ok(self
            .repo
            .load_position(key)
            .await?
            .unwrap_or_else(|| Position::new(key.to_string(), timestamp)))
    }

    /// Existing token, or a new one described by its ERC-20 metadata.
    pub(super) async fn load_or_create_token(
        &self,
        address: &Address,
    ) -> Result<Token, ProjectorError> {
        if let Some(token) = self.repo.load_token(address).await? {
            return Ok(token);
        }
        if *address == self.config.native_token {
            return Ok(Token::new(
                address.clone(),
                NATIVE_DECIMALS,
                NATIVE_SYMBOL.to_string(),
            ));
        }

        let decimals = self.chain.decimals(address).await.unwrap_or_else(|e| {
            warn!(token = %address, error = %e, "decimals read failed");
            0
        });
        let symbol = self.chain.symbol(address).await.unwrap_or_else(|e| {
            warn!(token = %address, error = %e, "symbol read failed");
            String::new()
        });
        Ok(Token::new(address.clone(), decimals, symbol))
    }

    pub(super) async fn load_or_create_pool_daily(
        &self,
        pool: &Address,
        timestamp: i64,
        token_count: usize,
    ) -> Result<PoolDailyData, ProjectorError> {
        let id = pool_daily_id(pool, timestamp);
        Ok(self
            .repo
            .load_pool_daily(&id)
            .await?
            .unwrap_or_else(|| PoolDailyData::new(pool.clone(), timestamp, token_count)))
    }

    pub(super) async fn load_or_create_protocol_daily(
        &self,
        timestamp: i64,
    ) -> Result<ProtocolDailyData, ProjectorError> {
        let id = protocol_daily_id(timestamp);
        Ok(self
            .repo
            .load_protocol_daily(&id)
            .await?
            .unwrap_or_else(|| ProtocolDailyData::new(timestamp)))
    }

    /// Insert a History row under its base id, or under `<id>-<logIndex>` when another log
    /// of the same second already took it.
    pub(super) async fn append_history(
        &self,
        mut history: History,
        log_index: i64,
    ) -> Result<(), ProjectorError> {
        if self.repo.insert_history(&history).await? {
            return Ok(());
        }
        history.id = format!("{}-{}", history.id, log_index);
        if !self.repo.insert_history(&history).await? {
            debug!(id = %history.id, "history row already recorded");
        }
        Ok(())
    }

    /// Same id rule as [`Projector::append_history`].
    pub(super) async fn append_trade(
        &self,
        mut trade: Trade,
        log_index: i64,
    ) -> Result<(), ProjectorError> {
        if self.repo.insert_trade(&trade).await? {
            return Ok(());
        }
        trade.id = format!("{}-{}", trade.id, log_index);
        if !self.repo.insert_trade(&trade).await? {
            debug!(id = %trade.id, "trade row already recorded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_count_clamps_at_zero() {
        let owner = Address::parse("0x1111111111111111111111111111111111111111").unwrap();
        assert_eq!(decrement_count(2, "order_count", &owner), 1);
        assert_eq!(decrement_count(0, "order_count", &owner), 0);
        assert_eq!(decrement_count(-3, "order_count", &owner), 0);
    }
}
