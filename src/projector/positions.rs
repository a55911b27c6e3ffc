//! Position lifecycle and the trading totals it drives on pools, the protocol and the
//! daily rollups.

use super::store::decrement_count;
use super::{Projector, ProjectorError};
use crate::domain::position::leverage;
use crate::domain::{
    ActionKind, Address, Amount, History, HistoryStatus, Pool, Position, PositionStatus,
    Protocol, Side, Trade, UpdateType,
};
use crate::events::{
    ClosePosition, DecreasePosition, EventMeta, IncreasePosition, LiquidatePosition, Pnl,
    UpdatePosition,
};
use tracing::debug;

/// Move the long or short gauge selected by `side`.
fn shift_gauge(long: &mut Amount, short: &mut Amount, side: Side, delta: &Amount, grow: bool) {
    let gauge = if side.is_long() { long } else { short };
    *gauge = if grow {
        gauge.increment(delta)
    } else {
        gauge.decrement(delta)
    };
}

/// A size change booked against a pool.
struct Fill<'a> {
    account: &'a Address,
    market: &'a Address,
    side: Side,
    update_type: UpdateType,
    size: &'a Amount,
    fee: &'a Amount,
    price: &'a Amount,
    pnl: Option<&'a Pnl>,
}

impl Projector {
    pub(super) async fn handle_increase_position(
        &self,
        meta: &EventMeta,
        event: &IncreasePosition,
    ) -> Result<(), ProjectorError> {
        let Some(pool) = self.repo.load_pool(&meta.address).await? else {
            debug!(pool = %meta.address, "increase on unknown pool ignored");
            return Ok(());
        };
        let Some(protocol) = self.repo.load_protocol().await? else {
            debug!("increase before protocol exists ignored");
            return Ok(());
        };

        let mut position = self
            .load_or_create_position(event.key.as_str(), meta.block_timestamp)
            .await?;
        if !position.is_open() {
            let mut user = self.load_or_create_user(&event.account, false).await?;
            user.position_count += 1;
            self.repo.save_user(&user).await?;
        }
        position.status = PositionStatus::Open;
        position.owner = Some(event.account.clone());
        position.collateral_token = Some(event.collateral_token.clone());
        position.market = Some(event.index_token.clone());
        position.side = Some(event.side);
        self.repo.save_position(&position).await?;

        if !event.size_changed.is_positive() {
            return Ok(());
        }
        let fill = Fill {
            account: &event.account,
            market: &event.index_token,
            side: event.side,
            update_type: UpdateType::Increase,
            size: &event.size_changed,
            fee: &event.fee_value,
            price: &event.index_price,
            pnl: None,
        };
        self.book_fill(meta, pool, protocol, fill).await
    }

    pub(super) async fn handle_decrease_position(
        &self,
        meta: &EventMeta,
        event: &DecreasePosition,
    ) -> Result<(), ProjectorError> {
        let Some(pool) = self.repo.load_pool(&meta.address).await? else {
            debug!(pool = %meta.address, "decrease on unknown pool ignored");
            return Ok(());
        };
        let Some(protocol) = self.repo.load_protocol().await? else {
            debug!("decrease before protocol exists ignored");
            return Ok(());
        };
        if !event.size_changed.is_positive() {
            return Ok(());
        }

        let fill = Fill {
            account: &event.account,
            market: &event.index_token,
            side: event.side,
            update_type: UpdateType::Decrease,
            size: &event.size_changed,
            fee: &event.fee_value,
            price: &event.index_price,
            pnl: Some(&event.pnl),
        };
        self.book_fill(meta, pool, protocol, fill).await
    }

    async fn book_fill(
        &self,
        meta: &EventMeta,
        mut pool: Pool,
        mut protocol: Protocol,
        fill: Fill<'_>,
    ) -> Result<(), ProjectorError> {
        let ts = meta.block_timestamp;
        let grow = fill.update_type == UpdateType::Increase;
        let trade = Trade {
            id: Trade::trade_id(fill.market, ts),
            owner: fill.account.clone(),
            date: ts,
            market: fill.market.clone(),
            side: fill.side,
            update_type: fill.update_type,
            price: fill.price.clone(),
            size: fill.size.clone(),
            tx: meta.tx_hash.clone(),
        };

        pool.total_volume = pool.total_volume.increment(fill.size);
        pool.total_fee = pool.total_fee.increment(fill.fee);
        protocol.total_volume = protocol.total_volume.increment(fill.size);
        protocol.total_fee = protocol.total_fee.increment(fill.fee);
        shift_gauge(
            &mut pool.total_long_positions,
            &mut pool.total_short_positions,
            fill.side,
            fill.size,
            grow,
        );
        shift_gauge(
            &mut protocol.total_long_positions,
            &mut protocol.total_short_positions,
            fill.side,
            fill.size,
            grow,
        );

        let mut pool_daily = self.refresh_pool_daily(&pool, ts).await?;
        let mut protocol_daily = self.load_or_create_protocol_daily(ts).await?;
        pool_daily.trading_fee = pool_daily.trading_fee.increment(fill.fee);
        pool_daily.trading_volume = pool_daily.trading_volume.increment(fill.size);
        protocol_daily.trading_fee = protocol_daily.trading_fee.increment(fill.fee);
        protocol_daily.trading_volume = protocol_daily.trading_volume.increment(fill.size);
        protocol_daily.cumulative_volume = protocol.total_volume.clone();
        protocol_daily.cumulative_fee = protocol.total_fee.clone();
        // daily gauges record opened size only
        if grow {
            shift_gauge(
                &mut pool_daily.total_long_positions,
                &mut pool_daily.total_short_positions,
                fill.side,
                fill.size,
                true,
            );
            shift_gauge(
                &mut protocol_daily.total_long_positions,
                &mut protocol_daily.total_short_positions,
                fill.side,
                fill.size,
                true,
            );
        }

        if let Some(pnl) = fill.pnl {
            if pnl.books_profit() {
                protocol.profit = protocol.profit.increment(&pnl.abs);
                protocol_daily.profit = protocol_daily.profit.increment(&pnl.abs);
                protocol_daily.cumulative_profit = protocol.profit.clone();
            } else if pnl.books_loss() {
                protocol.loss = protocol.loss.increment(&pnl.abs);
                protocol_daily.loss = protocol_daily.loss.increment(&pnl.abs);
                protocol_daily.cumulative_loss = protocol.loss.clone();
            }
        }

        self.append_trade(trade, meta.log_index).await?;
        self.record_user_action(&mut protocol_daily, fill.account, ActionKind::Trade, ts)
            .await?;
        self.repo.save_pool_daily(&pool_daily).await?;
        self.repo.save_protocol_daily(&protocol_daily).await?;
        self.repo.save_pool(&pool).await?;
        self.repo.save_protocol(&protocol).await?;
        debug!(
            pool = %pool.address,
            account = %fill.account,
            side = %fill.side,
            update_type = %fill.update_type,
            size = %fill.size,
            "trade booked"
        );
        Ok(())
    }

    pub(super) async fn handle_update_position(
        &self,
        meta: &EventMeta,
        event: &UpdatePosition,
    ) -> Result<(), ProjectorError> {
        let mut position = self
            .load_or_create_position(event.key.as_str(), meta.block_timestamp)
            .await?;
        position.size = event.size.clone();
        position.collateral_value = event.collateral_value.clone();
        position.leverage = leverage(&event.size, &event.collateral_value);
        position.reserve_amount = event.reserve_amount.clone();
        position.entry_price = event.entry_price.clone();
        position.entry_interest_rate = event.entry_interest_rate.clone();
        self.repo.save_position(&position).await?;
        Ok(())
    }

    pub(super) async fn handle_close_position(
        &self,
        meta: &EventMeta,
        event: &ClosePosition,
    ) -> Result<(), ProjectorError> {
        let mut position = self
            .load_or_create_position(event.key.as_str(), meta.block_timestamp)
            .await?;
        if position.is_open() {
            self.release_position(&position).await?;
        }
        position.size = event.size.clone();
        position.collateral_value = event.collateral_value.clone();
        position.leverage = leverage(&event.size, &event.collateral_value);
        position.reserve_amount = event.reserve_amount.clone();
        position.entry_interest_rate = event.entry_interest_rate.clone();
        position.status = PositionStatus::Closed;
        self.repo.save_position(&position).await?;
        debug!(key = %event.key, "position closed");
        Ok(())
    }

    pub(super) async fn handle_liquidate_position(
        &self,
        meta: &EventMeta,
        event: &LiquidatePosition,
    ) -> Result<(), ProjectorError> {
        let ts = meta.block_timestamp;
        let Some(mut pool) = self.repo.load_pool(&meta.address).await? else {
            debug!(pool = %meta.address, "liquidation on unknown pool ignored");
            return Ok(());
        };
        let Some(mut protocol) = self.repo.load_protocol().await? else {
            debug!("liquidation before protocol exists ignored");
            return Ok(());
        };

        let mut position = self.load_or_create_position(event.key.as_str(), ts).await?;
        if position.is_open() {
            self.release_position(&position).await?;
        }
        position.status = PositionStatus::Closed;
        pool.total_fee = pool.total_fee.increment(&event.fee_value);
        protocol.total_fee = protocol.total_fee.increment(&event.fee_value);
        shift_gauge(
            &mut pool.total_long_positions,
            &mut pool.total_short_positions,
            event.side,
            &event.size,
            false,
        );
        shift_gauge(
            &mut protocol.total_long_positions,
            &mut protocol.total_short_positions,
            event.side,
            &event.size,
            false,
        );

        let mut pool_daily = self.refresh_pool_daily(&pool, ts).await?;
        let mut protocol_daily = self.load_or_create_protocol_daily(ts).await?;
        pool_daily.liquidated_value = pool_daily.liquidated_value.increment(&position.size);
        pool_daily.liquidated_fee = pool_daily.liquidated_fee.increment(&event.fee_value);
        protocol_daily.liquidated_value =
            protocol_daily.liquidated_value.increment(&position.size);
        protocol_daily.liquidated_fee = protocol_daily.liquidated_fee.increment(&event.fee_value);
        protocol_daily.cumulative_fee = protocol.total_fee.clone();
        if event.pnl.books_profit() {
            protocol_daily.profit = protocol_daily.profit.increment(&event.pnl.abs);
        } else if event.pnl.books_loss() {
            protocol_daily.loss = protocol_daily.loss.increment(&event.pnl.abs);
        }

        let history = History {
            owner: position.owner.clone(),
            size: Some(position.size.clone()),
            collateral_value: Some(position.collateral_value.clone()),
            side: position.side,
            collateral_token: position.collateral_token.clone(),
            market: position.market.clone(),
            liquidated_price: Some(event.index_price.clone()),
            ..History::new(
                History::history_id(event.key.as_str(), ts),
                HistoryStatus::Liquidated,
                ts,
                meta.tx_hash.clone(),
            )
        };

        self.repo.save_pool_daily(&pool_daily).await?;
        self.repo.save_protocol_daily(&protocol_daily).await?;
        self.repo.save_position(&position).await?;
        self.append_history(history, meta.log_index).await?;
        self.repo.save_pool(&pool).await?;
        self.repo.save_protocol(&protocol).await?;
        debug!(key = %event.key, pool = %pool.address, "position liquidated");
        Ok(())
    }

    /// Take an open position off its owner's count.
    async fn release_position(&self, position: &Position) -> Result<(), ProjectorError> {
        let owner = position.owner.as_ref().ok_or_else(|| {
            ProjectorError::Corrupt(format!("open position {} has no owner", position.id))
        })?;
        let mut user = self.load_or_create_user(owner, false).await?;
        user.position_count =
            decrement_count(user.position_count, "position_count", &user.address);
        self.repo.save_user(&user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_gauge_selects_side() {
        let mut long = Amount::from(10i64);
        let mut short = Amount::from(10i64);
        shift_gauge(&mut long, &mut short, Side::Short, &Amount::from(4i64), true);
        assert_eq!(long, Amount::from(10i64));
        assert_eq!(short, Amount::from(14i64));

        shift_gauge(&mut long, &mut short, Side::Long, &Amount::from(15i64), false);
        assert_eq!(long, Amount::from(-5i64));
    }
}
