//! Order lifecycle: placement, cancellation, expiry and execution of position orders and
//! swap orders, plus market swaps routed through the order manager.

use super::store::decrement_count;
use super::{Projector, ProjectorError};
use crate::domain::order::swap_order_id;
use crate::domain::{
    Address, Amount, History, HistoryStatus, HexKey, Order, OrderIndex, OrderStatus, OrderType,
    UpdateType,
};
use crate::events::{EventMeta, OrderManagerSwap, OrderPlaced, SwapOrderPlaced};
use tracing::{debug, warn};

/// Terminal transition of a position order.
#[derive(Debug, Clone, Copy)]
pub(super) enum Transition<'a> {
    Cancel,
    Expire,
    Fill(&'a Amount),
}

impl Transition<'_> {
    fn status(&self) -> OrderStatus {
        match self {
            Transition::Cancel => OrderStatus::Cancelled,
            Transition::Expire => OrderStatus::Expired,
            Transition::Fill(_) => OrderStatus::Filled,
        }
    }
}

impl Projector {
    pub(super) async fn handle_order_placed(
        &self,
        meta: &EventMeta,
        event: &OrderPlaced,
    ) -> Result<(), ProjectorError> {
        let key = event.key.as_str();
        let placed = &event.order;
        let request = &event.request;

        let order_type = if placed.expires_at.is_positive() {
            OrderType::Market
        } else {
            OrderType::Limit
        };
        let update_type = if request.update_type == 0 {
            UpdateType::Increase
        } else {
            UpdateType::Decrease
        };
        let collateral_value = self
            .order_collateral_value(
                &meta.address,
                &placed.collateral_token,
                &request.collateral,
                update_type,
            )
            .await;

        let order = Order {
            id: key.to_string(),
            owner: placed.owner.clone(),
            pool: placed.pool.clone(),
            market: Some(placed.index_token.clone()),
            collateral_token: Some(placed.collateral_token.clone()),
            pay_token: Some(placed.pay_token.clone()),
            token_in: None,
            token_out: None,
            size_change: Some(request.size_change.clone()),
            amount_in: None,
            min_amount_out: None,
            amount_out: None,
            execution_fee: placed.execution_fee.clone(),
            expires_at: Some(placed.expires_at.clone()),
            submission_block: placed.submission_block,
            submission_timestamp: meta.block_timestamp,
            price: placed.price.clone(),
            trigger_above_threshold: Some(placed.trigger_above_threshold),
            execution_timestamp: 0,
            execution_price: Amount::zero(),
            side: Some(request.side),
            update_type,
            order_type,
            collateral_value: Some(collateral_value),
            status: OrderStatus::Open,
        };
        let index = OrderIndex {
            id: order.id.clone(),
            direction: OrderIndex::direction_for(request.side, update_type),
            status: OrderStatus::Open,
            market: placed.index_token.clone(),
            trigger_price: order.price.clone(),
            created_at: order.submission_timestamp,
        };
        let history = History::of_order(
            History::history_id(key, meta.block_timestamp),
            &order,
            meta.block_timestamp,
            meta.tx_hash.clone(),
        );

        if order_type == OrderType::Limit {
            let mut user = self.load_or_create_user(&order.owner, true).await?;
            user.order_count += 1;
            self.repo.save_user(&user).await?;
        }

        self.repo.save_order(&order).await?;
        self.repo.save_order_index(&index).await?;
        self.append_history(history, meta.log_index).await?;
        debug!(
            key,
            owner = %order.owner,
            order_type = %order_type,
            update_type = %update_type,
            "order placed"
        );
        Ok(())
    }

    /// Collateral in USD terms for increases, raw collateral for decreases, zero when the
    /// price cannot be read.
    async fn order_collateral_value(
        &self,
        order_manager: &Address,
        collateral_token: &Address,
        collateral: &Amount,
        update_type: UpdateType,
    ) -> Amount {
        let price = match self.chain.oracle(order_manager).await {
            Ok(oracle) => self.chain.get_price(&oracle, collateral_token).await,
            Err(e) => Err(e),
        };
        match price {
            Ok(price) if update_type == UpdateType::Increase => collateral * &price,
            Ok(_) => collateral.clone(),
            Err(e) => {
                warn!(token = %collateral_token, error = %e, "collateral price read failed");
                Amount::zero()
            }
        }
    }

    pub(super) async fn finish_order(
        &self,
        meta: &EventMeta,
        key: &HexKey,
        transition: Transition<'_>,
    ) -> Result<(), ProjectorError> {
        let key = key.as_str();
        let status = transition.status();

        match self.repo.load_order(key).await? {
            Some(mut order) => {
                if order.counts_towards_owner() {
                    let mut user = self.load_or_create_user(&order.owner, true).await?;
                    user.order_count =
                        decrement_count(user.order_count, "order_count", &user.address);
                    self.repo.save_user(&user).await?;
                }
                order.status = status;
                if let Transition::Fill(price) = transition {
                    order.execution_timestamp = meta.block_timestamp;
                    order.execution_price = price.clone();
                }
                self.repo.save_order(&order).await?;

                let history = History::of_order(
                    History::history_id(key, meta.block_timestamp),
                    &order,
                    meta.block_timestamp,
                    meta.tx_hash.clone(),
                );
                self.append_history(history, meta.log_index).await?;
                debug!(key, status = %status, "order transitioned");
            }
            None => debug!(key, status = %status, "transition for unknown order ignored"),
        }

        if let Some(mut index) = self.repo.load_order_index(key).await? {
            index.status = status;
            self.repo.save_order_index(&index).await?;
        }
        Ok(())
    }

    pub(super) async fn handle_swap_order_placed(
        &self,
        meta: &EventMeta,
        event: &SwapOrderPlaced,
    ) -> Result<(), ProjectorError> {
        let swap = match self.chain.swap_order(&meta.address, &event.key).await {
            Ok(swap) => swap,
            Err(e) => {
                warn!(key = %event.key, error = %e, "swap order read failed, placement skipped");
                return Ok(());
            }
        };

        let order = Order {
            id: swap_order_id(event.key.as_str()),
            owner: swap.owner,
            pool: swap.pool,
            market: None,
            collateral_token: None,
            pay_token: None,
            token_in: Some(swap.token_in),
            token_out: Some(swap.token_out),
            size_change: None,
            amount_in: Some(swap.amount_in),
            min_amount_out: Some(swap.min_amount_out),
            amount_out: None,
            execution_fee: swap.execution_fee,
            expires_at: None,
            submission_block: meta.block_number,
            submission_timestamp: meta.block_timestamp,
            price: swap.price,
            trigger_above_threshold: None,
            execution_timestamp: 0,
            execution_price: Amount::zero(),
            side: None,
            update_type: UpdateType::Swap,
            order_type: OrderType::Limit,
            collateral_value: None,
            status: OrderStatus::Open,
        };
        let history = History {
            trigger_price: Some(order.price.clone()),
            ..History::of_swap_order(
                History::history_id(event.key.as_str(), meta.block_timestamp),
                &order,
                meta.block_timestamp,
                meta.tx_hash.clone(),
            )
        };

        let mut user = self.load_or_create_user(&order.owner, true).await?;
        user.order_count += 1;
        self.repo.save_user(&user).await?;

        self.repo.save_order(&order).await?;
        self.append_history(history, meta.log_index).await?;
        debug!(id = %order.id, owner = %order.owner, "swap order placed");
        Ok(())
    }

    /// Cancel (`amount_out` absent) or fill a swap order.
    pub(super) async fn finish_swap_order(
        &self,
        meta: &EventMeta,
        key: &HexKey,
        amount_out: Option<&Amount>,
    ) -> Result<(), ProjectorError> {
        let id = swap_order_id(key.as_str());
        let Some(mut order) = self.repo.load_order(&id).await? else {
            debug!(%id, "transition for unknown swap order ignored");
            return Ok(());
        };

        if order.status == OrderStatus::Open {
            let mut user = self.load_or_create_user(&order.owner, true).await?;
            user.order_count = decrement_count(user.order_count, "order_count", &user.address);
            self.repo.save_user(&user).await?;
        }
        match amount_out {
            Some(amount_out) => {
                order.amount_out = Some(amount_out.clone());
                order.status = OrderStatus::Filled;
            }
            None => order.status = OrderStatus::Cancelled,
        }
        self.repo.save_order(&order).await?;

        let base = History::of_swap_order(
            History::history_id(key.as_str(), meta.block_timestamp),
            &order,
            meta.block_timestamp,
            meta.tx_hash.clone(),
        );
        let history = match order.status {
            OrderStatus::Filled => History {
                amount_out: order.amount_out.clone(),
                execution_price: Some(order.price.clone()),
                ..base
            },
            _ => History {
                trigger_price: Some(order.price.clone()),
                ..base
            },
        };
        self.append_history(history, meta.log_index).await?;
        debug!(%id, status = %order.status, "swap order transitioned");
        Ok(())
    }

    /// Market swap executed by the order manager. Only the History row is written here; the
    /// daily swap action is counted by the pool that performed the swap.
    pub(super) async fn handle_order_manager_swap(
        &self,
        meta: &EventMeta,
        event: &OrderManagerSwap,
    ) -> Result<(), ProjectorError> {
        let history = History {
            owner: Some(event.account.clone()),
            order_type: Some(OrderType::Market),
            update_type: Some(UpdateType::Swap),
            token_in: Some(event.token_in.clone()),
            token_out: Some(event.token_out.clone()),
            amount_in: Some(event.amount_in.clone()),
            amount_out: Some(event.amount_out.clone()),
            ..History::new(
                History::history_id(meta.address.as_str(), meta.block_timestamp),
                HistoryStatus::Filled,
                meta.block_timestamp,
                meta.tx_hash.clone(),
            )
        };
        self.append_history(history, meta.log_index).await?;
        debug!(account = %event.account, "market swap recorded");
        Ok(())
    }
}
