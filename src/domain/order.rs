//! Order book entities: Order, OrderIndex and the History trail.

use super::{Address, Amount, Direction, HistoryStatus, OrderStatus, OrderType, Side, UpdateType};
use serde::Serialize;

/// Suffix distinguishing swap orders from position orders sharing a key space.
pub const SWAP_ORDER_SUFFIX: &str = "-SWAP";

pub fn swap_order_id(key: &str) -> String {
    format!("{}{}", key, SWAP_ORDER_SUFFIX)
}

/// An order placed through the order manager.
///
/// Position orders fill the market/collateral/size fields; swap orders fill the
/// token-in/token-out fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub owner: Address,
    pub pool: Address,
    pub market: Option<Address>,
    pub collateral_token: Option<Address>,
    pub pay_token: Option<Address>,
    pub token_in: Option<Address>,
    pub token_out: Option<Address>,
    pub size_change: Option<Amount>,
    pub amount_in: Option<Amount>,
    pub min_amount_out: Option<Amount>,
    pub amount_out: Option<Amount>,
    pub execution_fee: Amount,
    pub expires_at: Option<Amount>,
    pub submission_block: i64,
    pub submission_timestamp: i64,
    pub price: Amount,
    pub trigger_above_threshold: Option<bool>,
    pub execution_timestamp: i64,
    pub execution_price: Amount,
    pub side: Option<Side>,
    pub update_type: UpdateType,
    pub order_type: OrderType,
    pub collateral_value: Option<Amount>,
    pub status: OrderStatus,
}

impl Order {
    /// Whether this order is counted in its owner's open order count.
    pub fn counts_towards_owner(&self) -> bool {
        self.status == OrderStatus::Open && self.order_type == OrderType::Limit
    }
}

/// Compact projection of an order for book-style range queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIndex {
    pub id: String,
    pub direction: Direction,
    pub status: OrderStatus,
    pub market: Address,
    pub trigger_price: Amount,
    pub created_at: i64,
}

impl OrderIndex {
    pub fn direction_for(side: Side, update_type: UpdateType) -> Direction {
        if side == Side::Long && update_type == UpdateType::Increase {
            Direction::Bid
        } else {
            Direction::Ask
        }
    }
}

/// Immutable snapshot of an order or position at one state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub id: String,
    pub owner: Option<Address>,
    pub size: Option<Amount>,
    pub collateral_value: Option<Amount>,
    pub side: Option<Side>,
    pub order_type: Option<OrderType>,
    pub update_type: Option<UpdateType>,
    pub collateral_token: Option<Address>,
    pub market: Option<Address>,
    pub trigger_price: Option<Amount>,
    pub execution_price: Option<Amount>,
    pub trigger_above_threshold: Option<bool>,
    pub token_in: Option<Address>,
    pub token_out: Option<Address>,
    pub amount_in: Option<Amount>,
    pub amount_out: Option<Amount>,
    pub min_amount_out: Option<Amount>,
    pub liquidated_price: Option<Amount>,
    pub status: HistoryStatus,
    pub created_at_timestamp: i64,
    pub tx: String,
}

impl History {
    pub fn history_id(key: &str, timestamp: i64) -> String {
        format!("{}-{}", key, timestamp)
    }

    pub fn new(id: String, status: HistoryStatus, created_at_timestamp: i64, tx: String) -> Self {
        Self {
            id,
            owner: None,
            size: None,
            collateral_value: None,
            side: None,
            order_type: None,
            update_type: None,
            collateral_token: None,
            market: None,
            trigger_price: None,
            execution_price: None,
            trigger_above_threshold: None,
            token_in: None,
            token_out: None,
            amount_in: None,
            amount_out: None,
            min_amount_out: None,
            liquidated_price: None,
            status,
            created_at_timestamp,
            tx,
        }
    }

    /// Snapshot of a position order in its current state.
    pub fn of_order(id: String, order: &Order, created_at_timestamp: i64, tx: String) -> Self {
        Self {
            owner: Some(order.owner.clone()),
            size: order.size_change.clone(),
            collateral_value: order.collateral_value.clone(),
            side: order.side,
            order_type: Some(order.order_type),
            update_type: Some(order.update_type),
            collateral_token: order.collateral_token.clone(),
            market: order.market.clone(),
            trigger_price: Some(order.price.clone()),
            execution_price: Some(order.execution_price.clone()),
            trigger_above_threshold: order.trigger_above_threshold,
            ..History::new(id, order.status.into(), created_at_timestamp, tx)
        }
    }

    /// Snapshot of a swap order in its current state.
    pub fn of_swap_order(id: String, order: &Order, created_at_timestamp: i64, tx: String) -> Self {
        Self {
            owner: Some(order.owner.clone()),
            order_type: Some(order.order_type),
            update_type: Some(order.update_type),
            token_in: order.token_in.clone(),
            token_out: order.token_out.clone(),
            amount_in: order.amount_in.clone(),
            min_amount_out: order.min_amount_out.clone(),
            ..History::new(id, order.status.into(), created_at_timestamp, tx)
        }
    }
}
