//! Events emitted by the order manager contract.

use crate::domain::{Address, Amount, HexKey, Side};
use serde::{Deserialize, Serialize};

/// A pool was attached to the order manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolAdded {
    pub pool: Address,
}

/// Order struct as stored by the order manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub owner: Address,
    pub pool: Address,
    pub index_token: Address,
    pub collateral_token: Address,
    pub pay_token: Address,
    /// Non-zero only for market orders.
    pub expires_at: Amount,
    pub submission_block: i64,
    pub price: Amount,
    pub execution_fee: Amount,
    pub trigger_above_threshold: bool,
}

/// Position update requested alongside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub side: Side,
    /// 0 = increase, anything else = decrease.
    pub update_type: u8,
    pub size_change: Amount,
    pub collateral: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub key: HexKey,
    pub order: PlacedOrder,
    pub request: OrderRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelled {
    pub key: HexKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExpired {
    pub key: HexKey,
}

/// Execution carrying the fill price as a top-level field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExecuted {
    pub key: HexKey,
    pub fill_price: Amount,
}

/// Execution carrying the executed order; the fill price is `order.price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExecutedWithOrder {
    pub key: HexKey,
    pub order: PlacedOrder,
}

/// Swap order placement; the order itself has to be read back from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOrderPlaced {
    pub key: HexKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOrderCancelled {
    pub key: HexKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOrderExecuted {
    pub key: HexKey,
    pub amount_out: Amount,
}

/// Market swap routed through the order manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderManagerSwap {
    pub account: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    pub amount_out: Amount,
}
