//! Events emitted by pool contracts registered through `PoolAdded`.

use crate::domain::{Address, Amount, HexKey, Side};
use serde::{Deserialize, Serialize};

/// Realized PnL as emitted: a sign flag and a magnitude, both uint256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pnl {
    pub sig: Amount,
    pub abs: Amount,
}

impl Pnl {
    pub fn books_profit(&self) -> bool {
        self.sig.is_zero()
    }

    /// Checked against the same `sig == 0` condition as [`Pnl::books_profit`], inside its
    /// else arm, so it is always false. Losses are never booked.
    pub fn books_loss(&self) -> bool {
        !self.books_profit() && self.sig.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenWhitelisted {
    pub token: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncreasePosition {
    pub key: HexKey,
    pub account: Address,
    pub collateral_token: Address,
    pub index_token: Address,
    pub side: Side,
    pub size_changed: Amount,
    pub fee_value: Amount,
    pub index_price: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecreasePosition {
    pub key: HexKey,
    pub account: Address,
    pub collateral_token: Address,
    pub index_token: Address,
    pub side: Side,
    pub size_changed: Amount,
    pub fee_value: Amount,
    pub index_price: Amount,
    pub pnl: Pnl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePosition {
    pub key: HexKey,
    pub size: Amount,
    pub collateral_value: Amount,
    pub reserve_amount: Amount,
    pub entry_price: Amount,
    pub entry_interest_rate: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePosition {
    pub key: HexKey,
    pub size: Amount,
    pub collateral_value: Amount,
    pub reserve_amount: Amount,
    pub entry_interest_rate: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidatePosition {
    pub key: HexKey,
    pub account: Address,
    pub collateral_token: Address,
    pub index_token: Address,
    pub side: Side,
    pub size: Amount,
    pub collateral_value: Amount,
    pub reserve_amount: Amount,
    pub index_price: Amount,
    pub pnl: Pnl,
    pub fee_value: Amount,
}

/// Pool-level token swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSwap {
    pub sender: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidity {
    pub account: Address,
    pub token: Address,
    pub amount: Amount,
    pub lp_amount: Amount,
    pub fee: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidity {
    pub account: Address,
    pub token: Address,
    pub lp_amount: Amount,
    pub amount_out: Amount,
    pub fee: Amount,
}
