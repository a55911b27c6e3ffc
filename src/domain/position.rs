//! Position and Trade entities.

use super::amount::PRICE_PRECISION_DECIMALS;
use super::{Address, Amount, PositionStatus, Side, UpdateType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub size: Amount,
    pub status: PositionStatus,
    pub collateral_value: Amount,
    /// `size * 10^30 / collateral_value`; never set directly.
    pub leverage: Amount,
    pub reserve_amount: Amount,
    pub entry_price: Amount,
    pub entry_interest_rate: Amount,
    pub owner: Option<Address>,
    pub side: Option<Side>,
    pub market: Option<Address>,
    pub collateral_token: Option<Address>,
    pub created_at_timestamp: i64,
}

impl Position {
    /// A flat, closed position as first seen at `created_at_timestamp`.
    pub fn new(id: String, created_at_timestamp: i64) -> Self {
        Self {
            id,
            size: Amount::zero(),
            status: PositionStatus::Closed,
            collateral_value: Amount::zero(),
            leverage: Amount::zero(),
            reserve_amount: Amount::zero(),
            entry_price: Amount::zero(),
            entry_interest_rate: Amount::zero(),
            owner: None,
            side: None,
            market: None,
            collateral_token: None,
            created_at_timestamp,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Leverage in 30-decimal fixed point; zero when there is no collateral.
pub fn leverage(size: &Amount, collateral_value: &Amount) -> Amount {
    (size * &Amount::pow10(PRICE_PRECISION_DECIMALS))
        .checked_div(collateral_value)
        .unwrap_or_default()
}

/// A size change on a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub owner: Address,
    pub date: i64,
    pub market: Address,
    pub side: Side,
    pub update_type: UpdateType,
    pub price: Amount,
    pub size: Amount,
    pub tx: String,
}

impl Trade {
    pub fn trade_id(market: &Address, timestamp: i64) -> String {
        format!("{}-{}", market, timestamp)
    }
}
