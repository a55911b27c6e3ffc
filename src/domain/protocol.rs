//! Protocol-wide and pool-level entities: Protocol, Pool, Market, Token, User, Block.

use super::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Store key of the protocol singleton.
pub const PROTOCOL_ID: &str = "1";

/// Protocol-wide running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub id: String,
    /// Order manager that first registered a pool.
    pub address: Address,
    pub total_fee: Amount,
    pub total_volume: Amount,
    pub total_long_positions: Amount,
    pub total_short_positions: Amount,
    pub profit: Amount,
    pub loss: Amount,
    pub total_users: i32,
}

impl Protocol {
    pub fn new(address: Address) -> Self {
        Self {
            id: PROTOCOL_ID.to_string(),
            address,
            total_fee: Amount::zero(),
            total_volume: Amount::zero(),
            total_long_positions: Amount::zero(),
            total_short_positions: Amount::zero(),
            profit: Amount::zero(),
            loss: Amount::zero(),
            total_users: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub address: Address,
    pub total_fee: Amount,
    pub total_volume: Amount,
    pub total_long_positions: Amount,
    pub total_short_positions: Amount,
    /// Id of the owning protocol.
    pub protocol: String,
    /// Number of whitelisted tokens; only grows.
    pub token_count: i32,
}

impl Pool {
    pub fn new(address: Address, protocol: &str) -> Self {
        Self {
            address,
            total_fee: Amount::zero(),
            total_volume: Amount::zero(),
            total_long_positions: Amount::zero(),
            total_short_positions: Amount::zero(),
            protocol: protocol.to_string(),
            token_count: 0,
        }
    }
}

/// A tradable index token within a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub index_token: Address,
    pub pool: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub decimals: i32,
    pub symbol: String,
    pub price: Amount,
    pub last_updated_block: i64,
}

impl Token {
    pub fn new(address: Address, decimals: i32, symbol: String) -> Self {
        Self {
            address,
            decimals,
            symbol,
            price: Amount::zero(),
            last_updated_block: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub address: Address,
    pub position_count: i32,
    pub order_count: i32,
}

impl User {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            position_count: 0,
            order_count: 0,
        }
    }
}

/// Block header, stored as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub hash: String,
    pub parent_hash: String,
    pub uncles_hash: String,
    pub author: String,
    pub state_root: String,
    pub transactions_root: String,
    pub receipts_root: String,
    pub number: i64,
    pub gas_used: Amount,
    pub gas_limit: Amount,
    pub timestamp: i64,
    pub difficulty: Amount,
    pub total_difficulty: Amount,
    #[serde(default)]
    pub size: Option<Amount>,
}
