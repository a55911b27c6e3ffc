//! Decoded contract events as delivered by the log source.
//!
//! Every log carries an [`EventMeta`] (emitting contract, block, transaction, log index) and
//! a typed [`EventKind`] payload. A replay stream interleaves [`Block`] headers with logs
//! as [`ChainRecord`]s, in chain order.

pub mod order_manager;
pub mod pool;

use crate::domain::{Address, Block};
use serde::{Deserialize, Serialize};

pub use order_manager::{
    OrderCancelled, OrderExecuted, OrderExecutedWithOrder, OrderExpired, OrderManagerSwap,
    OrderPlaced, OrderRequest, PlacedOrder, PoolAdded, SwapOrderCancelled, SwapOrderExecuted,
    SwapOrderPlaced,
};
pub use pool::{
    AddLiquidity, ClosePosition, DecreasePosition, IncreasePosition, LiquidatePosition, Pnl,
    PoolSwap, RemoveLiquidity, TokenWhitelisted, UpdatePosition,
};

/// Context shared by every log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    /// Contract that emitted the log.
    pub address: Address,
    pub block_number: i64,
    pub block_timestamp: i64,
    pub block_hash: String,
    pub tx_hash: String,
    /// Transaction sender.
    pub tx_from: Address,
    pub log_index: i64,
}

impl EventMeta {
    /// Identity of the log within the chain: `<txHash>-<logIndex>`.
    pub fn event_id(&self) -> String {
        format!("{}-{}", self.tx_hash, self.log_index)
    }
}

/// Which kind of contract emits an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OrderManager,
    Pool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params")]
pub enum EventKind {
    PoolAdded(PoolAdded),
    OrderPlaced(OrderPlaced),
    OrderCancelled(OrderCancelled),
    OrderExpired(OrderExpired),
    OrderExecuted(OrderExecuted),
    OrderExecutedWithOrder(OrderExecutedWithOrder),
    SwapOrderPlaced(SwapOrderPlaced),
    SwapOrderCancelled(SwapOrderCancelled),
    SwapOrderExecuted(SwapOrderExecuted),
    OrderManagerSwap(OrderManagerSwap),
    TokenWhitelisted(TokenWhitelisted),
    IncreasePosition(IncreasePosition),
    DecreasePosition(DecreasePosition),
    UpdatePosition(UpdatePosition),
    ClosePosition(ClosePosition),
    LiquidatePosition(LiquidatePosition),
    Swap(PoolSwap),
    AddLiquidity(AddLiquidity),
    RemoveLiquidity(RemoveLiquidity),
}

impl EventKind {
    pub fn source(&self) -> SourceKind {
        match self {
            EventKind::PoolAdded(_)
            | EventKind::OrderPlaced(_)
            | EventKind::OrderCancelled(_)
            | EventKind::OrderExpired(_)
            | EventKind::OrderExecuted(_)
            | EventKind::OrderExecutedWithOrder(_)
            | EventKind::SwapOrderPlaced(_)
            | EventKind::SwapOrderCancelled(_)
            | EventKind::SwapOrderExecuted(_)
            | EventKind::OrderManagerSwap(_) => SourceKind::OrderManager,
            EventKind::TokenWhitelisted(_)
            | EventKind::IncreasePosition(_)
            | EventKind::DecreasePosition(_)
            | EventKind::UpdatePosition(_)
            | EventKind::ClosePosition(_)
            | EventKind::LiquidatePosition(_)
            | EventKind::Swap(_)
            | EventKind::AddLiquidity(_)
            | EventKind::RemoveLiquidity(_) => SourceKind::Pool,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PoolAdded(_) => "PoolAdded",
            EventKind::OrderPlaced(_) => "OrderPlaced",
            EventKind::OrderCancelled(_) => "OrderCancelled",
            EventKind::OrderExpired(_) => "OrderExpired",
            EventKind::OrderExecuted(_) => "OrderExecuted",
            EventKind::OrderExecutedWithOrder(_) => "OrderExecutedWithOrder",
            EventKind::SwapOrderPlaced(_) => "SwapOrderPlaced",
            EventKind::SwapOrderCancelled(_) => "SwapOrderCancelled",
            EventKind::SwapOrderExecuted(_) => "SwapOrderExecuted",
            EventKind::OrderManagerSwap(_) => "OrderManagerSwap",
            EventKind::TokenWhitelisted(_) => "TokenWhitelisted",
            EventKind::IncreasePosition(_) => "IncreasePosition",
            EventKind::DecreasePosition(_) => "DecreasePosition",
            EventKind::UpdatePosition(_) => "UpdatePosition",
            EventKind::ClosePosition(_) => "ClosePosition",
            EventKind::LiquidatePosition(_) => "LiquidatePosition",
            EventKind::Swap(_) => "Swap",
            EventKind::AddLiquidity(_) => "AddLiquidity",
            EventKind::RemoveLiquidity(_) => "RemoveLiquidity",
        }
    }
}

/// A decoded log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub meta: EventMeta,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// One entry of the ordered replay stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainRecord {
    Block(Block),
    Log(LogEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_json_shape() {
        let json = r#"{
            "type": "log",
            "meta": {
                "address": "0x1111111111111111111111111111111111111111",
                "blockNumber": 10,
                "blockTimestamp": 1700000000,
                "blockHash": "0xb1",
                "txHash": "0xt1",
                "txFrom": "0x2222222222222222222222222222222222222222",
                "logIndex": 3
            },
            "event": "OrderCancelled",
            "params": {
                "key": "0xabababababababababababababababababababababababababababababababab"
            }
        }"#;
        let record: ChainRecord = serde_json::from_str(json).unwrap();
        let ChainRecord::Log(log) = record else {
            panic!("expected a log record");
        };
        assert_eq!(log.meta.event_id(), "0xt1-3");
        assert_eq!(log.kind.source(), SourceKind::OrderManager);
        assert_eq!(log.kind.name(), "OrderCancelled");
    }

    #[test]
    fn test_block_record_json_shape() {
        let json = r#"{
            "type": "block",
            "hash": "0xb1",
            "parentHash": "0xb0",
            "unclesHash": "0x00",
            "author": "0xminer",
            "stateRoot": "0xs",
            "transactionsRoot": "0xt",
            "receiptsRoot": "0xr",
            "number": 10,
            "gasUsed": "21000",
            "gasLimit": "30000000",
            "timestamp": 1700000000,
            "difficulty": "0",
            "totalDifficulty": "0"
        }"#;
        let record: ChainRecord = serde_json::from_str(json).unwrap();
        let ChainRecord::Block(block) = record else {
            panic!("expected a block record");
        };
        assert_eq!(block.number, 10);
        assert!(block.size.is_none());
    }
}
