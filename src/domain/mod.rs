//! Domain types for the perpetuals projection.
//!
//! This module provides:
//! - Lossless uint256-scale arithmetic via the `Amount` wrapper
//! - Identity primitives: Address, HexKey, Side
//! - Stored entities and their default (freshly created) states
//! - Daily bucket arithmetic and rollup records

pub mod amount;
pub mod daily;
pub mod labels;
pub mod order;
pub mod position;
pub mod primitives;
pub mod protocol;

pub use amount::{Amount, AmountParseError};
pub use daily::{bucket_of, PoolDailyData, ProtocolDailyData, UserDailyData};
pub use labels::{
    ActionKind, Direction, HistoryStatus, OrderStatus, OrderType, PositionStatus, UnknownLabel,
    UpdateType,
};
pub use order::{History, Order, OrderIndex};
pub use position::{Position, Trade};
pub use primitives::{Address, AddressParseError, HexKey, Side};
pub use protocol::{Block, Market, Pool, Protocol, Token, User, PROTOCOL_ID};
