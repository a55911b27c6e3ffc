//! String-valued enums persisted and served as uppercase labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} label: {value}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! labels {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownLabel {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

labels!(
    /// MARKET orders carry an expiry; LIMIT orders rest until triggered.
    OrderType {
        Market => "MARKET",
        Limit => "LIMIT",
    }
);

labels!(
    UpdateType {
        Increase => "INCREASE",
        Decrease => "DECREASE",
        Swap => "SWAP",
    }
);

labels!(
    /// One-way: OPEN moves to exactly one of the terminal states.
    OrderStatus {
        Open => "OPEN",
        Cancelled => "CANCELLED",
        Expired => "EXPIRED",
        Filled => "FILLED",
    }
);

labels!(
    HistoryStatus {
        Open => "OPEN",
        Cancelled => "CANCELLED",
        Expired => "EXPIRED",
        Filled => "FILLED",
        Liquidated => "LIQUIDATED",
    }
);

labels!(
    /// Book side of an order: bids add long exposure, everything else asks.
    Direction {
        Bid => "BID",
        Ask => "ASK",
    }
);

labels!(
    PositionStatus {
        Open => "OPEN",
        Closed => "CLOSED",
    }
);

labels!(
    /// Per-user action counted in the daily rollups.
    ActionKind {
        Swap => "SWAP",
        Mint => "MINT",
        Burn => "BURN",
        Trade => "TRADE",
    }
);

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

impl From<OrderStatus> for HistoryStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Open => HistoryStatus::Open,
            OrderStatus::Cancelled => HistoryStatus::Cancelled,
            OrderStatus::Expired => HistoryStatus::Expired,
            OrderStatus::Filled => HistoryStatus::Filled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_roundtrip() {
        for status in [
            OrderStatus::Open,
            OrderStatus::Cancelled,
            OrderStatus::Expired,
            OrderStatus::Filled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("BID".parse::<Direction>().unwrap(), Direction::Bid);
    }

    #[test]
    fn test_unknown_label() {
        let err = "PENDING".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "OrderStatus");
        assert_eq!(err.value, "PENDING");
    }

    #[test]
    fn test_serde_uses_uppercase() {
        assert_eq!(
            serde_json::to_string(&HistoryStatus::Liquidated).unwrap(),
            "\"LIQUIDATED\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Open.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
    }
}
