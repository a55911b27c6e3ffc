//! Read-only contract calls made while projecting events.
//!
//! Every read is fallible. A revert is an expected outcome (the contract may not implement
//! the method, or the state may not exist yet) and handlers fall back locally instead of
//! failing the event.

use crate::domain::{Address, Amount, HexKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod http;
pub mod mock;

pub use http::HttpChainReader;
pub use mock::MockChainReader;

/// Why a contract read produced no value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("call reverted")]
    Reverted,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Swap order as returned by the order manager's `swapOrders(key)` getter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOrder {
    pub owner: Address,
    pub pool: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub price: Amount,
    pub execution_fee: Amount,
}

/// Typed view over the contracts the projector reads from.
///
/// Implementations perform exactly one attempt per call; there is no retry at this layer.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// Price feed address configured on an order manager or pool.
    async fn oracle(&self, contract: &Address) -> Result<Address, CallError>;

    async fn swap_order(
        &self,
        order_manager: &Address,
        key: &HexKey,
    ) -> Result<SwapOrder, CallError>;

    /// Token price from a price feed, 30-decimal fixed point.
    async fn get_price(&self, oracle: &Address, token: &Address) -> Result<Amount, CallError>;

    async fn lp_token(&self, pool: &Address) -> Result<Address, CallError>;

    async fn pool_value(&self, pool: &Address) -> Result<Amount, CallError>;

    /// `allWhitelistedTokens(index)`.
    async fn whitelisted_token(&self, pool: &Address, index: u32) -> Result<Address, CallError>;

    /// Pooled amount of `token` from `poolAssets(token)`.
    async fn pool_amount(&self, pool: &Address, token: &Address) -> Result<Amount, CallError>;

    /// Admin fee share from the pool's fee configuration, 10-decimal fixed point.
    async fn admin_fee(&self, pool: &Address) -> Result<Amount, CallError>;

    /// Pool allowed to mint an LP token.
    async fn minter(&self, lp_token: &Address) -> Result<Address, CallError>;

    async fn total_supply(&self, token: &Address) -> Result<Amount, CallError>;

    async fn decimals(&self, token: &Address) -> Result<i32, CallError>;

    async fn symbol(&self, token: &Address) -> Result<String, CallError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_display() {
        assert_eq!(CallError::Reverted.to_string(), "call reverted");
        assert_eq!(
            CallError::Transport("connection refused".to_string()).to_string(),
            "transport error: connection refused"
        );
    }

    #[test]
    fn test_swap_order_json_shape() {
        let json = r#"{
            "owner": "0x1111111111111111111111111111111111111111",
            "pool": "0x2222222222222222222222222222222222222222",
            "tokenIn": "0x3333333333333333333333333333333333333333",
            "tokenOut": "0x4444444444444444444444444444444444444444",
            "amountIn": "1000",
            "minAmountOut": "990",
            "price": "5",
            "executionFee": "1"
        }"#;
        let order: SwapOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.min_amount_out, Amount::from(990i64));
    }
}
