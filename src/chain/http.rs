//! Chain reader backed by a JSON read gateway.
//!
//! Each call is a `POST {base_url}/call` with `{"to", "method", "args"}`. The gateway answers
//! `{"result": <value>}` on success or `{"reverted": true}` when the call reverted.

use super::{CallError, ChainReader, SwapOrder};
use crate::domain::{Address, Amount, HexKey};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpChainReader {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    #[serde(default)]
    reverted: bool,
    #[serde(default)]
    result: Option<Value>,
}

fn decode_response<T: DeserializeOwned>(body: Value) -> Result<T, CallError> {
    let response: CallResponse =
        serde_json::from_value(body).map_err(|e| CallError::Decode(e.to_string()))?;
    if response.reverted {
        return Err(CallError::Reverted);
    }
    let result = response
        .result
        .ok_or_else(|| CallError::Decode("missing result".to_string()))?;
    serde_json::from_value(result).map_err(|e| CallError::Decode(e.to_string()))
}

impl HttpChainReader {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        to: &Address,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, CallError> {
        let url = format!("{}/call", self.base_url);
        let payload = serde_json::json!({
            "to": to,
            "method": method,
            "args": args,
        });
        debug!(to = %to, method, "contract read");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Transport(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))?;
        decode_response(body)
    }
}

#[async_trait]
impl ChainReader for HttpChainReader {
    async fn oracle(&self, contract: &Address) -> Result<Address, CallError> {
        self.call(contract, "oracle", vec![]).await
    }

    async fn swap_order(
        &self,
        order_manager: &Address,
        key: &HexKey,
    ) -> Result<SwapOrder, CallError> {
        self.call(order_manager, "swapOrders", vec![Value::from(key.as_str())])
            .await
    }

    async fn get_price(&self, oracle: &Address, token: &Address) -> Result<Amount, CallError> {
        self.call(oracle, "getPrice", vec![Value::from(token.as_str())])
            .await
    }

    async fn lp_token(&self, pool: &Address) -> Result<Address, CallError> {
        self.call(pool, "lpToken", vec![]).await
    }

    async fn pool_value(&self, pool: &Address) -> Result<Amount, CallError> {
        self.call(pool, "getPoolValue", vec![]).await
    }

    async fn whitelisted_token(&self, pool: &Address, index: u32) -> Result<Address, CallError> {
        self.call(pool, "allWhitelistedTokens", vec![Value::from(index)])
            .await
    }

    async fn pool_amount(&self, pool: &Address, token: &Address) -> Result<Amount, CallError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PoolAsset {
            pool_amount: Amount,
        }

        let asset: PoolAsset = self
            .call(pool, "poolAssets", vec![Value::from(token.as_str())])
            .await?;
        Ok(asset.pool_amount)
    }

    async fn admin_fee(&self, pool: &Address) -> Result<Amount, CallError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct FeeConfig {
            admin_fee: Amount,
        }

        let fee: FeeConfig = self.call(pool, "fee", vec![]).await?;
        Ok(fee.admin_fee)
    }

    async fn minter(&self, lp_token: &Address) -> Result<Address, CallError> {
        self.call(lp_token, "minter", vec![]).await
    }

    async fn total_supply(&self, token: &Address) -> Result<Amount, CallError> {
        self.call(token, "totalSupply", vec![]).await
    }

    async fn decimals(&self, token: &Address) -> Result<i32, CallError> {
        self.call(token, "decimals", vec![]).await
    }

    async fn symbol(&self, token: &Address) -> Result<String, CallError> {
        self.call(token, "symbol", vec![]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_result() {
        let amount: Amount = decode_response(json!({ "result": "1000" })).unwrap();
        assert_eq!(amount, Amount::from(1000i64));
    }

    #[test]
    fn test_decode_reverted() {
        let result: Result<Amount, _> = decode_response(json!({ "reverted": true }));
        assert_eq!(result, Err(CallError::Reverted));
    }

    #[test]
    fn test_decode_missing_result() {
        let result: Result<Amount, _> = decode_response(json!({}));
        assert!(matches!(result, Err(CallError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let result: Result<Address, _> = decode_response(json!({ "result": 42 }));
        assert!(matches!(result, Err(CallError::Decode(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let reader = HttpChainReader::new("http://localhost:8545/".to_string());
        assert_eq!(reader.base_url, "http://localhost:8545");
    }
}
