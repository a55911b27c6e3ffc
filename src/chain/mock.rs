//! In-memory chain reader for tests; any read that was not configured reverts.

use super::{CallError, ChainReader, SwapOrder};
use crate::domain::{Address, Amount, HexKey};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MockChainReader {
    oracles: HashMap<Address, Address>,
    swap_orders: HashMap<(Address, HexKey), SwapOrder>,
    prices: HashMap<(Address, Address), Amount>,
    lp_tokens: HashMap<Address, Address>,
    pool_values: HashMap<Address, Amount>,
    whitelist: HashMap<(Address, u32), Address>,
    pool_amounts: HashMap<(Address, Address), Amount>,
    admin_fees: HashMap<Address, Amount>,
    minters: HashMap<Address, Address>,
    total_supplies: HashMap<Address, Amount>,
    decimals: HashMap<Address, i32>,
    symbols: HashMap<Address, String>,
}

fn lookup<K, V>(map: &HashMap<K, V>, key: &K) -> Result<V, CallError>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    map.get(key).cloned().ok_or(CallError::Reverted)
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oracle(mut self, contract: Address, oracle: Address) -> Self {
        self.oracles.insert(contract, oracle);
        self
    }

    pub fn with_swap_order(mut self, order_manager: Address, key: HexKey, order: SwapOrder) -> Self {
        self.swap_orders.insert((order_manager, key), order);
        self
    }

    pub fn with_price(mut self, oracle: Address, token: Address, price: Amount) -> Self {
        self.prices.insert((oracle, token), price);
        self
    }

    pub fn with_lp_token(mut self, pool: Address, lp_token: Address) -> Self {
        self.lp_tokens.insert(pool, lp_token);
        self
    }

    pub fn with_pool_value(mut self, pool: Address, value: Amount) -> Self {
        self.pool_values.insert(pool, value);
        self
    }

    /// Append `token` to the pool's whitelist at the next free index.
    pub fn with_whitelisted_token(mut self, pool: Address, token: Address) -> Self {
        let index = self.whitelist.keys().filter(|(p, _)| *p == pool).count() as u32;
        self.whitelist.insert((pool, index), token);
        self
    }

    pub fn with_pool_amount(mut self, pool: Address, token: Address, amount: Amount) -> Self {
        self.pool_amounts.insert((pool, token), amount);
        self
    }

    pub fn with_admin_fee(mut self, pool: Address, fee: Amount) -> Self {
        self.admin_fees.insert(pool, fee);
        self
    }

    pub fn with_minter(mut self, lp_token: Address, pool: Address) -> Self {
        self.minters.insert(lp_token, pool);
        self
    }

    pub fn with_total_supply(mut self, token: Address, supply: Amount) -> Self {
        self.total_supplies.insert(token, supply);
        self
    }

    pub fn with_metadata(mut self, token: Address, decimals: i32, symbol: &str) -> Self {
        self.decimals.insert(token.clone(), decimals);
        self.symbols.insert(token, symbol.to_string());
        self
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn oracle(&self, contract: &Address) -> Result<Address, CallError> {
        lookup(&self.oracles, contract)
    }

    async fn swap_order(
        &self,
        order_manager: &Address,
        key: &HexKey,
    ) -> Result<SwapOrder, CallError> {
        lookup(&self.swap_orders, &(order_manager.clone(), key.clone()))
    }

    async fn get_price(&self, oracle: &Address, token: &Address) -> Result<Amount, CallError> {
        lookup(&self.prices, &(oracle.clone(), token.clone()))
    }

    async fn lp_token(&self, pool: &Address) -> Result<Address, CallError> {
        lookup(&self.lp_tokens, pool)
    }

    async fn pool_value(&self, pool: &Address) -> Result<Amount, CallError> {
        lookup(&self.pool_values, pool)
    }

    async fn whitelisted_token(&self, pool: &Address, index: u32) -> Result<Address, CallError> {
        lookup(&self.whitelist, &(pool.clone(), index))
    }

    async fn pool_amount(&self, pool: &Address, token: &Address) -> Result<Amount, CallError> {
        lookup(&self.pool_amounts, &(pool.clone(), token.clone()))
    }

    async fn admin_fee(&self, pool: &Address) -> Result<Amount, CallError> {
        lookup(&self.admin_fees, pool)
    }

    async fn minter(&self, lp_token: &Address) -> Result<Address, CallError> {
        lookup(&self.minters, lp_token)
    }

    async fn total_supply(&self, token: &Address) -> Result<Amount, CallError> {
        lookup(&self.total_supplies, token)
    }

    async fn decimals(&self, token: &Address) -> Result<i32, CallError> {
        lookup(&self.decimals, token)
    }

    async fn symbol(&self, token: &Address) -> Result<String, CallError> {
        lookup(&self.symbols, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: char) -> Address {
        Address::parse(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn test_unset_reads_revert() {
        let mock = MockChainReader::new();
        assert_eq!(mock.oracle(&addr('1')).await, Err(CallError::Reverted));
        assert_eq!(mock.decimals(&addr('1')).await, Err(CallError::Reverted));
    }

    #[tokio::test]
    async fn test_configured_reads() {
        let mock = MockChainReader::new()
            .with_oracle(addr('1'), addr('2'))
            .with_price(addr('2'), addr('3'), Amount::from(7i64))
            .with_metadata(addr('3'), 6, "USDC");
        assert_eq!(mock.oracle(&addr('1')).await.unwrap(), addr('2'));
        assert_eq!(
            mock.get_price(&addr('2'), &addr('3')).await.unwrap(),
            Amount::from(7i64)
        );
        assert_eq!(mock.symbol(&addr('3')).await.unwrap(), "USDC");
    }

    #[tokio::test]
    async fn test_whitelist_indexes_per_pool() {
        let mock = MockChainReader::new()
            .with_whitelisted_token(addr('1'), addr('a'))
            .with_whitelisted_token(addr('2'), addr('b'))
            .with_whitelisted_token(addr('1'), addr('c'));
        assert_eq!(mock.whitelisted_token(&addr('1'), 0).await.unwrap(), addr('a'));
        assert_eq!(mock.whitelisted_token(&addr('1'), 1).await.unwrap(), addr('c'));
        assert_eq!(mock.whitelisted_token(&addr('2'), 0).await.unwrap(), addr('b'));
        assert!(mock.whitelisted_token(&addr('2'), 1).await.is_err());
    }
}
