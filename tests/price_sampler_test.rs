mod common;

use common::*;
use perpindex::chain::MockChainReader;
use perpindex::config::ProjectorConfig;
use perpindex::domain::{Address, Block, Token};

fn lp_a() -> Address {
    addr('5')
}

fn lp_b() -> Address {
    addr('6')
}

fn sampler_config() -> ProjectorConfig {
    ProjectorConfig {
        lp_tokens: vec![lp_a(), lp_b()],
        skip_blocks: 10,
        ..ProjectorConfig::default()
    }
}

fn sampler_chain() -> MockChainReader {
    MockChainReader::new()
        .with_metadata(lp_a(), 18, "ALP")
        .with_minter(lp_a(), pool())
        .with_total_supply(lp_a(), amt(10))
        .with_minter(lp_b(), addr('b'))
        .with_total_supply(lp_b(), amt(4))
        .with_pool_value(pool(), amt(1000))
        .with_pool_value(addr('b'), amt(100))
}

fn block(number: i64) -> Block {
    Block {
        hash: format!("0xblock{}", number),
        parent_hash: format!("0xblock{}", number - 1),
        uncles_hash: "0x00".to_string(),
        author: "0xminer".to_string(),
        state_root: "0xs".to_string(),
        transactions_root: "0xt".to_string(),
        receipts_root: "0xr".to_string(),
        number,
        gas_used: amt(21_000),
        gas_limit: amt(30_000_000),
        timestamp: T0 + number * 12,
        difficulty: amt(0),
        total_difficulty: amt(0),
        size: Some(amt(512)),
    }
}

#[tokio::test]
async fn test_block_is_stored_and_prices_sampled() {
    let h = Harness::with_config(sampler_chain(), sampler_config()).await;
    h.projector.handle_block(&block(100)).await.unwrap();

    let stored = h.repo.load_block("0xblock100").await.unwrap().unwrap();
    assert_eq!(stored, block(100));

    let a = h.repo.load_token(&lp_a()).await.unwrap().unwrap();
    assert_eq!(a.price, amt(100));
    assert_eq!(a.last_updated_block, 100);
    assert_eq!(a.decimals, 18);
    assert_eq!(a.symbol, "ALP");

    let b = h.repo.load_token(&lp_b()).await.unwrap().unwrap();
    assert_eq!(b.price, amt(25));
    // metadata reads revert for this token
    assert_eq!(b.decimals, 0);
    assert_eq!(b.symbol, "");
}

#[tokio::test]
async fn test_skip_window_on_first_token_stops_all() {
    let h = Harness::with_config(sampler_chain(), sampler_config()).await;
    let mut recent = Token::new(lp_a(), 18, "ALP".to_string());
    recent.last_updated_block = 95;
    h.repo.save_token(&recent).await.unwrap();

    h.projector.handle_block(&block(100)).await.unwrap();
    assert_eq!(h.repo.load_token(&lp_a()).await.unwrap().unwrap(), recent);
    assert!(h.repo.load_token(&lp_b()).await.unwrap().is_none());

    h.projector.handle_block(&block(106)).await.unwrap();
    assert_eq!(
        h.repo.load_token(&lp_a()).await.unwrap().unwrap().last_updated_block,
        106
    );
    assert!(h.repo.load_token(&lp_b()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_early_blocks_fall_inside_window() {
    let h = Harness::with_config(sampler_chain(), sampler_config()).await;
    h.projector.handle_block(&block(10)).await.unwrap();

    assert!(h.repo.load_block("0xblock10").await.unwrap().is_some());
    assert!(h.repo.load_token(&lp_a()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_zero_supply_stops_sampling() {
    let chain = MockChainReader::new()
        .with_minter(lp_a(), pool())
        .with_pool_value(pool(), amt(1000))
        .with_total_supply(lp_a(), amt(0))
        .with_minter(lp_b(), pool())
        .with_total_supply(lp_b(), amt(10));
    let h = Harness::with_config(chain, sampler_config()).await;
    h.projector.handle_block(&block(100)).await.unwrap();

    assert!(h.repo.load_token(&lp_a()).await.unwrap().is_none());
    assert!(h.repo.load_token(&lp_b()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_whitelisting_creates_token_and_market() {
    let chain = MockChainReader::new().with_metadata(addr('c'), 6, "USDC");
    let mut h = Harness::new(chain).await;
    h.add_pool().await;

    h.whitelist(addr('c')).await;
    h.whitelist(Address::native()).await;
    h.whitelist(addr('d')).await;

    let pool_row = h.repo.load_pool(&pool()).await.unwrap().unwrap();
    assert_eq!(pool_row.token_count, 3);

    let usdc = h.repo.load_token(&addr('c')).await.unwrap().unwrap();
    assert_eq!((usdc.decimals, usdc.symbol.as_str()), (6, "USDC"));
    let native = h.repo.load_token(&Address::native()).await.unwrap().unwrap();
    assert_eq!((native.decimals, native.symbol.as_str()), (18, "ETH"));
    let unknown = h.repo.load_token(&addr('d')).await.unwrap().unwrap();
    assert_eq!((unknown.decimals, unknown.symbol.as_str()), (0, ""));

    let market = h.repo.load_market(&addr('d')).await.unwrap().unwrap();
    assert_eq!(market.pool, pool());
}
