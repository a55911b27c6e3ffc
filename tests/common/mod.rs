#![allow(dead_code)]

use perpindex::chain::MockChainReader;
use perpindex::config::ProjectorConfig;
use perpindex::db::init_db;
use perpindex::domain::{Address, Amount, HexKey, Side};
use perpindex::events::{
    EventKind, EventMeta, IncreasePosition, LogEvent, OrderPlaced, OrderRequest, PlacedOrder,
    PoolAdded, TokenWhitelisted,
};
use perpindex::{Projector, Repository};
use std::sync::Arc;
use tempfile::TempDir;

pub const DAY: i64 = 86_400;
pub const T0: i64 = 1_700_006_400;

pub fn addr(c: char) -> Address {
    Address::parse(&format!("0x{}", c.to_string().repeat(40))).unwrap()
}

pub fn key(c: char) -> HexKey {
    HexKey::parse(&format!("0x{}", c.to_string().repeat(64))).unwrap()
}

pub fn amt(v: i64) -> Amount {
    Amount::from(v)
}

pub fn order_manager() -> Address {
    addr('9')
}

pub fn pool() -> Address {
    addr('a')
}

pub fn trader() -> Address {
    addr('1')
}

pub struct Harness {
    pub repo: Arc<Repository>,
    pub projector: Projector,
    _temp: TempDir,
}

impl Harness {
    pub async fn new(chain: MockChainReader) -> Self {
        Self::with_config(chain, ProjectorConfig::default()).await
    }

    pub async fn with_config(chain: MockChainReader, config: ProjectorConfig) -> Self {
        let (repo, temp) = setup_repo().await;
        let projector = Projector::new(repo.clone(), Arc::new(chain), config);
        Self {
            repo,
            projector,
            _temp: temp,
        }
    }

    pub async fn apply(&mut self, address: Address, ts: i64, log_index: i64, kind: EventKind) {
        let log = LogEvent {
            meta: meta(address, ts, log_index),
            kind,
        };
        self.projector.process(&log).await.unwrap();
    }

    /// Register the default pool under the default order manager.
    pub async fn add_pool(&mut self) {
        self.apply(
            order_manager(),
            T0,
            0,
            EventKind::PoolAdded(PoolAdded { pool: pool() }),
        )
        .await;
    }

    pub async fn whitelist(&mut self, token: Address) {
        self.apply(
            pool(),
            T0,
            1,
            EventKind::TokenWhitelisted(TokenWhitelisted { token }),
        )
        .await;
    }
}

pub async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

pub fn meta(address: Address, ts: i64, log_index: i64) -> EventMeta {
    EventMeta {
        address,
        block_number: ts / 12,
        block_timestamp: ts,
        block_hash: format!("0xb{}", ts),
        tx_hash: format!("0xt{}{}", ts, log_index),
        tx_from: trader(),
        log_index,
    }
}

pub fn increase(key_char: char, side: Side, size: i64, fee: i64) -> EventKind {
    EventKind::IncreasePosition(IncreasePosition {
        key: key(key_char),
        account: trader(),
        collateral_token: addr('c'),
        index_token: addr('d'),
        side,
        size_changed: amt(size),
        fee_value: amt(fee),
        index_price: amt(2000),
    })
}

/// Order placement; `expires_at` zero makes it a LIMIT order.
pub fn order_placed(
    key_char: char,
    side: Side,
    update_type: u8,
    price: i64,
    expires_at: i64,
) -> EventKind {
    EventKind::OrderPlaced(OrderPlaced {
        key: key(key_char),
        order: PlacedOrder {
            owner: trader(),
            pool: pool(),
            index_token: addr('d'),
            collateral_token: addr('c'),
            pay_token: addr('c'),
            expires_at: amt(expires_at),
            submission_block: 100,
            price: amt(price),
            execution_fee: amt(1),
            trigger_above_threshold: false,
        },
        request: OrderRequest {
            side,
            update_type,
            size_change: amt(5000),
            collateral: amt(10),
        },
    })
}
