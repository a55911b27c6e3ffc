//! Which contracts are trusted sources of which events, plus the two events that grow that
//! set: `PoolAdded` on the order manager and `TokenWhitelisted` on a pool.

use super::{Projector, ProjectorError};
use crate::domain::{Address, Market, Pool, Protocol, PROTOCOL_ID};
use crate::events::{EventMeta, PoolAdded, SourceKind, TokenWhitelisted};
use std::collections::HashMap;
use tracing::{debug, info};

/// Address to source-kind map consulted before every dispatch.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<Address, SourceKind>,
    any_order_manager: bool,
}

impl SourceRegistry {
    /// An empty `order_managers` list accepts order-manager events from any address.
    pub fn new(order_managers: &[Address]) -> Self {
        let mut registry = Self {
            sources: HashMap::new(),
            any_order_manager: order_managers.is_empty(),
        };
        for address in order_managers {
            registry.register(address.clone(), SourceKind::OrderManager);
        }
        registry
    }

    /// Returns false when the address was already registered with this kind.
    pub fn register(&mut self, address: Address, kind: SourceKind) -> bool {
        self.sources.insert(address, kind) != Some(kind)
    }

    pub fn kind_of(&self, address: &Address) -> Option<SourceKind> {
        self.sources.get(address).copied()
    }

    pub fn accepts(&self, address: &Address, kind: SourceKind) -> bool {
        match kind {
            SourceKind::OrderManager if self.any_order_manager => true,
            _ => self.kind_of(address) == Some(kind),
        }
    }

    pub fn pool_count(&self) -> usize {
        self.sources
            .values()
            .filter(|kind| **kind == SourceKind::Pool)
            .count()
    }
}

impl Projector {
    pub(super) async fn handle_pool_added(
        &mut self,
        meta: &EventMeta,
        event: &PoolAdded,
    ) -> Result<(), ProjectorError> {
        let protocol = match self.repo.load_protocol().await? {
            Some(protocol) => protocol,
            None => Protocol::new(meta.address.clone()),
        };
        let pool = match self.repo.load_pool(&event.pool).await? {
            Some(pool) => pool,
            None => Pool::new(event.pool.clone(), PROTOCOL_ID),
        };

        self.repo.save_protocol(&protocol).await?;
        self.repo.save_pool(&pool).await?;

        if self.registry.register(event.pool.clone(), SourceKind::Pool) {
            info!(pool = %event.pool, order_manager = %meta.address, "pool registered");
        }
        Ok(())
    }

    pub(super) async fn handle_token_whitelisted(
        &self,
        meta: &EventMeta,
        event: &TokenWhitelisted,
    ) -> Result<(), ProjectorError> {
        let Some(mut pool) = self.repo.load_pool(&meta.address).await? else {
            debug!(pool = %meta.address, "whitelist for unknown pool ignored");
            return Ok(());
        };

        let token = self.load_or_create_token(&event.token).await?;
        let market = match self.repo.load_market(&event.token).await? {
            Some(market) => market,
            None => Market {
                index_token: event.token.clone(),
                pool: pool.address.clone(),
            },
        };
        pool.token_count += 1;

        self.repo.save_token(&token).await?;
        self.repo.save_market(&market).await?;
        self.repo.save_pool(&pool).await?;
        debug!(
            pool = %pool.address,
            token = %token.address,
            token_count = pool.token_count,
            "token whitelisted"
        );
        Ok(())
    }
}
