//! Event projection engine.
//!
//! A [`Projector`] turns decoded logs and block headers into mutations of the stored
//! entities. Events are processed one at a time in chain order; each handler loads what it
//! needs, mutates it and saves every touched record before returning. Contract reads that
//! fail degrade to a local fallback; only store failures are returned as errors.

mod liquidity;
mod orders;
mod positions;
mod registry;
mod rollup;
mod sampler;
mod store;

pub use registry::SourceRegistry;

use crate::chain::ChainReader;
use crate::config::ProjectorConfig;
use crate::db::Repository;
use crate::events::{EventKind, LogEvent, SourceKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProjectorError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("corrupt stored state: {0}")]
    Corrupt(String),
}

pub struct Projector {
    repo: Arc<Repository>,
    chain: Arc<dyn ChainReader>,
    config: ProjectorConfig,
    registry: SourceRegistry,
}

impl Projector {
    /// Create a projector with an empty pool registry.
    pub fn new(repo: Arc<Repository>, chain: Arc<dyn ChainReader>, config: ProjectorConfig) -> Self {
        let registry = SourceRegistry::new(&config.order_managers);
        Self {
            repo,
            chain,
            config,
            registry,
        }
    }

    /// Create a projector whose registry already holds every stored pool.
    pub async fn restore(
        repo: Arc<Repository>,
        chain: Arc<dyn ChainReader>,
        config: ProjectorConfig,
    ) -> Result<Self, ProjectorError> {
        let mut projector = Self::new(repo, chain, config);
        for pool in projector.repo.list_pool_ids().await? {
            projector.registry.register(pool, SourceKind::Pool);
        }
        debug!(pools = projector.registry.pool_count(), "source registry restored");
        Ok(projector)
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Apply one log. Returns false when the emitting contract is not a registered source for
    /// this kind of event, in which case nothing is written.
    pub async fn process(&mut self, log: &LogEvent) -> Result<bool, ProjectorError> {
        let meta = &log.meta;
        if !self.registry.accepts(&meta.address, log.kind.source()) {
            debug!(
                address = %meta.address,
                event = log.kind.name(),
                "event from unregistered source ignored"
            );
            return Ok(false);
        }

        match &log.kind {
            EventKind::PoolAdded(ev) => self.handle_pool_added(meta, ev).await?,
            EventKind::OrderPlaced(ev) => self.handle_order_placed(meta, ev).await?,
            EventKind::OrderCancelled(ev) => {
                self.finish_order(meta, &ev.key, orders::Transition::Cancel)
                    .await?
            }
            EventKind::OrderExpired(ev) => {
                self.finish_order(meta, &ev.key, orders::Transition::Expire)
                    .await?
            }
            EventKind::OrderExecuted(ev) => {
                self.finish_order(meta, &ev.key, orders::Transition::Fill(&ev.fill_price))
                    .await?
            }
            EventKind::OrderExecutedWithOrder(ev) => {
                self.finish_order(meta, &ev.key, orders::Transition::Fill(&ev.order.price))
                    .await?
            }
            EventKind::SwapOrderPlaced(ev) => self.handle_swap_order_placed(meta, ev).await?,
            EventKind::SwapOrderCancelled(ev) => {
                self.finish_swap_order(meta, &ev.key, None).await?
            }
            EventKind::SwapOrderExecuted(ev) => {
                self.finish_swap_order(meta, &ev.key, Some(&ev.amount_out))
                    .await?
            }
            EventKind::OrderManagerSwap(ev) => self.handle_order_manager_swap(meta, ev).await?,
            EventKind::TokenWhitelisted(ev) => self.handle_token_whitelisted(meta, ev).await?,
            EventKind::IncreasePosition(ev) => self.handle_increase_position(meta, ev).await?,
            EventKind::DecreasePosition(ev) => self.handle_decrease_position(meta, ev).await?,
            EventKind::UpdatePosition(ev) => self.handle_update_position(meta, ev).await?,
            EventKind::ClosePosition(ev) => self.handle_close_position(meta, ev).await?,
            EventKind::LiquidatePosition(ev) => {
                self.handle_liquidate_position(meta, ev).await?
            }
            EventKind::Swap(ev) => self.handle_pool_swap(meta, ev).await?,
            EventKind::AddLiquidity(ev) => self.handle_add_liquidity(meta, ev).await?,
            EventKind::RemoveLiquidity(ev) => self.handle_remove_liquidity(meta, ev).await?,
        }

        Ok(true)
    }
}
