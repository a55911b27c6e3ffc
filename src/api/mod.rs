pub mod health;
pub mod orders;
pub mod pools;
pub mod positions;
pub mod protocol;
pub mod users;

use crate::db::Repository;
use axum::{routing::get, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

/// Inclusive bucket range for daily queries; both ends default to unbounded.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl RangeQuery {
    pub fn bounds(&self) -> (i64, i64) {
        (self.from.unwrap_or(0), self.to.unwrap_or(i64::MAX))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/protocol", get(protocol::get_protocol))
        .route("/v1/protocol/daily", get(protocol::get_protocol_daily))
        .route("/v1/pools/:address", get(pools::get_pool))
        .route("/v1/pools/:address/daily", get(pools::get_pool_daily))
        .route("/v1/orders/:key", get(orders::get_order))
        .route("/v1/orderbook", get(orders::get_orderbook))
        .route("/v1/positions/:key", get(positions::get_position))
        .route("/v1/users/:address", get(users::get_user))
        .layer(cors)
        .with_state(state)
}
