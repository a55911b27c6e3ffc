use super::AppState;
use crate::domain::order::{swap_order_id, SWAP_ORDER_SUFFIX};
use crate::domain::{Address, Direction, HexKey, History, Order, OrderIndex};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order: Order,
    pub histories: Vec<History>,
}

#[derive(Debug, Deserialize)]
pub struct OrderBookQuery {
    pub market: String,
    pub direction: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookResponse {
    pub market: Address,
    pub direction: Direction,
    pub orders: Vec<OrderIndex>,
}

/// Order by id. Swap orders are addressed as `<key>-SWAP`; their history rows share the bare
/// key.
pub async fn get_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OrderResponse>, AppError> {
    let (key, is_swap) = match id.strip_suffix(SWAP_ORDER_SUFFIX) {
        Some(base) => (HexKey::parse(base)?, true),
        None => (HexKey::parse(&id)?, false),
    };
    let id = if is_swap {
        swap_order_id(key.as_str())
    } else {
        key.as_str().to_string()
    };
    let order = state
        .repo
        .load_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
    let histories = state.repo.list_histories_for_key(key.as_str()).await?;
    Ok(Json(OrderResponse { order, histories }))
}

pub async fn get_orderbook(
    Query(params): Query<OrderBookQuery>,
    State(state): State<AppState>,
) -> Result<Json<OrderBookResponse>, AppError> {
    let market = Address::parse(&params.market)?;
    let direction: Direction = params.direction.to_uppercase().parse()?;
    let orders = state.repo.list_open_book(&market, direction).await?;
    Ok(Json(OrderBookResponse {
        market,
        direction,
        orders,
    }))
}
