use super::AppState;
use crate::domain::{Address, History, Order, Position, User};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

const RECENT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user: User,
    pub open_positions: Vec<Position>,
    pub orders: Vec<Order>,
    pub recent_histories: Vec<History>,
}

pub async fn get_user(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let address = Address::parse(&address)?;
    let user = state
        .repo
        .load_user(&address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", address)))?;

    let open_positions = state.repo.list_open_positions(&address).await?;
    let orders = state.repo.list_orders_by_owner(&address).await?;
    let recent_histories = state
        .repo
        .list_histories_by_owner(&address, RECENT_HISTORY_LIMIT)
        .await?;

    Ok(Json(UserResponse {
        user,
        open_positions,
        orders,
        recent_histories,
    }))
}
