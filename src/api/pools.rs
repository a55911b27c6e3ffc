use super::{AppState, RangeQuery};
use crate::domain::{Address, Pool, PoolDailyData};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDailyResponse {
    pub pool: Address,
    pub days: Vec<PoolDailyData>,
}

pub async fn get_pool(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Pool>, AppError> {
    let address = Address::parse(&address)?;
    let pool = state
        .repo
        .load_pool(&address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pool {}", address)))?;
    Ok(Json(pool))
}

pub async fn get_pool_daily(
    Path(address): Path<String>,
    Query(range): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<PoolDailyResponse>, AppError> {
    let pool = Address::parse(&address)?;
    let (from, to) = range.bounds();
    if from > to {
        return Err(AppError::BadRequest("from must not exceed to".into()));
    }
    let days = state.repo.list_pool_daily(&pool, from, to).await?;
    Ok(Json(PoolDailyResponse { pool, days }))
}
