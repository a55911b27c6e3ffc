use super::{AppState, RangeQuery};
use crate::domain::{Protocol, ProtocolDailyData};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDailyResponse {
    pub days: Vec<ProtocolDailyData>,
}

pub async fn get_protocol(State(state): State<AppState>) -> Result<Json<Protocol>, AppError> {
    let protocol = state
        .repo
        .load_protocol()
        .await?
        .ok_or_else(|| AppError::NotFound("protocol not initialized".into()))?;
    Ok(Json(protocol))
}

pub async fn get_protocol_daily(
    Query(range): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<ProtocolDailyResponse>, AppError> {
    let (from, to) = range.bounds();
    if from > to {
        return Err(AppError::BadRequest("from must not exceed to".into()));
    }
    let days = state.repo.list_protocol_daily(from, to).await?;
    Ok(Json(ProtocolDailyResponse { days }))
}
