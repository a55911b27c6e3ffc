use super::AppState;
use crate::domain::{HexKey, Position};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_position(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Position>, AppError> {
    let key = HexKey::parse(&key)?;
    let position = state
        .repo
        .load_position(key.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("position {}", key)))?;
    Ok(Json(position))
}
