//! 套餐 API handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use foodnest_core::{ComboView, CreateComboRequest, UpdateComboRequest};
use serde_json::{json, Value};

use super::super::error::ApiError;
use super::super::state::AppState;

/// GET /combos - 列出全部套餐（带菜品信息）
pub async fn list_combos(State(state): State<AppState>) -> Result<Json<Vec<ComboView>>, ApiError> {
    let combos = state.menu.list_combos().await?;
    Ok(Json(combos))
}

/// POST /combos - 创建套餐
pub async fn create_combo(
    State(state): State<AppState>,
    Json(req): Json<CreateComboRequest>,
) -> Result<(StatusCode, Json<ComboView>), ApiError> {
    let combo = state.menu.create_combo(req).await?;
    Ok((StatusCode::CREATED, Json(combo)))
}

/// PATCH /combos/:id - 更新套餐
pub async fn update_combo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateComboRequest>,
) -> Result<Json<ComboView>, ApiError> {
    let combo = state.menu.update_combo(&id, req).await?;
    Ok(Json(combo))
}

/// DELETE /combos/:id - 删除套餐
pub async fn delete_combo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.menu.delete_combo(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
