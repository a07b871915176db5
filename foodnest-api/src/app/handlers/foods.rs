//! 菜品 API handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use foodnest_core::{CreateFoodRequest, FoodItem, UpdateFoodRequest};
use serde_json::{json, Value};

use super::super::error::ApiError;
use super::super::state::AppState;

/// GET /foods - 列出全部菜品
pub async fn list_foods(State(state): State<AppState>) -> Result<Json<Vec<FoodItem>>, ApiError> {
    let foods = state.menu.list_foods().await?;
    Ok(Json(foods))
}

/// POST /foods - 创建菜品
pub async fn create_food(
    State(state): State<AppState>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodItem>), ApiError> {
    let food = state.menu.create_food(req).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

/// PATCH /foods/:id - 更新菜品
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFoodRequest>,
) -> Result<Json<FoodItem>, ApiError> {
    let food = state.menu.update_food(&id, req).await?;
    Ok(Json(food))
}

/// DELETE /foods/:id - 删除菜品
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.menu.delete_food(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
