//! 备餐请求 API handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use foodnest_core::{CreatePrepRequest, PrepRequest, PrepStatus};
use serde::Deserialize;

use super::super::error::ApiError;
use super::super::middleware::AuthInfo;
use super::super::state::AppState;

/// POST /prep-requests - 派发备餐请求（supervisor / superadmin）
pub async fn create_prep_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthInfo>,
    Json(req): Json<CreatePrepRequest>,
) -> Result<(StatusCode, Json<PrepRequest>), ApiError> {
    if !auth.can_dispatch_prep() {
        return Err(ApiError::forbidden("forbidden"));
    }
    if req.cook_id.trim().is_empty() {
        return Err(ApiError::bad_request("cook_id required"));
    }

    let request = state.prep.create(req, &auth.id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct ListPrepQuery {
    pub cook_id: Option<String>,
    pub status: Option<String>,
}

/// GET /prep-requests?cook_id=&status= - 列出备餐请求
pub async fn list_prep_requests(
    State(state): State<AppState>,
    Query(query): Query<ListPrepQuery>,
) -> Result<Json<Vec<PrepRequest>>, ApiError> {
    let status = query.status.as_deref().and_then(PrepStatus::parse);
    let items = state.prep.list(query.cook_id.as_deref(), status).await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePrepBody {
    pub status: Option<String>,
    pub quantity_to_prepare: Option<u32>,
}

/// PATCH /prep-requests/:id - 更新状态/数量
/// 未知状态值按忽略处理
pub async fn update_prep_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePrepBody>,
) -> Result<Json<PrepRequest>, ApiError> {
    let status = body.status.as_deref().and_then(PrepStatus::parse);
    let request = state
        .prep
        .update(&id, status, body.quantity_to_prepare)
        .await?;
    Ok(Json(request))
}
