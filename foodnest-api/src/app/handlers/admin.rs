//! 管理端 API handlers（仅 superadmin 可访问）

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use foodnest_core::{
    mask_account_number, CreateUserRequest, UpdateUserRequest, UserSummary,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::super::error::ApiError;
use super::super::middleware::RequireSuperadmin;
use super::super::state::AppState;

/// GET /admin/users - 列出所有用户
pub async fn list_all_users(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
) -> Result<Json<Value>, ApiError> {
    let users = state.users.list_users(None).await?;
    let items: Vec<UserSummary> = users.into_iter().map(|u| u.into()).collect();
    Ok(Json(json!({ "items": items })))
}

/// POST /admin/users - 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("name, email, role, password required"));
    }

    let user = state.users.create_user(req).await?;
    let summary: UserSummary = user.into();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "user": summary })),
    ))
}

/// PATCH /admin/users/:id - 更新用户基础字段
pub async fn update_user(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.update_user(&id, req).await?;
    let summary: UserSummary = user.into();
    Ok(Json(json!({ "ok": true, "user": summary })))
}

/// DELETE /admin/users/:id - 删除用户（superadmin 除外）
pub async fn delete_user(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.users.delete_user(&id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// 银行信息更新请求；details 为 null 时清除
#[derive(Debug, Deserialize)]
pub struct BankDetailsRequest {
    pub details: Option<Value>,
}

/// PATCH /admin/users/:id/bank - 更新加密的银行信息
pub async fn update_bank_details(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Path(id): Path<String>,
    Json(req): Json<BankDetailsRequest>,
) -> Result<Json<Value>, ApiError> {
    let masked = req
        .details
        .as_ref()
        .and_then(|d| d.get("account"))
        .and_then(|v| v.as_str())
        .map(mask_account_number);

    state.users.set_bank_details(&id, req.details.as_ref()).await?;

    Ok(Json(json!({ "ok": true, "account": masked })))
}

/// GET /admin/requests - 列出注册申请
pub async fn list_requests(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
) -> Result<Json<Value>, ApiError> {
    let items: Vec<Value> = state
        .users
        .list_registrations()
        .await?
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "email": r.email,
                "name": r.name,
                "role": r.role,
                "created_at": r.created_at,
            })
        })
        .collect();
    Ok(Json(json!({ "items": items })))
}

/// POST /admin/requests/:id/approve - 审批通过注册申请
pub async fn approve_request(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.approve_registration(&id).await?;

    // 审批结果通知尽力而为，不影响应答
    if let Err(e) = state
        .mailer
        .send_registration_approved(&user.email, &user.name, user.role)
        .await
    {
        warn!(user_id = %user.id, error = %e, "approval mail delivery failed");
    }

    let summary: UserSummary = user.into();
    Ok(Json(json!({ "ok": true, "user": summary })))
}

/// POST /admin/requests/:id/decline - 拒绝注册申请
pub async fn decline_request(
    State(state): State<AppState>,
    RequireSuperadmin(_): RequireSuperadmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let request = state.users.decline_registration(&id).await?;

    if let Err(e) = state
        .mailer
        .send_registration_declined(&request.email, &request.name)
        .await
    {
        warn!(request_id = %request.id, error = %e, "decline mail delivery failed");
    }

    Ok(Json(json!({ "ok": true })))
}
