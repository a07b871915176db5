//! 认证相关 API handlers

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use foodnest_core::{LoginRequest, RegisterRequest};
use serde_json::{json, Value};
use std::net::SocketAddr;

use super::super::error::ApiError;
use super::super::middleware::AuthInfo;
use super::super::state::AppState;

/// POST /auth/login - 用户登录
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password required"));
    }

    let ip = addr.ip().to_string();
    if !state.login_limiter.allow(&ip).await {
        return Err(ApiError::too_many_requests(
            "too many login attempts, try again later",
        ));
    }

    let auth = state.users.login(&req.email, &req.password).await?;

    Ok((StatusCode::OK, Json(json!(auth))))
}

/// POST /auth/register-request - 提交注册申请
pub async fn register_request(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if req.email.trim().is_empty() || req.name.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("missing fields"));
    }

    let request = state.users.submit_registration(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "id": request.id })),
    ))
}

/// GET /auth/me - 当前用户信息
pub async fn get_me(Extension(auth): Extension<AuthInfo>) -> Json<Value> {
    Json(json!({
        "user": {
            "id": auth.id,
            "email": auth.email,
            "name": auth.name,
            "role": auth.role,
        }
    }))
}
