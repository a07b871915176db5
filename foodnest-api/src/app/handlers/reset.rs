//! 密码重置 API handlers
//!
//! forgot-password 对已知/未知邮箱返回完全相同的应答，
//! 不让调用方探测账户是否存在。

use axum::extract::{ConnectInfo, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

use super::super::error::ApiError;
use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyResetCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub new_password: String,
}

/// POST /auth/forgot-password - 申请重置验证码
pub async fn forgot_password(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::bad_request("email required"));
    }

    // 限流命中同样回 ok，应答保持不透明
    let ip = addr.ip().to_string();
    if !state.forgot_limiter.allow(&ip).await {
        tracing::warn!(ip = %ip, "forgot-password rate limit hit");
        return Ok(Json(json!({ "ok": true })));
    }

    state.reset.request_code(&req.email).await?;

    Ok(Json(json!({ "ok": true })))
}

/// POST /auth/verify-reset-code - 预校验验证码（不消费）
pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyResetCodeRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.trim().is_empty() || req.code.trim().is_empty() {
        return Err(ApiError::bad_request("email and code required"));
    }

    state.reset.verify_code(&req.email, req.code.trim()).await?;

    Ok(Json(json!({ "ok": true })))
}

/// POST /auth/reset-password - 校验验证码并设置新密码
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.trim().is_empty() || req.code.trim().is_empty() || req.new_password.is_empty() {
        return Err(ApiError::bad_request("email, code and new password required"));
    }

    state
        .reset
        .complete_reset(&req.email, req.code.trim(), &req.new_password)
        .await?;

    Ok(Json(json!({ "ok": true })))
}
