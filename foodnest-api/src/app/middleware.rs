use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use foodnest_core::Role;

use super::error::ApiError;
use super::state::AppState;

/// 认证信息扩展（来自存储的当前数据，不是 token 里的快照）
#[derive(Debug, Clone)]
pub struct AuthInfo {
	pub id: String,
	pub email: String,
	pub name: String,
	pub role: Role,
}

impl AuthInfo {
	/// 检查是否是超级管理员
	pub fn is_superadmin(&self) -> bool {
		self.role == Role::Superadmin
	}

	/// 是否可以派发备餐请求
	pub fn can_dispatch_prep(&self) -> bool {
		matches!(self.role, Role::Supervisor | Role::Superadmin)
	}
}

/// 要求超级管理员权限的 Extractor
#[derive(Debug, Clone)]
pub struct RequireSuperadmin(#[allow(dead_code)] pub AuthInfo);

impl<S: Send + Sync> FromRequestParts<S> for RequireSuperadmin {
	type Rejection = ApiError;

	fn from_request_parts<'a, 'b, 'c>(
		parts: &'a mut Parts,
		_state: &'b S,
	) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'c>>
	where
		'a: 'c,
		'b: 'c,
	{
		Box::pin(async move {
			let auth = parts
				.extensions
				.get::<AuthInfo>()
				.cloned()
				.ok_or_else(ApiError::unauthorized)?;

			if !auth.is_superadmin() {
				return Err(ApiError::forbidden("superadmin access required"));
			}
			Ok(RequireSuperadmin(auth))
		})
	}
}

/// 不需要认证的路径
const PUBLIC_PATHS: &[&str] = &[
	"/health",
	"/auth/login",
	"/auth/register-request",
	"/auth/forgot-password",
	"/auth/verify-reset-code",
	"/auth/reset-password",
];

/// 从请求中提取 Bearer token
fn extract_token(request: &Request<Body>) -> Option<String> {
	request
		.headers()
		.get(axum::http::header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(|token| token.to_string())
}

/// 从请求中提取客户端 IP
/// 优先级：X-Real-IP > X-Forwarded-For（第一个） > Socket Address
fn extract_client_ip(request: &Request<Body>) -> String {
	if let Some(real_ip) = request
		.headers()
		.get("X-Real-IP")
		.and_then(|v| v.to_str().ok())
	{
		return real_ip.to_string();
	}

	if let Some(forwarded) = request
		.headers()
		.get("X-Forwarded-For")
		.and_then(|v| v.to_str().ok())
	{
		if let Some(first_ip) = forwarded.split(',').next().map(|s| s.trim()) {
			if !first_ip.is_empty() {
				return first_ip.to_string();
			}
		}
	}

	request
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ci| ci.0.ip().to_string())
		.unwrap_or_else(|| "unknown".to_string())
}

pub async fn auth_middleware(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Result<Response, ApiError> {
	let path = request.uri().path().to_string();

	// 公开端点不需要认证
	if PUBLIC_PATHS.iter().any(|p| path == *p) {
		return Ok(next.run(request).await);
	}

	let client_ip = extract_client_ip(&request);
	let token = match extract_token(&request) {
		Some(t) => t,
		None => {
			if !state.auth_limiter.allow(&client_ip).await {
				tracing::warn!(ip = %client_ip, path = %path, "auth rate limit hit (no token)");
				return Err(ApiError::too_many_requests("too many requests, slow down"));
			}
			return Err(ApiError::unauthorized());
		}
	};

	// 签名/有效期检查
	let claims = match state.users.verify_token(&token) {
		Ok(c) => c,
		Err(_) => {
			if !state.auth_limiter.allow(&client_ip).await {
				tracing::warn!(ip = %client_ip, path = %path, "auth rate limit hit (bad token)");
				return Err(ApiError::too_many_requests("too many requests, slow down"));
			}
			return Err(ApiError::unauthorized());
		}
	};

	// token 载荷可能过期：重新加载用户确认账户仍然存在，
	// 角色以存储里的为准
	let user = match state.users.get_user(&claims.sub).await {
		Ok(user) => user,
		Err(_) => {
			return Err(ApiError::unauthorized_with_message("invalid token"));
		}
	};
	if user.disabled {
		return Err(ApiError::unauthorized_with_message("invalid token"));
	}

	let auth_info = AuthInfo {
		id: user.id,
		email: user.email,
		name: user.name,
		role: user.role,
	};
	request.extensions_mut().insert(auth_info);
	Ok(next.run(request).await)
}
