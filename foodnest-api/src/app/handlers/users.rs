//! 用户查询 API handlers（已认证即可访问）

use axum::extract::{Query, State};
use axum::Json;
use foodnest_core::{Role, UserSummary};
use serde::Deserialize;

use super::super::error::ApiError;
use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

/// GET /users?role=cook - 按角色列出用户
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let role_filter = query.role.as_deref().filter(|s| !s.is_empty());
    let summaries = match role_filter {
        Some(raw) => match Role::parse(raw) {
            Some(role) => state
                .users
                .list_users(Some(role))
                .await?
                .into_iter()
                .map(UserSummary::from)
                .collect(),
            // 未知角色没有匹配用户
            None => Vec::new(),
        },
        None => state
            .users
            .list_users(None)
            .await?
            .into_iter()
            .map(UserSummary::from)
            .collect(),
    };
    Ok(Json(summaries))
}
