use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::handlers::{
    approve_request, create_combo, create_food, create_prep_request, create_user, decline_request,
    delete_combo, delete_food, delete_user, forgot_password, get_me, handler_404, health,
    list_all_users, list_combos, list_foods, list_prep_requests, list_requests, list_users, login,
    register_request, reset_password, update_bank_details, update_combo, update_food,
    update_prep_request, update_user, verify_reset_code,
};
use super::middleware::auth_middleware;
use super::state::AppState;

/// 根据配置的来源列表构建 CorsLayer
fn build_cors_layer(cors_origins: Vec<String>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .allow_credentials(true);

    if cors_origins.is_empty() {
        // 未配置时允许所有来源（开发环境友好，但生产环境应配置 FN_CORS_ORIGINS）
        tracing::warn!(
            "FN_CORS_ORIGINS not configured, allowing all origins. \
             Set FN_CORS_ORIGINS in production for security."
        );
        base.allow_origin(AllowOrigin::any())
            .allow_credentials(false) // any() 不能与 credentials(true) 共用
    } else {
        // 指定来源列表
        let origins: Vec<HeaderValue> = cors_origins
            .into_iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(origins)
    }
}

/// Build the router with routes and middleware wired.
pub fn app_router(state: AppState, cors_origins: Vec<String>) -> Router {
    // 公开端点（不需要认证）
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register-request", post(register_request))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/verify-reset-code", post(verify_reset_code))
        .route("/auth/reset-password", post(reset_password));

    // 已认证的通用端点
    let user_routes = Router::new()
        .route("/auth/me", get(get_me))
        .route("/users", get(list_users));

    // 管理端点（RequireSuperadmin extractor 检查权限）
    let admin_routes = Router::new()
        .route("/admin/users", get(list_all_users).post(create_user))
        .route(
            "/admin/users/:id",
            patch(update_user).delete(delete_user),
        )
        .route("/admin/users/:id/bank", patch(update_bank_details))
        .route("/admin/requests", get(list_requests))
        .route("/admin/requests/:id/approve", post(approve_request))
        .route("/admin/requests/:id/decline", post(decline_request));

    // 菜单端点
    let menu_routes = Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", patch(update_food).delete(delete_food))
        .route("/combos", get(list_combos).post(create_combo))
        .route("/combos/:id", patch(update_combo).delete(delete_combo));

    // 备餐端点
    let prep_routes = Router::new()
        .route(
            "/prep-requests",
            get(list_prep_requests).post(create_prep_request),
        )
        .route("/prep-requests/:id", patch(update_prep_request));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(menu_routes)
        .merge(prep_routes)
        .fallback(handler_404)
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}
