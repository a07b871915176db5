use foodnest_core::{Mailer, MenuManager, PrepManager, ResetManager, UserManager};
use std::sync::Arc;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserManager>,
    pub menu: Arc<MenuManager>,
    pub prep: Arc<PrepManager>,
    pub reset: Arc<ResetManager>,
    /// 注册审批结果通知
    pub mailer: Arc<dyn Mailer>,
    /// 登录接口限流（按 IP）
    pub login_limiter: Arc<crate::app::RateLimiter>,
    /// 忘记密码接口限流（按 IP，叠加在每邮箱尝试预算之上）
    pub forgot_limiter: Arc<crate::app::RateLimiter>,
    /// Token 认证限流（按 IP，防止 token 暴力猜测）
    pub auth_limiter: Arc<crate::app::RateLimiter>,
}
