mod app;

use app::{app_router, AppState, RateLimiter};
use dotenvy::dotenv;
use foodnest_core::{LogMailer, Mailer, MenuManager, PrepManager, ResetManager, ResetPolicy, UserManager};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
struct ApiConfig {
    bind: SocketAddr,
    data_dir: PathBuf,
    /// JWT 签名密钥（必填，缺失直接拒绝启动）
    jwt_secret: String,
    /// 银行信息加密密钥（可选，未配置时该功能不可用）
    encryption_key: Option<String>,
    /// 重置验证码策略
    reset_policy: ResetPolicy,
    /// CORS 允许的来源列表（空则允许所有）
    cors_origins: Vec<String>,
}

impl ApiConfig {
    fn from_env() -> anyhow::Result<Self> {
        let bind = env::var("FN_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| "0.0.0.0:8080".parse().expect("valid default bind"));

        let data_dir = env::var("FN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        // 签名密钥没有安全的默认值，必须显式配置
        let jwt_secret = env::var("FN_JWT_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("FN_JWT_SECRET is required"))?;

        let encryption_key = env::var("FN_ENCRYPTION_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let defaults = ResetPolicy::default();
        let reset_policy = ResetPolicy {
            // 位数限制在 4..=10，防止配置错误生成无意义的码
            code_length: env::var("FN_RESET_CODE_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|n: usize| n.clamp(4, 10))
                .unwrap_or(defaults.code_length),
            ttl_minutes: env::var("FN_RESET_TTL_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.ttl_minutes),
            max_attempts: env::var("FN_RESET_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
        };

        // CORS 允许的来源，逗号分隔；空或 "*" 表示允许所有
        let cors_origins = env::var("FN_CORS_ORIGINS")
            .ok()
            .map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == "*" {
                    vec![]
                } else {
                    trimmed
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| t.trim().to_string())
                        .collect()
                }
            })
            .unwrap_or_default();

        Ok(Self {
            bind,
            data_dir,
            jwt_secret,
            encryption_key,
            reset_policy,
            cors_origins,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 优先读取 .env（若存在）
    let _ = dotenv();
    init_tracing();

    let config = ApiConfig::from_env()?;
    info!("starting API on {}", config.bind);

    let users = Arc::new(
        UserManager::new(config.data_dir.clone(), config.jwt_secret.clone())
            .with_encryption_key(config.encryption_key.clone()),
    );
    users.ensure_dirs()?;

    let menu = Arc::new(MenuManager::new(config.data_dir.clone()));
    menu.ensure_dirs().await?;

    let prep = Arc::new(PrepManager::new(config.data_dir.clone(), (*menu).clone()));
    prep.ensure_dirs().await?;

    // 邮件传输不在本服务范围内，默认只写日志；
    // 部署时替换为真正的发送器即可
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    let reset = Arc::new(ResetManager::new(
        config.data_dir.clone(),
        config.reset_policy.clone(),
        (*users).clone(),
        mailer.clone(),
    ));
    reset.ensure_dirs()?;

    let login_limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(60)));
    let forgot_limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(300)));
    let auth_limiter = Arc::new(RateLimiter::new(60, Duration::from_secs(60)));

    let state = AppState {
        users,
        menu,
        prep,
        reset,
        mailer,
        login_limiter,
        forgot_limiter,
        auth_limiter,
    };

    let app = app_router(state, config.cors_origins.clone());
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
