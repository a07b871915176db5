use super::{app_router, AppState, RateLimiter};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use foodnest_core::{
    CreateUserRequest, Mailer, MenuManager, PrepManager, ResetManager, ResetPolicy, Result, Role,
    UserManager,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// 捕获投递验证码的测试发送器
#[derive(Default)]
struct RecordingMailer {
    codes: Mutex<Vec<String>>,
}

impl RecordingMailer {
    fn last_code(&self) -> Option<String> {
        self.codes.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_code(&self, _to: &str, _name: &str, code: &str) -> Result<()> {
        self.codes.lock().unwrap().push(code.to_string());
        Ok(())
    }
    async fn send_registration_approved(&self, _: &str, _: &str, _: Role) -> Result<()> {
        Ok(())
    }
    async fn send_registration_declined(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }
}

struct TestApp {
    _dir: TempDir,
    state: AppState,
    mailer: Arc<RecordingMailer>,
}

async fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let users = Arc::new(UserManager::new(dir.path(), "test-secret".into()));
    users.ensure_dirs().unwrap();
    let menu = Arc::new(MenuManager::new(dir.path()));
    let prep = Arc::new(PrepManager::new(dir.path(), (*menu).clone()));
    let mailer = Arc::new(RecordingMailer::default());
    let reset = Arc::new(ResetManager::new(
        dir.path(),
        ResetPolicy::default(),
        (*users).clone(),
        mailer.clone(),
    ));
    let state = AppState {
        users,
        menu,
        prep,
        reset,
        mailer: mailer.clone(),
        login_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
        forgot_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
        auth_limiter: Arc::new(RateLimiter::new(100, Duration::from_secs(60))),
    };
    TestApp {
        _dir: dir,
        state,
        mailer,
    }
}

impl TestApp {
    async fn seed_user(&self, name: &str, email: &str, role: Role, password: &str) {
        self.state
            .users
            .create_user(CreateUserRequest {
                name: name.into(),
                email: email.into(),
                role,
                password: password.into(),
            })
            .await
            .unwrap();
    }

    /// 发送一次请求并解析 JSON 应答
    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = app_router(self.state.clone(), Vec::new());
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let mut request = match body {
            Some(value) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        // oneshot 不经过 TCP accept，手动补上 ConnectInfo
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }
}

#[tokio::test]
async fn health_ok_without_auth() {
    let app = test_app().await;
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_and_me_flow() {
    let app = test_app().await;
    app.seed_user("Boss", "boss@x.com", Role::Superadmin, "BossPass1!")
        .await;

    let (status, body) = app.login("boss@x.com", "BossPass1!").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["role"], "superadmin");

    let (status, body) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "boss@x.com");

    // 错误密码与未知邮箱同样都是 401
    let (status, _) = app.login("boss@x.com", "WrongPass1!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("ghost@x.com", "BossPass1!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_token() {
    let app = test_app().await;
    let (status, _) = app.request("GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request("GET", "/users", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_password_is_opaque_for_unknown_email() {
    let app = test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": "nobody@x.com" })),
        )
        .await;
    // 未知邮箱与已知邮箱应答完全一致
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    // 但不会真的投递
    assert!(app.mailer.last_code().is_none());

    let (status, _) = app
        .request("POST", "/auth/forgot-password", None, Some(json!({ "email": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_password_reset_flow() {
    let app = test_app().await;
    app.seed_user("Aree", "a@x.com", Role::Supervisor, "OldPass1!")
        .await;

    let (status, _) = app
        .request(
            "POST",
            "/auth/forgot-password",
            None,
            Some(json!({ "email": "A@X.com " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = app.mailer.last_code().unwrap();

    // 预校验成功且可重复（不消费）
    for _ in 0..2 {
        let (status, body) = app
            .request(
                "POST",
                "/auth/verify-reset-code",
                None,
                Some(json!({ "email": "a@x.com", "code": code })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    // 错误码对外只有一条消息
    let (status, body) = app
        .request(
            "POST",
            "/auth/verify-reset-code",
            None,
            Some(json!({ "email": "a@x.com", "code": "000000" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid or expired code");

    let (status, body) = app
        .request(
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({ "email": "a@x.com", "code": code, "new_password": "NewPass1!" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    // 新密码生效，旧密码失效
    let (status, _) = app.login("a@x.com", "NewPass1!").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.login("a@x.com", "OldPass1!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 码已消费，重放失败
    let (status, body) = app
        .request(
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({ "email": "a@x.com", "code": code, "new_password": "Again1!!" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid or expired code");
}

#[tokio::test]
async fn attempts_exhaustion_is_distinguishable() {
    let app = test_app().await;
    app.seed_user("Aree", "a@x.com", Role::Cook, "OldPass1!").await;
    app.request(
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "a@x.com" })),
    )
    .await;
    let code = app.mailer.last_code().unwrap();

    for _ in 0..5 {
        let (status, _) = app
            .request(
                "POST",
                "/auth/verify-reset-code",
                None,
                Some(json!({ "email": "a@x.com", "code": "999999" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // 预算耗尽：即使是正确的码也回 429，提示申请新码
    let (status, body) = app
        .request(
            "POST",
            "/auth/verify-reset-code",
            None,
            Some(json!({ "email": "a@x.com", "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "TooManyAttempts");

    // 申请新码后恢复
    app.request(
        "POST",
        "/auth/forgot-password",
        None,
        Some(json!({ "email": "a@x.com" })),
    )
    .await;
    let fresh = app.mailer.last_code().unwrap();
    let (status, _) = app
        .request(
            "POST",
            "/auth/verify-reset-code",
            None,
            Some(json!({ "email": "a@x.com", "code": fresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_are_role_gated() {
    let app = test_app().await;
    app.seed_user("Boss", "boss@x.com", Role::Superadmin, "BossPass1!")
        .await;
    app.seed_user("Lin", "cook@x.com", Role::Cook, "CookPass1!")
        .await;

    let (_, body) = app.login("cook@x.com", "CookPass1!").await;
    let cook_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = app
        .request("GET", "/admin/users", Some(&cook_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.login("boss@x.com", "BossPass1!").await;
    let boss_token = body["token"].as_str().unwrap().to_string();
    let (status, body) = app
        .request("GET", "/admin/users", Some(&boss_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    // superadmin 不可删除
    let users = app.state.users.list_users(Some(Role::Superadmin)).await.unwrap();
    let (status, _) = app
        .request(
            "DELETE",
            &format!("/admin/users/{}", users[0].id),
            Some(&boss_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_list_filters_by_role() {
    let app = test_app().await;
    app.seed_user("Lin", "cook@x.com", Role::Cook, "CookPass1!")
        .await;
    app.seed_user("Arun", "rider@x.com", Role::Rider, "RidePass1!")
        .await;

    let (_, body) = app.login("cook@x.com", "CookPass1!").await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("GET", "/users?role=cook", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["email"], "cook@x.com");

    // 未知角色没有匹配
    let (status, body) = app
        .request("GET", "/users?role=pilot", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn prep_dispatch_is_role_gated() {
    let app = test_app().await;
    app.seed_user("Su", "sup@x.com", Role::Supervisor, "SupPass1!")
        .await;
    app.seed_user("Lin", "cook@x.com", Role::Cook, "CookPass1!")
        .await;

    let food = app
        .state
        .menu
        .create_food(foodnest_core::CreateFoodRequest {
            name: "Pad Thai".into(),
            price: 95.0,
            category: "main".into(),
            available: None,
            tax: None,
            image_url: None,
            image_path: None,
            raw_materials: None,
            total_quantity: None,
            per_serving: None,
        })
        .await
        .unwrap();

    let (_, body) = app.login("cook@x.com", "CookPass1!").await;
    let cook_token = body["token"].as_str().unwrap().to_string();
    let (status, _) = app
        .request(
            "POST",
            "/prep-requests",
            Some(&cook_token),
            Some(json!({ "food_id": food.id, "cook_id": "cook-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.login("sup@x.com", "SupPass1!").await;
    let sup_token = body["token"].as_str().unwrap().to_string();
    let (status, body) = app
        .request(
            "POST",
            "/prep-requests",
            Some(&sup_token),
            Some(json!({ "food_id": food.id, "cook_id": "cook-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["food_snapshot"]["name"], "Pad Thai");
}

#[tokio::test]
async fn registration_flow_over_http() {
    let app = test_app().await;
    app.seed_user("Boss", "boss@x.com", Role::Superadmin, "BossPass1!")
        .await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/register-request",
            None,
            Some(json!({
                "email": "rider@x.com",
                "name": "Arun",
                "role": "rider",
                "password": "RidePass1!"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = body["id"].as_str().unwrap().to_string();

    // 审批前无法登录
    let (status, _) = app.login("rider@x.com", "RidePass1!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app.login("boss@x.com", "BossPass1!").await;
    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = app
        .request(
            "POST",
            &format!("/admin/requests/{request_id}/approve"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("rider@x.com", "RidePass1!").await;
    assert_eq!(status, StatusCode::OK);
}
