//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Rider,
    Cook,
    Supervisor,
    Refill,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Rider => "rider",
            Role::Cook => "cook",
            Role::Supervisor => "supervisor",
            Role::Refill => "refill",
        }
    }

    /// 解析角色字符串（大小写不敏感）
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "superadmin" => Some(Role::Superadmin),
            "rider" => Some(Role::Rider),
            "cook" => Some(Role::Cook),
            "supervisor" => Some(Role::Supervisor),
            "refill" => Some(Role::Refill),
            _ => None,
        }
    }

    /// 注册申请只开放非管理员角色
    pub fn requestable(&self) -> bool {
        !matches!(self, Role::Superadmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户账户（存储模型，包含密码哈希）
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 用户唯一 ID (UUID)
    pub id: String,
    /// 邮箱（唯一，存储时统一小写）
    pub email: String,
    pub name: String,
    pub role: Role,
    /// bcrypt 哈希后的密码
    pub password_hash: String,
    /// 账户停用标记
    #[serde(default)]
    pub disabled: bool,

    // 薪酬字段（全部可选）
    pub currency: Option<String>,
    pub base_salary: Option<f64>,
    pub pay_frequency: Option<String>,
    pub employment_type: Option<String>,
    pub vat: Option<f64>,
    pub effective_from: Option<DateTime<Utc>>,
    pub ot_eligible: Option<bool>,
    pub ot_rate: Option<f64>,
    pub allowances: Option<f64>,
    pub deductions: Option<f64>,
    pub tax_id: Option<String>,
    /// 银行信息密文（AES-256-GCM，不落明文）
    pub bank_enc: Option<String>,
    pub notes: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 创建用户请求（管理员）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

/// 更新用户请求（管理员，部分字段）
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub disabled: Option<bool>,
}

/// 登录请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// JWT Claims 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: 用户 ID
    pub sub: String,
    pub role: Role,
    pub email: String,
    /// 签发时间戳 (Unix timestamp)
    pub iat: i64,
    /// 过期时间戳 (Unix timestamp)
    pub exp: i64,
}

/// 登录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// 用户列表项（不含敏感信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// "Active" / "Inactive"，由 disabled 推导
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: if user.disabled { "Inactive" } else { "Active" }.to_string(),
            created_at: user.created_at,
        }
    }
}

/// 邮箱统一规范化：去空白、转小写
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 邮箱形态的最低限度校验
pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
