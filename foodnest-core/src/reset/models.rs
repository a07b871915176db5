//! 密码重置验证码数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 重置验证码记录（只追加，失效通过 consumed 标记）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCode {
    pub id: String,
    /// 邮箱（统一小写）
    pub email: String,
    /// 固定宽度的数字验证码
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// 失败尝试计数，只增不减
    #[serde(default)]
    pub attempts: u32,
    /// 终态标记：成功重置、被新码顶替或检查时发现过期
    #[serde(default)]
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

impl ResetCode {
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// 重置流程策略配置
#[derive(Debug, Clone)]
pub struct ResetPolicy {
    /// 验证码位数
    pub code_length: usize,
    /// 有效期（分钟）
    pub ttl_minutes: i64,
    /// 单个验证码的最大尝试次数
    pub max_attempts: u32,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_minutes: 10,
            max_attempts: 5,
        }
    }
}
