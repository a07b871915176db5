//! 邮件通知抽象
//!
//! 重置验证码与注册审批结果都通过 [`Mailer`] 投递。
//! 邮件传输本身不在本 crate 范围内；默认实现只写日志，
//! 部署时可替换为真正的 SMTP/API 发送器。

use crate::error::Result;
use crate::user::Role;
use async_trait::async_trait;
use tracing::info;

/// 邮件投递抽象（失败由调用方决定是否吞掉）
#[async_trait]
pub trait Mailer: Send + Sync {
    /// 发送密码重置验证码
    async fn send_reset_code(&self, to: &str, name: &str, code: &str) -> Result<()>;

    /// 通知注册申请已通过
    async fn send_registration_approved(&self, to: &str, name: &str, role: Role) -> Result<()>;

    /// 通知注册申请被拒绝
    async fn send_registration_declined(&self, to: &str, name: &str) -> Result<()>;
}

/// 本地开发用发送器：只记录日志，不真正投递
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_code(&self, to: &str, name: &str, code: &str) -> Result<()> {
        info!(to = %to, name = %name, code = %code, "mail send stub: reset code");
        Ok(())
    }

    async fn send_registration_approved(&self, to: &str, name: &str, role: Role) -> Result<()> {
        info!(to = %to, name = %name, role = %role, "mail send stub: registration approved");
        Ok(())
    }

    async fn send_registration_declined(&self, to: &str, name: &str) -> Result<()> {
        info!(to = %to, name = %name, "mail send stub: registration declined");
        Ok(())
    }
}
