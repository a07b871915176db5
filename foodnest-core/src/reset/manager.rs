//! 密码重置流程引擎
//!
//! 负责验证码的签发、校验与消费。核心不变量：任一邮箱同一时刻
//! 至多一个未消费的验证码——签发新码前先把旧码全部置为已消费。
//! 过期没有独立存储状态，读取时发现过期即置 consumed（惰性终态）。

use super::models::{ResetCode, ResetPolicy};
use crate::error::{Result, ServiceError};
use crate::mailer::Mailer;
use crate::user::{normalize_email, valid_email, UserManager};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

/// 重置验证码管理器
pub struct ResetManager {
    data_dir: PathBuf,
    policy: ResetPolicy,
    users: UserManager,
    mailer: Arc<dyn Mailer>,
    /// 串行化同一进程内的重置操作，保证“先失效旧码、再写入新码”
    /// 的顺序对后续读取可见，attempts 计数也不会丢更新
    guard: tokio::sync::Mutex<()>,
}

impl ResetManager {
    pub fn new<P: AsRef<Path>>(
        data_dir: P,
        policy: ResetPolicy,
        users: UserManager,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            policy,
            users,
            mailer,
            guard: tokio::sync::Mutex::new(()),
        }
    }

    fn resets_dir(&self) -> PathBuf {
        self.data_dir.join("password_resets")
    }

    fn reset_path(&self, id: &str) -> PathBuf {
        self.resets_dir().join(format!("{}.json", id))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.resets_dir())?;
        Ok(())
    }

    fn persist(&self, record: &ResetCode) -> Result<()> {
        let data = serde_json::to_vec_pretty(record)?;
        fs::write(self.reset_path(&record.id), data)?;
        Ok(())
    }

    /// 某邮箱的全部记录（含历史已消费记录）
    fn load_for_email(&self, email: &str) -> Result<Vec<ResetCode>> {
        self.ensure_dirs()?;
        let mut records = Vec::new();
        for entry in fs::read_dir(self.resets_dir())? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(data) = fs::read(&path) {
                    if let Ok(record) = serde_json::from_slice::<ResetCode>(&data) {
                        if record.email == email {
                            records.push(record);
                        }
                    }
                }
            }
        }
        Ok(records)
    }

    /// 最近一次创建的未消费记录
    fn latest_unconsumed(&self, email: &str) -> Result<Option<ResetCode>> {
        let mut records: Vec<ResetCode> = self
            .load_for_email(email)?
            .into_iter()
            .filter(|r| !r.consumed)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records.into_iter().next())
    }

    /// 生成定宽数字验证码，在 [0, 10^len) 上均匀分布，前导零补齐
    fn generate_code(&self) -> String {
        let len = self.policy.code_length;
        let limit = 10u64.pow(len as u32);
        let value = rand::thread_rng().gen_range(0..limit);
        format!("{:0width$}", value, width = len)
    }

    /// 共享的提交校验：尝试上限 -> 码值比对 -> 过期检查。
    /// 校验顺序即对外语义：超限不再做任何变更；比对失败累加
    /// attempts；过期置 consumed。
    fn check_submission(
        &self,
        record: &mut ResetCode,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if record.attempts >= self.policy.max_attempts {
            return Err(ServiceError::TooManyAttempts);
        }

        let matches: bool = submitted.as_bytes().ct_eq(record.code.as_bytes()).into();
        if !matches {
            record.attempts += 1;
            self.persist(record)?;
            return Err(ServiceError::CodeMismatch);
        }

        if record.expired_at(now) {
            record.consumed = true;
            self.persist(record)?;
            return Err(ServiceError::CodeExpired);
        }

        Ok(())
    }

    /// 请求重置验证码。
    ///
    /// 对调用方永远成功（邮箱格式错误除外），不暴露账户是否存在。
    /// 旧码先失效、新码后写入；投递失败只记日志，不影响结果。
    #[instrument(skip(self))]
    pub async fn request_code(&self, raw_email: &str) -> Result<()> {
        let email = normalize_email(raw_email);
        if !valid_email(&email) {
            return Err(ServiceError::Validation("invalid email".into()));
        }

        let now = Utc::now();
        let record = {
            let _guard = self.guard.lock().await;

            // 先把该邮箱所有未消费的旧码置为已消费
            for mut old in self
                .load_for_email(&email)?
                .into_iter()
                .filter(|r| !r.consumed)
            {
                old.consumed = true;
                self.persist(&old)?;
            }

            let record = ResetCode {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.clone(),
                code: self.generate_code(),
                expires_at: now + Duration::minutes(self.policy.ttl_minutes),
                attempts: 0,
                consumed: false,
                created_at: now,
            };
            self.persist(&record)?;
            record
        };

        info!(email = %email, "reset code issued");

        // 账户存在才真正投递；投递失败不外泄
        if let Some(user) = self.users.find_by_email(&email).await? {
            if let Err(e) = self
                .mailer
                .send_reset_code(&user.email, &user.name, &record.code)
                .await
            {
                warn!(email = %email, error = %e, "reset code delivery failed");
            }
        }

        Ok(())
    }

    /// 预校验验证码，不消费。
    /// 让客户端在最终提交新密码前先确认码值正确。
    #[instrument(skip(self, submitted))]
    pub async fn verify_code(&self, raw_email: &str, submitted: &str) -> Result<()> {
        let email = normalize_email(raw_email);
        let _guard = self.guard.lock().await;

        let mut record = self
            .latest_unconsumed(&email)?
            .ok_or(ServiceError::NoActiveCode)?;
        self.check_submission(&mut record, submitted, Utc::now())
    }

    /// 校验验证码并更新密码。
    /// 密码先落盘，随后才消费验证码——密码写入失败时码仍然可用，
    /// 用户可以重试。
    #[instrument(skip(self, submitted, new_password))]
    pub async fn complete_reset(
        &self,
        raw_email: &str,
        submitted: &str,
        new_password: &str,
    ) -> Result<()> {
        let email = normalize_email(raw_email);
        let _guard = self.guard.lock().await;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::UnknownAccount(email.clone()))?;

        let mut record = self
            .latest_unconsumed(&email)?
            .ok_or(ServiceError::NoActiveCode)?;
        self.check_submission(&mut record, submitted, Utc::now())?;

        self.users.set_password(&user.id, new_password).await?;

        record.consumed = true;
        self.persist(&record)?;

        info!(user_id = %user.id, "password reset completed");
        Ok(())
    }
}
