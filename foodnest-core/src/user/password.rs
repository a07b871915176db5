//! 密码管理：长度校验、重置落盘

use super::crypto::hash_password;
use super::models::User;
use super::UserManager;
use crate::error::{Result, ServiceError};
use chrono::Utc;
use tracing::{info, instrument};

impl UserManager {
    /// 密码最低要求
    pub(crate) fn validate_password(password: &str) -> Result<()> {
        if password.len() < 8 {
            return Err(ServiceError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }
        Ok(())
    }

    /// 覆盖用户密码（重置流程使用，不校验旧密码）
    #[instrument(skip(self, new_password))]
    pub async fn set_password(&self, id: &str, new_password: &str) -> Result<User> {
        Self::validate_password(new_password)?;
        let mut user = self.get_user(id).await?;

        user.password_hash = hash_password(new_password).await?;
        user.updated_at = Some(Utc::now());
        self.persist_user(&user)?;

        info!(user_id = %user.id, "password updated");
        Ok(user)
    }
}
