//! 注册申请：提交、审批、拒绝

use super::crypto::hash_password;
use super::models::*;
use super::UserManager;
use crate::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument};

/// 注册申请（密码提交时即哈希，不存明文）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 提交注册申请
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

impl UserManager {
    fn registration_path(&self, id: &str) -> PathBuf {
        self.registrations_dir().join(format!("{}.json", id))
    }

    fn persist_registration(&self, req: &RegistrationRequest) -> Result<()> {
        let data = serde_json::to_vec_pretty(req)?;
        fs::write(self.registration_path(&req.id), data)?;
        Ok(())
    }

    fn load_registration(&self, id: &str) -> Result<RegistrationRequest> {
        let path = self.registration_path(id);
        if !path.exists() {
            return Err(ServiceError::NotFound(format!("registration: {}", id)));
        }
        let data = fs::read(&path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 提交注册申请（角色仅限非管理员；邮箱不得与已有用户或待审申请重复）
    #[instrument(skip(self, req))]
    pub async fn submit_registration(&self, req: RegisterRequest) -> Result<RegistrationRequest> {
        self.ensure_dirs()?;

        if !req.role.requestable() {
            return Err(ServiceError::Validation("invalid role".into()));
        }
        let email = normalize_email(&req.email);
        if !valid_email(&email) {
            return Err(ServiceError::Validation("invalid email".into()));
        }
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!("email: {}", email)));
        }
        if self
            .list_registrations()
            .await?
            .iter()
            .any(|r| r.email == email)
        {
            return Err(ServiceError::AlreadyExists(format!("request: {}", email)));
        }

        Self::validate_password(&req.password)?;
        let password_hash = hash_password(&req.password).await?;

        let request = RegistrationRequest {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            role: req.role,
            password_hash,
            created_at: Utc::now(),
        };
        self.persist_registration(&request)?;

        info!(request_id = %request.id, "registration request submitted");
        Ok(request)
    }

    /// 列出注册申请（提交时间倒序）
    #[instrument(skip(self))]
    pub async fn list_registrations(&self) -> Result<Vec<RegistrationRequest>> {
        self.ensure_dirs()?;
        let mut items = Vec::new();
        for entry in fs::read_dir(self.registrations_dir())? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Ok(data) = fs::read(&path) {
                    if let Ok(item) = serde_json::from_slice::<RegistrationRequest>(&data) {
                        items.push(item);
                    }
                }
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// 审批通过：沿用已哈希的密码创建用户，并删除申请
    #[instrument(skip(self))]
    pub async fn approve_registration(&self, id: &str) -> Result<User> {
        let request = self.load_registration(id)?;

        // 审批窗口期内邮箱可能已被占用
        if self.find_by_email(&request.email).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!(
                "email: {}",
                request.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: request.email.clone(),
            name: request.name.clone(),
            role: request.role,
            password_hash: request.password_hash.clone(),
            disabled: false,
            currency: None,
            base_salary: None,
            pay_frequency: None,
            employment_type: None,
            vat: None,
            effective_from: None,
            ot_eligible: None,
            ot_rate: None,
            allowances: None,
            deductions: None,
            tax_id: None,
            bank_enc: None,
            notes: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.insert_user(&user)?;
        fs::remove_file(self.registration_path(id))?;

        info!(request_id = %id, user_id = %user.id, "registration approved");
        Ok(user)
    }

    /// 拒绝申请：删除记录并返回内容（用于通知）
    #[instrument(skip(self))]
    pub async fn decline_registration(&self, id: &str) -> Result<RegistrationRequest> {
        let request = self.load_registration(id)?;
        fs::remove_file(self.registration_path(id))?;
        info!(request_id = %id, "registration declined");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn approve_creates_login_capable_user() {
        let dir = TempDir::new().unwrap();
        let users = UserManager::new(dir.path(), "test-secret".into());

        let request = users
            .submit_registration(RegisterRequest {
                email: "rider@example.com".into(),
                name: "Arun".into(),
                role: Role::Rider,
                password: "wheels4ever".into(),
            })
            .await
            .unwrap();

        let user = users.approve_registration(&request.id).await.unwrap();
        assert_eq!(user.role, Role::Rider);
        assert!(users.list_registrations().await.unwrap().is_empty());

        // 审批后可直接用原密码登录
        users.login("rider@example.com", "wheels4ever").await.unwrap();
    }

    #[tokio::test]
    async fn superadmin_role_cannot_be_requested() {
        let dir = TempDir::new().unwrap();
        let users = UserManager::new(dir.path(), "test-secret".into());
        let result = users
            .submit_registration(RegisterRequest {
                email: "boss@example.com".into(),
                name: "Boss".into(),
                role: Role::Superadmin,
                password: "longenough".into(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let dir = TempDir::new().unwrap();
        let users = UserManager::new(dir.path(), "test-secret".into());
        let req = RegisterRequest {
            email: "cook@example.com".into(),
            name: "Lin".into(),
            role: Role::Cook,
            password: "longenough".into(),
        };
        users.submit_registration(req.clone()).await.unwrap();
        assert!(matches!(
            users.submit_registration(req).await,
            Err(ServiceError::AlreadyExists(_))
        ));
    }
}
