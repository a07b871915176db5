//! 用户管理器：核心结构和用户 CRUD 操作

use super::crypto::hash_password;
use super::models::*;
use crate::error::{Result, ServiceError};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// 用户管理器
#[derive(Debug, Clone)]
pub struct UserManager {
    /// 用户数据存储目录
    pub(super) data_dir: PathBuf,
    /// JWT 签名密钥
    pub(super) jwt_secret: String,
    /// 银行信息加密密钥（未配置时加密功能不可用）
    pub(super) encryption_key: Option<String>,
}

// ============================================================================
// 构造器和配置
// ============================================================================

impl UserManager {
    /// 创建新的用户管理器
    pub fn new<P: AsRef<Path>>(data_dir: P, jwt_secret: String) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            jwt_secret,
            encryption_key: None,
        }
    }

    /// 配置银行信息加密密钥
    pub fn with_encryption_key(mut self, key: Option<String>) -> Self {
        self.encryption_key = key;
        self
    }
}

// ============================================================================
// 内部辅助方法
// ============================================================================

impl UserManager {
    /// 持久化用户数据
    pub(super) fn persist_user(&self, user: &User) -> Result<()> {
        let data = serde_json::to_vec_pretty(user)?;
        fs::write(self.user_path(&user.id), data)?;
        Ok(())
    }

    /// 邮箱索引文件路径
    fn index_path(&self) -> PathBuf {
        self.users_dir().join("index.json")
    }

    /// 加载邮箱 -> ID 索引
    fn load_email_index(&self) -> HashMap<String, String> {
        let path = self.index_path();
        if let Ok(data) = fs::read(&path) {
            if let Ok(map) = serde_json::from_slice::<HashMap<String, String>>(&data) {
                return map;
            }
        }
        HashMap::new()
    }

    /// 保存邮箱索引
    fn save_email_index(&self, index: &HashMap<String, String>) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        fs::write(self.index_path(), data)?;
        Ok(())
    }

    /// 确保用户目录存在
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.users_dir())?;
        fs::create_dir_all(self.registrations_dir())?;
        Ok(())
    }

    /// 用户存储目录
    fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }

    pub(super) fn registrations_dir(&self) -> PathBuf {
        self.data_dir.join("registration_requests")
    }

    /// 用户文件路径
    fn user_path(&self, id: &str) -> PathBuf {
        self.users_dir().join(format!("{}.json", id))
    }
}

// ============================================================================
// 用户 CRUD 操作
// ============================================================================

impl UserManager {
    /// 创建用户（管理员操作）
    #[instrument(skip(self, req))]
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        self.ensure_dirs()?;

        let email = normalize_email(&req.email);
        if !valid_email(&email) {
            return Err(ServiceError::Validation("invalid email".into()));
        }
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name is required".into()));
        }

        // 检查邮箱是否已被占用
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!("email: {}", email)));
        }

        Self::validate_password(&req.password)?;
        let password_hash = hash_password(&req.password).await?;

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name,
            role: req.role,
            password_hash,
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

        info!(user_id = %user.id, email = %user.email, "created user");
        Ok(user)
    }

    /// 落盘用户并维护邮箱索引（注册审批也会走这里）
    pub(super) fn insert_user(&self, user: &User) -> Result<()> {
        self.persist_user(user)?;
        let mut index = self.load_email_index();
        index.insert(user.email.clone(), user.id.clone());
        self.save_email_index(&index)
    }

    /// 获取用户
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<User> {
        let path = self.user_path(id);
        if !path.exists() {
            return Err(ServiceError::NotFound(format!("user: {}", id)));
        }
        let data = fs::read(&path)?;
        let user: User = serde_json::from_slice(&data)?;
        Ok(user)
    }

    /// 通过邮箱查找（优先使用索引，避免全量扫描）
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.ensure_dirs()?;
        let email = normalize_email(email);
        let index = self.load_email_index();

        // 优先从索引查找
        if let Some(id) = index.get(&email) {
            match self.get_user(id).await {
                Ok(user) => return Ok(Some(user)),
                Err(ServiceError::NotFound(_)) => {
                    // 索引指向的用户不存在，需要清理索引
                    let mut index = index;
                    index.remove(&email);
                    let _ = self.save_email_index(&index);
                }
                Err(e) => return Err(e),
            }
        }

        // 索引中没有，逐个读取用户文件，找到匹配的邮箱即停止
        let dir = self.users_dir();
        if !dir.exists() {
            return Ok(None);
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && path.file_stem().map(|s| s != "index").unwrap_or(true)
            {
                if let Ok(data) = fs::read(&path) {
                    if let Ok(user) = serde_json::from_slice::<User>(&data) {
                        if user.email == email {
                            // 更新索引
                            let mut index = self.load_email_index();
                            index.insert(email.clone(), user.id.clone());
                            let _ = self.save_email_index(&index);
                            return Ok(Some(user));
                        }
                    }
                }
            }
        }

        Ok(None)
    }

    /// 列出所有用户，可按角色过滤（创建时间倒序）
    #[instrument(skip(self))]
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        self.ensure_dirs()?;
        let mut users = Vec::new();

        let dir = self.users_dir();
        if dir.exists() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                // 跳过 index.json
                if path.file_stem().map(|s| s == "index").unwrap_or(false) {
                    continue;
                }
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Ok(data) = fs::read(&path) {
                        if let Ok(user) = serde_json::from_slice::<User>(&data) {
                            if role.map(|r| user.role == r).unwrap_or(true) {
                                users.push(user);
                            }
                        }
                    }
                }
            }
        }

        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// 更新用户基础字段
    #[instrument(skip(self, req))]
    pub async fn update_user(&self, id: &str, req: UpdateUserRequest) -> Result<User> {
        let mut user = self.get_user(id).await?;
        let old_email = user.email.clone();

        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::Validation("name is required".into()));
            }
            user.name = name;
        }

        if let Some(email) = req.email {
            let email = normalize_email(&email);
            if !valid_email(&email) {
                return Err(ServiceError::Validation("invalid email".into()));
            }
            if email != old_email {
                if self.find_by_email(&email).await?.is_some() {
                    return Err(ServiceError::AlreadyExists(format!("email: {}", email)));
                }
                user.email = email;
            }
        }

        if let Some(role) = req.role {
            user.role = role;
        }
        if let Some(disabled) = req.disabled {
            user.disabled = disabled;
        }

        user.updated_at = Some(Utc::now());
        self.persist_user(&user)?;

        // 邮箱变化时同步索引
        if user.email != old_email {
            let mut index = self.load_email_index();
            index.remove(&old_email);
            index.insert(user.email.clone(), user.id.clone());
            self.save_email_index(&index)?;
        }

        info!(user_id = %id, "updated user");
        Ok(user)
    }

    /// 删除用户（superadmin 不可删除）
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let user = self.get_user(id).await?;
        if user.role == Role::Superadmin {
            return Err(ServiceError::Validation("cannot delete superadmin".into()));
        }

        fs::remove_file(self.user_path(id))?;
        let mut index = self.load_email_index();
        index.retain(|_, uid| uid != id);
        self.save_email_index(&index)?;
        info!(user_id = %id, "deleted user");
        Ok(())
    }
}
