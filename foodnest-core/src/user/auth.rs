//! JWT 认证：登录、验证、签发 token

use super::crypto::verify_password;
use super::models::*;
use super::UserManager;
use crate::error::{Result, ServiceError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument, warn};

/// Token 有效期固定 7 天
const TOKEN_TTL_DAYS: i64 = 7;

impl UserManager {
    /// 用户登录
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let email = normalize_email(email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".into()))?;

        // 验证密码
        let valid = verify_password(password, &user.password_hash).await?;
        if !valid {
            warn!(email = %email, "login failed: invalid password");
            return Err(ServiceError::Unauthorized("invalid credentials".into()));
        }

        // 停用账户与错误密码同样处理，不暴露账户状态
        if user.disabled {
            warn!(user_id = %user.id, "login rejected: account disabled");
            return Err(ServiceError::Unauthorized("invalid credentials".into()));
        }

        info!(user_id = %user.id, "user logged in");
        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// 签发身份 token（{sub, role, email} + iat/exp）
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user.id.clone(),
            role: user.role,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Other(e.to_string()))
    }

    /// 验证 JWT token（只做签名与有效期检查，不查存储；
    /// 调用方需要按 sub 重新加载用户确认账户仍然有效）
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let validation = Validation::default();
        let token_data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> UserManager {
        UserManager::new(dir.path(), "test-secret".into())
    }

    #[tokio::test]
    async fn login_roundtrip() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir);
        users
            .create_user(CreateUserRequest {
                name: "Mei".into(),
                email: "Mei@Example.com".into(),
                role: Role::Cook,
                password: "longenough".into(),
            })
            .await
            .unwrap();

        // 邮箱大小写与空白都应被规范化
        let auth = users.login("  mei@example.com ", "longenough").await.unwrap();
        assert_eq!(auth.user.role, Role::Cook);

        let claims = users.verify_token(&auth.token).unwrap();
        assert_eq!(claims.email, "mei@example.com");
        assert_eq!(claims.role, Role::Cook);
        assert!(claims.exp - claims.iat == 7 * 24 * 3600);
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_unknown_email() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir);
        users
            .create_user(CreateUserRequest {
                name: "Mei".into(),
                email: "mei@example.com".into(),
                role: Role::Cook,
                password: "longenough".into(),
            })
            .await
            .unwrap();

        let wrong = users.login("mei@example.com", "nope-nope").await;
        let unknown = users.login("ghost@example.com", "longenough").await;
        // 两种失败不可区分
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(unknown, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn disabled_user_cannot_login() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir);
        let user = users
            .create_user(CreateUserRequest {
                name: "Mei".into(),
                email: "mei@example.com".into(),
                role: Role::Cook,
                password: "longenough".into(),
            })
            .await
            .unwrap();
        users
            .update_user(
                &user.id,
                UpdateUserRequest {
                    disabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(users.login("mei@example.com", "longenough").await.is_err());
    }

    #[tokio::test]
    async fn verify_rejects_foreign_signature() {
        let dir = TempDir::new().unwrap();
        let users = manager(&dir);
        let user = users
            .create_user(CreateUserRequest {
                name: "Mei".into(),
                email: "mei@example.com".into(),
                role: Role::Cook,
                password: "longenough".into(),
            })
            .await
            .unwrap();

        let other = UserManager::new(dir.path(), "other-secret".into());
        let token = other.issue_token(&user).unwrap();
        assert!(users.verify_token(&token).is_err());
    }
}
