//! 银行信息加密解密工具
//!
//! 使用 AES-256-GCM 对称加密，密钥从环境配置派生

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose, Engine};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use super::models::User;
use super::UserManager;
use crate::error::{Result, ServiceError};
use chrono::Utc;
use tracing::{info, instrument};

impl UserManager {
    /// 从配置的密钥派生加密密钥（HKDF-SHA256）
    fn derive_encryption_key(&self) -> Result<[u8; 32]> {
        let raw = self
            .encryption_key
            .as_deref()
            .ok_or_else(|| ServiceError::Other("encryption key not configured".into()))?;
        let hk = Hkdf::<Sha256>::new(None, raw.as_bytes());
        let mut okm = [0u8; 32];
        hk.expand(b"bank-details-encryption", &mut okm)
            .map_err(|e| ServiceError::Other(format!("HKDF expand failed: {}", e)))?;
        Ok(okm)
    }

    /// 加密银行信息 JSON
    ///
    /// 返回格式: base64(nonce || ciphertext)
    pub fn seal_bank_details(&self, details: &serde_json::Value) -> Result<String> {
        let key_bytes = self.derive_encryption_key()?;
        let cipher = Aes256Gcm::new(&key_bytes.into());

        // 生成随机 nonce (12 字节)
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = serde_json::to_vec(details)?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| ServiceError::Other(format!("encryption failed: {}", e)))?;

        // 拼接 nonce + ciphertext 并 base64 编码
        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(general_purpose::STANDARD.encode(result))
    }

    /// 解密银行信息 JSON
    pub fn open_bank_details(&self, encrypted: &str) -> Result<serde_json::Value> {
        let data = general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|e| ServiceError::Other(format!("invalid base64: {}", e)))?;

        if data.len() < 12 {
            return Err(ServiceError::Other("invalid encrypted data".into()));
        }
        let (nonce, ciphertext) = data.split_at(12);

        let key_bytes = self.derive_encryption_key()?;
        let cipher = Aes256Gcm::new(&key_bytes.into());

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| ServiceError::Other(format!("decryption failed: {}", e)))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// 更新用户的银行信息密文
    #[instrument(skip(self, details))]
    pub async fn set_bank_details(
        &self,
        id: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<User> {
        let mut user = self.get_user(id).await?;
        user.bank_enc = match details {
            Some(value) => Some(self.seal_bank_details(value)?),
            None => None,
        };
        user.updated_at = Some(Utc::now());
        self.persist_user(&user)?;
        info!(user_id = %id, "bank details updated");
        Ok(user)
    }
}

/// 遮蔽账号，仅保留末四位
pub fn mask_account_number(value: &str) -> String {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() <= 4 {
        return digits;
    }
    let masked = "*".repeat(digits.len() - 4);
    format!("{}{}", masked, &digits[digits.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn seal_open_roundtrip() {
        let dir = TempDir::new().unwrap();
        let users = UserManager::new(dir.path(), "jwt".into())
            .with_encryption_key(Some("bank-key".into()));

        let details = json!({ "bank": "KBank", "account": "123-4-56789-0" });
        let sealed = users.seal_bank_details(&details).unwrap();
        assert_ne!(sealed, details.to_string());
        assert_eq!(users.open_bank_details(&sealed).unwrap(), details);
    }

    #[test]
    fn wrong_key_fails_closed() {
        let dir = TempDir::new().unwrap();
        let sealer = UserManager::new(dir.path(), "jwt".into())
            .with_encryption_key(Some("bank-key".into()));
        let opener = UserManager::new(dir.path(), "jwt".into())
            .with_encryption_key(Some("other-key".into()));

        let sealed = sealer.seal_bank_details(&serde_json::json!({"a": 1})).unwrap();
        assert!(opener.open_bank_details(&sealed).is_err());
    }

    #[test]
    fn missing_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let users = UserManager::new(dir.path(), "jwt".into());
        assert!(users.seal_bank_details(&serde_json::json!({})).is_err());
    }

    #[test]
    fn mask_keeps_last_four() {
        assert_eq!(mask_account_number("123 456 7890"), "******7890");
        assert_eq!(mask_account_number("123"), "123");
        assert_eq!(mask_account_number(""), "");
    }
}
