use thiserror::Error;

/// Common result type for core operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("no active reset code")]
    NoActiveCode,
    #[error("reset code expired")]
    CodeExpired,
    #[error("reset code mismatch")]
    CodeMismatch,
    #[error("too many attempts, request a new code")]
    TooManyAttempts,
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("other error: {0}")]
    Other(String),
}
