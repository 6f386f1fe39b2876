//! Error taxonomy shared by generation, silo and persistence code.

use thiserror::Error;

/// Errors surfaced to callers (HTTP handlers, CLI, cron).
///
/// Generation failures are never retried; the message is handed back to
/// the caller unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CmsError {
    #[error("Generation API key is not configured")]
    CredentialMissing,

    #[error("Generation API key was rejected by the provider")]
    InvalidCredential,

    #[error("No generation model available for this key")]
    NoModelAvailable,

    #[error("Malformed response from generation provider: {0}")]
    MalformedResponse(String),

    #[error("Generation provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CmsError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<rusqlite::Error> for CmsError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CmsError::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => CmsError::Storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(err: serde_json::Error) -> Self {
        CmsError::Storage(format!("serialization: {}", err))
    }
}
