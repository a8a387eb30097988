use std::fmt;

use thiserror::Error;

/// HTTP status TestRail returns while the account is in a maintenance window.
pub const MAINTENANCE_STATUS: u16 = 409;
/// HTTP status TestRail returns when the API rate limit is hit.
pub const RATE_LIMITED_STATUS: u16 = 429;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Security error: {0}")]
    SecurityError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Remote store error: {0}")]
    Remote(RemoteError),
    #[error("Consistency error: {0}")]
    Consistency(String),
    #[error("Request `{operation}` failed after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::Remote(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A failed call against the remote store.
///
/// `status_code` is absent when the request never produced a response
/// (connection refused, TLS failure, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status_code: Option<u16>,
    pub retry_after_seconds: Option<u64>,
    pub message: String,
}

/// The transient conditions the request executor knows how to wait out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientFailure {
    Maintenance,
    RateLimited { retry_after_seconds: u64 },
}

impl RemoteError {
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            retry_after_seconds: None,
            message: message.into(),
        }
    }

    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        self.retry_after_seconds = seconds;
        self
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::new(Some(MAINTENANCE_STATUS), message)
    }

    pub fn rate_limited(retry_after_seconds: u64) -> Self {
        Self::new(
            Some(RATE_LIMITED_STATUS),
            format!("API rate limit reached. Retry after {retry_after_seconds} seconds."),
        )
        .with_retry_after(Some(retry_after_seconds))
    }

    /// A 429 without a usable wait duration is not retried.
    pub fn transient(&self) -> Option<TransientFailure> {
        match self.status_code {
            Some(MAINTENANCE_STATUS) => Some(TransientFailure::Maintenance),
            Some(RATE_LIMITED_STATUS) => self
                .retry_after_seconds
                .map(|retry_after_seconds| TransientFailure::RateLimited { retry_after_seconds }),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "HTTP {}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert_eq!(
            RemoteError::maintenance("down").transient(),
            Some(TransientFailure::Maintenance)
        );
        assert_eq!(
            RemoteError::rate_limited(7).transient(),
            Some(TransientFailure::RateLimited {
                retry_after_seconds: 7
            })
        );
        assert_eq!(RemoteError::new(Some(429), "no hint").transient(), None);
        assert_eq!(RemoteError::new(Some(400), "bad field").transient(), None);
        assert_eq!(RemoteError::new(None, "connection reset").transient(), None);
    }

    #[test]
    fn test_remote_error_display() {
        let err = AppError::from(RemoteError::new(Some(403), "No access"));
        assert_eq!(err.to_string(), "Remote store error: HTTP 403: No access");
    }
}
