//! Error types for the fitting-room core.

use thiserror::Error;

/// Result type alias for studio operations
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors surfaced by the session, registries, catalog and composition boundary.
#[derive(Error, Debug)]
pub enum StudioError {
    /// Empty required field, non-positive measurement or unknown enum label.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A composition backend failed; the last known good avatar image is kept.
    #[error("Composition failed: {0}")]
    Composition(String),

    /// Another mutating operation is already in flight for this session.
    #[error("Operation already in progress: {0}")]
    Busy(String),

    #[error("No avatar has been created yet")]
    NoAvatar,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl StudioError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        StudioError::Validation(msg.into())
    }
}

/// Failures of the key-value persistence adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backing store disabled, unreadable or otherwise unreachable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded: write needs {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Raw bytes under a key are not UTF-8 text.
    #[error("Stored value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

impl From<sled::Error> for StudioError {
    fn from(err: sled::Error) -> Self {
        StudioError::Storage(err.into())
    }
}
