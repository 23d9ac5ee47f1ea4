//! Error types for Vista Core
//!
//! Engine failures never surface here: they are translated into
//! [`ErrorInfo`](crate::types::ErrorInfo) on the published snapshot. This
//! enum only covers misuse of the session itself.

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Session errors
    #[error("Playback session has been released")]
    SessionClosed,

    #[error("Session task failed: {0}")]
    TaskFailed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns the error code for logs and UI
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::SessionClosed => "SESSION_CLOSED",
            Error::TaskFailed(_) => "TASK_FAILED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Config(_) => "CONFIG_PARSE",
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskFailed(err.to_string())
    }
}
