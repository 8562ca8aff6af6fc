//! Error types for the decision engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in engine operations.
#[derive(Error, Debug)]
pub enum Error {
    // Request errors
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error("request already registered: {0}")]
    DuplicateRequest(String),

    #[error("request withdrawn: {0}")]
    RequestWithdrawn(String),

    // Notification errors
    #[error("notification delivery failed: {0}")]
    NotificationFailed(String),

    // Audit errors
    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),

    #[error("audit chain integrity violated at index {0}")]
    ChainIntegrityViolated(usize),

    // Serialization errors
    #[error("serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
