//! Error types for session operations.

use thiserror::Error;

use crate::backend::BackendError;
use crate::error::ErrorKind;

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Required login or invitation fields were empty.
    #[error("{0}")]
    Input(String),

    /// The backend rejected the request; its message is passed through.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The credential store failed.
    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl SessionError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Backend(err) => err.kind(),
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
