//! Error types for backend operations.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors returned by a [`Backend`](super::Backend).
///
/// Messages come from the service when it provides one, so they are shown
/// to the user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request arguments were rejected.
    #[error("{0}")]
    Input(String),

    /// Credentials or token were rejected.
    #[error("{0}")]
    Auth(String),

    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The service could not be reached or did not answer in time.
    #[error("Network error: {0}")]
    Transport(String),

    /// The service failed while handling the request.
    #[error("Server error: {0}")]
    Server(String),

    /// The service answered with something that could not be understood.
    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transport(_) | Self::Server(_) | Self::InvalidResponse(_) => ErrorKind::Transport,
        }
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_messages_are_shown_unchanged() {
        let err = BackendError::Auth("Invalid email or password".to_string());
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn transport_error_display() {
        let err = BackendError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn invalid_response_is_transport_kind() {
        let err = BackendError::InvalidResponse("missing token".to_string());
        assert_eq!(
            err.to_string(),
            "Unexpected response from server: missing token"
        );
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn server_error_display() {
        let err = BackendError::Server("database is locked".to_string());
        assert_eq!(err.to_string(), "Server error: database is locked");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn not_found_kind() {
        let err = BackendError::NotFound("Member not found: 9".to_string());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
