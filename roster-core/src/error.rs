//! Error classification shared by every module.
//!
//! Each module defines its own `thiserror` enum. They all map onto
//! [`ErrorKind`] so the UI layer can branch on the failure class without
//! matching on message strings.

/// Broad classification of a failure surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed arguments (empty login or invitation fields).
    Input,
    /// The backend rejected credentials or the session token.
    Auth,
    /// One or more member record fields violated a rule.
    Validation,
    /// The targeted record does not exist.
    NotFound,
    /// The backend was unreachable, timed out, or answered unexpectedly.
    Transport,
    /// The device credential store failed.
    Storage,
}

impl ErrorKind {
    /// Returns a stable lowercase name for the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
