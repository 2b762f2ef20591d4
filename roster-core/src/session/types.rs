//! Session data types.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Role of an authenticated representative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Nation-wide representative.
    National,
    /// Representative of a single region.
    Regional,
}

impl Role {
    /// Converts to the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::National => "NATIONAL",
            Self::Regional => "REGIONAL",
        }
    }
}

/// The authenticated representative.
///
/// Produced by the backend on login or token verification and replaced
/// wholesale on every successful auth operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Role,
    /// Region for regional representatives.
    #[serde(default)]
    pub region: Option<String>,
}

/// Opaque session credential.
///
/// The token string is zeroized on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the raw token.
    ///
    /// Callers must not log or persist the returned value outside the
    /// credential store.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session. Initial phase.
    #[default]
    Unauthenticated,
    /// A persisted token is being checked at startup.
    Verifying,
    /// A verified token and identity are held.
    Authenticated,
}

/// The value broadcast to observers on every transition.
///
/// Carries the identity only; the token never leaves the session manager
/// through this channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
}

impl SessionSnapshot {
    pub(crate) const fn unauthenticated() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            identity: None,
        }
    }

    pub(crate) const fn verifying() -> Self {
        Self {
            phase: SessionPhase::Verifying,
            identity: None,
        }
    }

    pub(crate) const fn authenticated(identity: Identity) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            identity: Some(identity),
        }
    }

    /// Returns `true` when an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated)
    }
}
