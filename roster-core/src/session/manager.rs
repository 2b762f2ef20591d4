//! Session lifecycle.
//!
//! This module provides the [`SessionManager`], which owns the session token
//! and the authenticated [`Identity`]. It is constructed once at startup and
//! shared by handle; observers subscribe to a [`watch`] channel instead of
//! looking the session up ambiently.
//!
//! # State machine
//!
//! ```text
//!                 bootstrap (token stored)
//! Unauthenticated ───────────────────────▶ Verifying
//!       ▲   │                                  │
//!       │   │ login ok                 ok      │ rejected
//!       │   ▼                                  │ (token erased)
//!       │ Authenticated ◀──────────────────────┘
//!       │       │
//!       └───────┘ logout
//! ```
//!
//! Operations are not guarded against running concurrently with each other;
//! callers serialize them (a UI disables its controls while one is pending).

use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};
use tokio::sync::watch;
use zeroize::Zeroize;

use super::error::{Result, SessionError};
use super::storage::{Accessibility, CredentialStore, SESSION_TOKEN_KEY};
use super::types::{Identity, SessionPhase, SessionSnapshot, SessionToken};
use crate::backend::{AuthResponse, Backend, BackendError};

const CREDENTIALS_REQUIRED: &str = "Email and password required";
const INVITE_TOKEN_REQUIRED: &str = "Token required";

/// Owns the session token and the authenticated identity.
///
/// The token and the identity are always set and cleared together. Every
/// transition is broadcast as a [`SessionSnapshot`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use roster_core::session::SessionManager;
///
/// let manager = Arc::new(SessionManager::new(backend, store));
/// manager.bootstrap().await;
///
/// let mut updates = manager.subscribe();
/// manager.login("rep@example.com", "secret").await?;
/// assert!(updates.borrow_and_update().is_authenticated());
/// ```
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    store: Arc<dyn CredentialStore>,
    token: RwLock<Option<SessionToken>>,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Creates a manager in the Unauthenticated phase.
    ///
    /// Nothing is read from the store until [`bootstrap`](Self::bootstrap).
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn CredentialStore>) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::unauthenticated());
        Self {
            backend,
            store,
            token: RwLock::new(None),
            updates,
        }
    }

    // ==================== Observation ====================

    /// Subscribes to session transitions.
    ///
    /// The receiver starts with the current snapshot marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.updates.borrow().clone()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.updates.borrow().phase
    }

    /// Returns the authenticated identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.updates.borrow().identity.clone()
    }

    /// Returns `true` when a verified session is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.updates.borrow().is_authenticated()
    }

    /// Returns the session token for authenticated backend calls.
    pub(crate) fn token(&self) -> Option<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ==================== Lifecycle ====================

    /// Restores a persisted session at startup.
    ///
    /// With no stored token the manager stays Unauthenticated. A stored token
    /// moves it to Verifying while the backend checks it; success ends in
    /// Authenticated. Any failure (unreadable store, malformed token, backend
    /// rejection, network error) erases the stored token and ends in
    /// Unauthenticated. Failures are logged, never returned, and never
    /// retried.
    ///
    /// Does nothing unless the manager is Unauthenticated.
    pub async fn bootstrap(&self) -> SessionSnapshot {
        if self.phase() != SessionPhase::Unauthenticated {
            return self.snapshot();
        }

        let stored = match self.store.retrieve(SESSION_TOKEN_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Could not read persisted session, discarding it: {e}");
                self.erase_persisted();
                return self.snapshot();
            }
        };

        let Some(bytes) = stored else {
            debug!("No persisted session");
            return self.snapshot();
        };

        let token = match String::from_utf8(bytes) {
            Ok(raw) if !raw.is_empty() => SessionToken::new(raw),
            Ok(_) => {
                warn!("Persisted session token is empty, discarding it");
                self.erase_persisted();
                return self.snapshot();
            }
            Err(e) => {
                e.into_bytes().zeroize();
                warn!("Persisted session token is not UTF-8, discarding it");
                self.erase_persisted();
                return self.snapshot();
            }
        };

        self.commit(None, SessionSnapshot::verifying());

        match self.backend.verify_identity(&token).await {
            Ok(identity) => {
                debug!("Persisted session verified");
                self.commit(Some(token), SessionSnapshot::authenticated(identity));
            }
            Err(e) => {
                warn!("Persisted session rejected ({}), discarding it: {e}", e.kind());
                self.erase_persisted();
                self.commit(None, SessionSnapshot::unauthenticated());
            }
        }

        self.snapshot()
    }

    /// Authenticates with email and password.
    ///
    /// On success the token is persisted with device-local accessibility and
    /// the manager becomes Authenticated. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Input`] if the email is blank or the password is empty
    /// - [`SessionError::Backend`] if the backend rejects the request
    /// - [`SessionError::Storage`] if the token cannot be persisted
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Input(CREDENTIALS_REQUIRED.to_string()));
        }

        let AuthResponse { token, user } = self.backend.authenticate(email, password).await?;
        if token.is_empty() {
            return Err(BackendError::InvalidResponse("empty session token".to_string()).into());
        }

        self.store.store(
            SESSION_TOKEN_KEY,
            token.expose().as_bytes(),
            Accessibility::WhenUnlockedThisDeviceOnly,
        )?;

        debug!("Logged in as {:?}", user.role);
        self.commit(Some(token), SessionSnapshot::authenticated(user.clone()));
        Ok(user)
    }

    /// Redeems an invitation.
    ///
    /// This does not log in: a separate [`login`](Self::login) is required
    /// afterwards. Session state is never touched.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Input`] if the invitation token or email is blank, or
    ///   the password is empty
    /// - [`SessionError::Backend`] with the backend's message unchanged
    pub async fn redeem_invite(&self, invite_token: &str, email: &str, password: &str) -> Result<()> {
        if invite_token.trim().is_empty() {
            return Err(SessionError::Input(INVITE_TOKEN_REQUIRED.to_string()));
        }
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::Input(CREDENTIALS_REQUIRED.to_string()));
        }

        self.backend
            .redeem_invite(invite_token, email, password)
            .await?;
        debug!("Invitation redeemed");
        Ok(())
    }

    /// Ends the session.
    ///
    /// Clears the in-memory session and erases the stored token, whatever
    /// the current phase. Calling it again is a no-op success.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the stored token could not be
    /// erased. The in-memory session is cleared regardless.
    #[allow(clippy::unused_async)] // Awaitable like the other session operations.
    pub async fn logout(&self) -> Result<()> {
        self.commit(None, SessionSnapshot::unauthenticated());
        self.store.delete(SESSION_TOKEN_KEY)?;
        debug!("Logged out");
        Ok(())
    }

    // ==================== Internals ====================

    /// Replaces token and snapshot together.
    ///
    /// The token lock is held while the snapshot is published so a reader
    /// never sees one without the other.
    fn commit(&self, token: Option<SessionToken>, snapshot: SessionSnapshot) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token;
        self.updates.send_replace(snapshot);
    }

    fn erase_persisted(&self) {
        if let Err(e) = self.store.delete(SESSION_TOKEN_KEY) {
            warn!("Could not erase persisted session: {e}");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &*self.updates.borrow())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}
