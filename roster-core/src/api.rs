//! Application entry point.
//!
//! [`RosterCore`] wires the session manager and the member service together.
//! It is built once at startup and handed to every screen that needs it.

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::backend::{Backend, BackendError, HttpBackend};
use crate::config::CoreConfig;
use crate::error::ErrorKind;
use crate::member::{self, MemberDraft, MemberId, MemberRecord, ValidationErrors};
use crate::session::{CredentialStore, SessionManager, SessionToken};

/// Errors from member operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemberError {
    /// No authenticated session is held.
    #[error("Not signed in")]
    Unauthenticated,

    /// The candidate record broke one or more field rules.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The member service rejected or failed the request.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl MemberError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Auth,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Backend(e) => e.kind(),
        }
    }
}

/// Core interface for Roster.
///
/// Holds the shared [`SessionManager`] and runs member operations on behalf
/// of the authenticated representative.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use roster_core::backend::LocalBackend;
/// use roster_core::session::MemoryCredentialStore;
/// use roster_core::RosterCore;
///
/// let backend = Arc::new(LocalBackend::in_memory().unwrap());
/// let core = RosterCore::with_backend(backend, Arc::new(MemoryCredentialStore::new()));
/// assert!(!core.session().is_authenticated());
/// ```
#[derive(Clone)]
pub struct RosterCore {
    backend: Arc<dyn Backend>,
    session: Arc<SessionManager>,
}

impl RosterCore {
    /// Creates a core talking to the member service over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Input`] if the configuration is invalid, or a
    /// transport error if the HTTP client cannot be built.
    pub fn new(config: &CoreConfig, store: Arc<dyn CredentialStore>) -> Result<Self, BackendError> {
        config
            .validate()
            .map_err(|e| BackendError::Input(e.to_string()))?;
        let backend = HttpBackend::new(config)?;
        Ok(Self::with_backend(Arc::new(backend), store))
    }

    /// Creates a core on top of any backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn Backend>, store: Arc<dyn CredentialStore>) -> Self {
        let session = Arc::new(SessionManager::new(Arc::clone(&backend), store));
        Self { backend, session }
    }

    /// Returns the shared session manager.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ==================== Members ====================

    /// Lists every member visible to the current representative.
    ///
    /// # Errors
    ///
    /// Returns [`MemberError::Unauthenticated`] without a session, or the
    /// backend error.
    pub async fn list_members(&self) -> Result<Vec<MemberRecord>, MemberError> {
        let token = self.require_token()?;
        Ok(self.backend.list_members(&token).await?)
    }

    /// Fetches one member. `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`MemberError::Unauthenticated`] without a session, or the
    /// backend error.
    pub async fn get_member(&self, id: &MemberId) -> Result<Option<MemberRecord>, MemberError> {
        let token = self.require_token()?;
        Ok(self.backend.get_member(&token, id).await?)
    }

    /// Validates a complete draft and creates the member.
    ///
    /// Nothing is sent when validation fails.
    ///
    /// # Errors
    ///
    /// - [`MemberError::Unauthenticated`] without a session
    /// - [`MemberError::Validation`] with every broken rule
    /// - [`MemberError::Backend`] if the service rejects the record
    pub async fn create_member(&self, draft: &MemberDraft) -> Result<MemberRecord, MemberError> {
        let token = self.require_token()?;
        let fields = member::validate(draft)?;
        let record = self.backend.create_member(&token, &fields).await?;
        debug!("Created member {}", record.id);
        Ok(record)
    }

    /// Validates the fields present in `draft` and applies them to a member.
    ///
    /// # Errors
    ///
    /// - [`MemberError::Unauthenticated`] without a session
    /// - [`MemberError::Validation`] with every broken rule
    /// - [`MemberError::Backend`] with [`BackendError::NotFound`] for an
    ///   unknown id, or any other service error
    pub async fn update_member(
        &self,
        id: &MemberId,
        draft: &MemberDraft,
    ) -> Result<MemberRecord, MemberError> {
        let token = self.require_token()?;
        let patch = member::validate_patch(draft)?;
        let record = self.backend.update_member(&token, id, &patch).await?;
        debug!("Updated member {id}");
        Ok(record)
    }

    fn require_token(&self) -> Result<SessionToken, MemberError> {
        if !self.session.is_authenticated() {
            return Err(MemberError::Unauthenticated);
        }
        self.session.token().ok_or(MemberError::Unauthenticated)
    }
}

impl std::fmt::Debug for RosterCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterCore")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
