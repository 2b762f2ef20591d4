//! Member service contract.
//!
//! The session manager and the member operations talk to the service only
//! through the [`Backend`] trait. Two implementations ship with the core:
//!
//! ```text
//! Backend (trait)
//!     ├── HttpBackend  (reqwest, production service)
//!     └── LocalBackend (in-process stand-in, SQLite member table)
//! ```

mod error;
mod http;
mod local;
mod storage;

use async_trait::async_trait;
use serde::Deserialize;

pub use error::{BackendError, BackendResult};
pub use http::HttpBackend;
pub use local::{LocalBackend, LOCAL_TOKEN_PREFIX};
pub use storage::MemberStorage;

use crate::member::{MemberFields, MemberId, MemberPatch, MemberRecord};
use crate::session::{Identity, SessionToken};

/// Successful authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Session token to persist.
    pub token: SessionToken,
    /// The authenticated representative.
    pub user: Identity,
}

/// Operations the core needs from the member service.
///
/// Member operations carry the bearer token of the current session.
/// Implementations own their request timeout; the core never adds one.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges credentials for a session token and identity.
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<AuthResponse>;

    /// Redeems an invitation, creating the account. Does not log in.
    async fn redeem_invite(
        &self,
        invite_token: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<()>;

    /// Looks up the identity behind a session token.
    ///
    /// Rejects invalid or expired tokens.
    async fn verify_identity(&self, token: &SessionToken) -> BackendResult<Identity>;

    /// Lists every member visible to the session.
    async fn list_members(&self, token: &SessionToken) -> BackendResult<Vec<MemberRecord>>;

    /// Fetches one member. Returns `Ok(None)` if the id is unknown.
    async fn get_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
    ) -> BackendResult<Option<MemberRecord>>;

    /// Creates a member; the service assigns the id.
    async fn create_member(
        &self,
        token: &SessionToken,
        fields: &MemberFields,
    ) -> BackendResult<MemberRecord>;

    /// Merges `patch` into the stored member.
    ///
    /// Returns [`BackendError::NotFound`] if the id is unknown.
    async fn update_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
        patch: &MemberPatch,
    ) -> BackendResult<MemberRecord>;
}
