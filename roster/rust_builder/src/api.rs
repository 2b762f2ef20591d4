//! API bridging layer that exposes roster-core functionality.
//!
//! Member records cross the bridge as JSON strings in the wire shape of the
//! member service. Errors cross as their display message.

use std::sync::Arc;

use flutter_rust_bridge::frb;
use log::warn;
use roster_core::member::{self, MemberDraft, MemberId};
use roster_core::session::{CredentialStore, Identity, SessionPhase, SessionSnapshot};
use roster_core::CoreConfig;
use tokio::sync::watch;

use crate::keyring::{install_platform_store, KeyringCredentialStore};

/// Called once by the generated bindings when the library loads.
#[frb(init)]
pub fn init_app() {
    flutter_rust_bridge::setup_default_user_utils();
    if let Err(e) = install_platform_store() {
        warn!("{e}");
    }
}

/// Authenticated representative (FFI mirror of [`Identity`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInfo {
    pub id: String,
    pub email: String,
    /// `NATIONAL` or `REGIONAL`.
    pub role: String,
    pub region: Option<String>,
}

impl From<Identity> for IdentityInfo {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            role: identity.role.as_str().to_string(),
            region: identity.region,
        }
    }
}

/// Session state broadcast to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// `unauthenticated`, `verifying` or `authenticated`.
    pub phase: String,
    pub identity: Option<IdentityInfo>,
}

impl From<SessionSnapshot> for SessionState {
    fn from(snapshot: SessionSnapshot) -> Self {
        let phase = match snapshot.phase {
            SessionPhase::Unauthenticated => "unauthenticated",
            SessionPhase::Verifying => "verifying",
            SessionPhase::Authenticated => "authenticated",
        };
        Self {
            phase: phase.to_string(),
            identity: snapshot.identity.map(IdentityInfo::from),
        }
    }
}

/// One rule violation (FFI mirror of [`member::FieldError`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: String,
    pub message: String,
}

/// Core interface for Roster (wrapper around roster-core).
#[derive(Debug, Clone)]
#[frb(opaque)]
pub struct RosterCore {
    inner: roster_core::RosterCore,
}

impl RosterCore {
    /// Creates a core for the member service at `api_base_url`, keeping the
    /// session token in the platform keyring.
    pub fn new(api_base_url: String) -> Result<Self, String> {
        let store: Arc<dyn CredentialStore> = Arc::new(KeyringCredentialStore::new());
        Self::with_store(&CoreConfig::new(api_base_url), store)
    }

    fn with_store(config: &CoreConfig, store: Arc<dyn CredentialStore>) -> Result<Self, String> {
        roster_core::RosterCore::new(config, store)
            .map(|inner| Self { inner })
            .map_err(|e| e.to_string())
    }

    /// Restores a persisted session. Never fails; the result says where it
    /// ended up.
    pub async fn bootstrap(&self) -> SessionState {
        self.inner.session().bootstrap().await.into()
    }

    /// Logs in and returns the authenticated identity.
    pub async fn login(&self, email: String, password: String) -> Result<IdentityInfo, String> {
        self.inner
            .session()
            .login(&email, &password)
            .await
            .map(IdentityInfo::from)
            .map_err(|e| e.to_string())
    }

    /// Redeems an invitation. Does not log in.
    pub async fn redeem_invite(
        &self,
        token: String,
        email: String,
        password: String,
    ) -> Result<(), String> {
        self.inner
            .session()
            .redeem_invite(&token, &email, &password)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn logout(&self) -> Result<(), String> {
        self.inner
            .session()
            .logout()
            .await
            .map_err(|e| e.to_string())
    }

    #[frb(sync)]
    #[must_use]
    pub fn current_identity(&self) -> Option<IdentityInfo> {
        self.inner.session().identity().map(IdentityInfo::from)
    }

    #[frb(sync)]
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.inner.session().snapshot().into()
    }

    /// Subscribes to session transitions.
    #[frb(sync)]
    #[must_use]
    pub fn watch_identity(&self) -> IdentityWatcher {
        IdentityWatcher {
            receiver: self.inner.session().subscribe(),
        }
    }

    /// Returns every visible member as a JSON array.
    pub async fn list_members(&self) -> Result<String, String> {
        let members = self.inner.list_members().await.map_err(|e| e.to_string())?;
        serde_json::to_string(&members).map_err(|e| e.to_string())
    }

    /// Returns one member as JSON, or `None` for an unknown id.
    pub async fn get_member(&self, id: String) -> Result<Option<String>, String> {
        let member = self
            .inner
            .get_member(&MemberId::new(id))
            .await
            .map_err(|e| e.to_string())?;
        member
            .map(|m| serde_json::to_string(&m))
            .transpose()
            .map_err(|e| e.to_string())
    }

    /// Validates and creates a member from a JSON draft. Returns the stored
    /// record as JSON.
    pub async fn create_member(&self, draft_json: String) -> Result<String, String> {
        let draft = parse_draft(&draft_json)?;
        let record = self
            .inner
            .create_member(&draft)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&record).map_err(|e| e.to_string())
    }

    /// Validates and applies the fields present in a JSON draft. Returns the
    /// updated record as JSON.
    pub async fn update_member(&self, id: String, draft_json: String) -> Result<String, String> {
        let draft = parse_draft(&draft_json)?;
        let record = self
            .inner
            .update_member(&MemberId::new(id), &draft)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&record).map_err(|e| e.to_string())
    }
}

/// Receives session transitions.
#[frb(opaque)]
pub struct IdentityWatcher {
    receiver: watch::Receiver<SessionSnapshot>,
}

impl IdentityWatcher {
    /// Waits for the next transition and returns the new state.
    ///
    /// Returns `None` once the core has been dropped.
    pub async fn next(&mut self) -> Option<SessionState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone().into())
    }
}

/// Normalizes national-number keystrokes into `MOR` plus up to four digits.
#[frb(sync)]
#[must_use]
pub fn canonicalize_national_number(raw: String) -> String {
    member::canonicalize_national_number(&raw)
}

/// Checks a complete JSON draft and returns every rule it breaks.
///
/// An empty list means the draft is valid.
#[frb(sync)]
pub fn validate_member_json(draft_json: String) -> Result<Vec<FieldProblem>, String> {
    let draft = parse_draft(&draft_json)?;
    Ok(match member::validate(&draft) {
        Ok(_) => Vec::new(),
        Err(errors) => errors
            .into_inner()
            .into_iter()
            .map(|e| FieldProblem {
                field: e.field.to_string(),
                message: e.message,
            })
            .collect(),
    })
}

fn parse_draft(json: &str) -> Result<MemberDraft, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid member data: {e}"))
}
