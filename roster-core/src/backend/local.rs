//! In-process stand-in for the member service.
//!
//! [`LocalBackend`] implements the full [`Backend`] contract without a
//! network: accounts, one-shot invitations and sessions live in memory and
//! members live in `SQLite`. It backs development builds and tests.
//!
//! # Security
//!
//! - Passwords are kept only as salted SHA-256 digests
//! - Digests are compared in constant time
//! - Session tokens carry the recognized prefix [`LOCAL_TOKEN_PREFIX`] and
//!   anything else is rejected before lookup
//!
//! Sessions live until [`LocalBackend::revoke`] or process exit. There is no
//! expiry and nothing prunes them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::error::{BackendError, BackendResult};
use super::storage::MemberStorage;
use super::{AuthResponse, Backend};
use crate::member::{MemberFields, MemberId, MemberPatch, MemberRecord};
use crate::session::{Identity, Role, SessionToken};

/// Prefix of every session token issued by the local backend.
pub const LOCAL_TOKEN_PREFIX: &str = "dev-token-";

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_TOKEN: &str = "Invalid token";
const INVALID_INVITE: &str = "Invalid or expired invitation";

/// Number of random bytes in tokens and salts.
const RANDOM_BYTES: usize = 16;

struct Account {
    identity: Identity,
    salt: [u8; RANDOM_BYTES],
    digest: [u8; 32],
}

struct Invite {
    role: Role,
    region: Option<String>,
}

#[derive(Default)]
struct Directory {
    /// Accounts keyed by lowercase email.
    accounts: HashMap<String, Account>,
    invites: HashMap<String, Invite>,
    /// Session token to account key.
    sessions: HashMap<String, String>,
    next_account_id: u64,
}

/// In-process implementation of [`Backend`].
///
/// # Example
///
/// ```
/// use roster_core::backend::LocalBackend;
/// use roster_core::session::Role;
///
/// let backend = LocalBackend::in_memory().unwrap();
/// backend
///     .add_account("rep@example.com", "secret", Role::Regional, Some("1"))
///     .unwrap();
/// let invite = backend.issue_invite(Role::National, None).unwrap();
/// assert!(!invite.is_empty());
/// ```
pub struct LocalBackend {
    directory: RwLock<Directory>,
    members: MemberStorage,
}

impl LocalBackend {
    /// Creates a backend whose members live in an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> BackendResult<Self> {
        Ok(Self::with_storage(MemberStorage::in_memory()?))
    }

    /// Creates a backend whose members persist in the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: &Path) -> BackendResult<Self> {
        Ok(Self::with_storage(MemberStorage::new(path)?))
    }

    fn with_storage(members: MemberStorage) -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            members,
        }
    }

    /// Registers an account directly.
    ///
    /// Returns the new account's identity.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Input`] if a field is empty or the email is
    /// already registered.
    pub fn add_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        region: Option<&str>,
    ) -> BackendResult<Identity> {
        let mut directory = self.write_directory()?;
        Self::register(&mut directory, email, password, role, region.map(str::to_string))
    }

    /// Issues a one-shot invitation granting `role` and `region`.
    ///
    /// Returns the invitation token to hand to the invitee.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lock is poisoned.
    pub fn issue_invite(&self, role: Role, region: Option<&str>) -> BackendResult<String> {
        let token = hex::encode(random_bytes());
        let mut directory = self.write_directory()?;
        directory.invites.insert(
            token.clone(),
            Invite {
                role,
                region: region.map(str::to_string),
            },
        );
        Ok(token)
    }

    /// Ends a session server-side so its token no longer verifies.
    ///
    /// Returns `true` if the token was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lock is poisoned.
    pub fn revoke(&self, token: &SessionToken) -> BackendResult<bool> {
        let mut directory = self.write_directory()?;
        Ok(directory.sessions.remove(token.expose()).is_some())
    }

    fn write_directory(&self) -> BackendResult<std::sync::RwLockWriteGuard<'_, Directory>> {
        self.directory
            .write()
            .map_err(|e| BackendError::Server(format!("Failed to acquire directory lock: {e}")))
    }

    fn read_directory(&self) -> BackendResult<std::sync::RwLockReadGuard<'_, Directory>> {
        self.directory
            .read()
            .map_err(|e| BackendError::Server(format!("Failed to acquire directory lock: {e}")))
    }

    fn register(
        directory: &mut Directory,
        email: &str,
        password: &str,
        role: Role,
        region: Option<String>,
    ) -> BackendResult<Identity> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(BackendError::Input("Email and password required".to_string()));
        }

        let key = email.to_lowercase();
        if directory.accounts.contains_key(&key) {
            return Err(BackendError::Input(format!(
                "An account already exists for {email}"
            )));
        }

        directory.next_account_id += 1;
        let identity = Identity {
            id: directory.next_account_id.to_string(),
            email: email.to_string(),
            role,
            region,
        };
        let salt = random_bytes();
        let digest = password_digest(&salt, password);
        directory.accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                salt,
                digest,
            },
        );
        Ok(identity)
    }

    /// Resolves a session token to its identity.
    fn authorize(&self, token: &SessionToken) -> BackendResult<Identity> {
        let raw = token.expose();
        if !raw.starts_with(LOCAL_TOKEN_PREFIX) {
            return Err(BackendError::Auth(INVALID_TOKEN.to_string()));
        }

        let directory = self.read_directory()?;
        directory
            .sessions
            .get(raw)
            .and_then(|key| directory.accounts.get(key))
            .map(|account| account.identity.clone())
            .ok_or_else(|| BackendError::Auth(INVALID_TOKEN.to_string()))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<AuthResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(BackendError::Input("Email and password required".to_string()));
        }

        let key = email.trim().to_lowercase();
        let mut directory = self.write_directory()?;

        let identity = match directory.accounts.get(&key) {
            Some(account) => {
                let digest = password_digest(&account.salt, password);
                if bool::from(digest.ct_eq(&account.digest)) {
                    account.identity.clone()
                } else {
                    return Err(BackendError::Auth(INVALID_CREDENTIALS.to_string()));
                }
            }
            None => return Err(BackendError::Auth(INVALID_CREDENTIALS.to_string())),
        };

        let token = format!("{LOCAL_TOKEN_PREFIX}{}", hex::encode(random_bytes()));
        directory.sessions.insert(token.clone(), key);

        Ok(AuthResponse {
            token: SessionToken::new(token),
            user: identity,
        })
    }

    async fn redeem_invite(
        &self,
        invite_token: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<()> {
        if invite_token.is_empty() {
            return Err(BackendError::Input("Token required".to_string()));
        }

        let mut directory = self.write_directory()?;
        let invite = directory
            .invites
            .remove(invite_token)
            .ok_or_else(|| BackendError::Auth(INVALID_INVITE.to_string()))?;

        let Invite { role, region } = invite;
        match Self::register(&mut directory, email, password, role, region.clone()) {
            Ok(_) => Ok(()),
            Err(e) => {
                // Registration failed; the invitation stays redeemable.
                directory
                    .invites
                    .insert(invite_token.to_string(), Invite { role, region });
                Err(e)
            }
        }
    }

    async fn verify_identity(&self, token: &SessionToken) -> BackendResult<Identity> {
        self.authorize(token)
    }

    async fn list_members(&self, token: &SessionToken) -> BackendResult<Vec<MemberRecord>> {
        self.authorize(token)?;
        self.members.list_members()
    }

    async fn get_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
    ) -> BackendResult<Option<MemberRecord>> {
        self.authorize(token)?;
        self.members.get_member(id)
    }

    async fn create_member(
        &self,
        token: &SessionToken,
        fields: &MemberFields,
    ) -> BackendResult<MemberRecord> {
        self.authorize(token)?;
        self.members.insert_member(fields)
    }

    async fn update_member(
        &self,
        token: &SessionToken,
        id: &MemberId,
        patch: &MemberPatch,
    ) -> BackendResult<MemberRecord> {
        self.authorize(token)?;

        let not_found = || BackendError::NotFound(format!("Member not found: {id}"));
        let mut record = self.members.get_member(id)?.ok_or_else(not_found)?;
        patch.apply_to(&mut record.fields);

        if self.members.replace_member(id, &record.fields)? {
            Ok(record)
        } else {
            Err(not_found())
        }
    }
}

fn random_bytes() -> [u8; RANDOM_BYTES] {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn password_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{FamilySituation, Gender, SalaryType};

    fn fields() -> MemberFields {
        MemberFields {
            first_name: "Ali".to_string(),
            last_name: "Hassan".to_string(),
            date_of_birth: "1990-01-01".to_string(),
            gender: Gender::Male,
            national_number: "MOR0123".to_string(),
            jamaat: "Rabat".to_string(),
            family_situation: FamilySituation::Single,
            children_count: 0,
            children_over_15_count: 0,
            spouse_is_ahmadi: false,
            salary_mad: 3000.0,
            salary_type: SalaryType::Variable,
            monthly_tchanda: 50.0,
            is_mousi: false,
            is_active: true,
            jamaat_role: "Member".to_string(),
        }
    }

    fn backend_with_account() -> LocalBackend {
        let backend = LocalBackend::in_memory().unwrap();
        backend
            .add_account("Rep@Example.com", "pw", Role::Regional, Some("1"))
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn authenticate_issues_prefixed_token() {
        let backend = backend_with_account();
        let response = backend.authenticate("rep@example.com", "pw").await.unwrap();

        assert!(response.token.expose().starts_with(LOCAL_TOKEN_PREFIX));
        assert_eq!(response.user.email, "Rep@Example.com");
        assert_eq!(response.user.region.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password_and_unknown_email() {
        let backend = backend_with_account();

        let err = backend.authenticate("rep@example.com", "nope").await.unwrap_err();
        assert_eq!(err, BackendError::Auth(INVALID_CREDENTIALS.to_string()));

        let err = backend.authenticate("who@example.com", "pw").await.unwrap_err();
        assert_eq!(err, BackendError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    #[tokio::test]
    async fn authenticate_rejects_empty_fields() {
        let backend = backend_with_account();
        let err = backend.authenticate("", "pw").await.unwrap_err();
        assert_eq!(err, BackendError::Input("Email and password required".to_string()));
    }

    #[tokio::test]
    async fn verify_returns_login_identity() {
        let backend = backend_with_account();
        let response = backend.authenticate("rep@example.com", "pw").await.unwrap();

        let identity = backend.verify_identity(&response.token).await.unwrap();

        assert_eq!(identity, response.user);
    }

    #[tokio::test]
    async fn verify_rejects_unprefixed_and_unknown_tokens() {
        let backend = backend_with_account();
        for raw in ["abc", "", "token-dev-1", "dev-token-unknown"] {
            let err = backend
                .verify_identity(&SessionToken::new(raw.to_string()))
                .await
                .unwrap_err();
            assert_eq!(err, BackendError::Auth(INVALID_TOKEN.to_string()));
        }
    }

    #[tokio::test]
    async fn revoked_token_no_longer_verifies() {
        let backend = backend_with_account();
        let response = backend.authenticate("rep@example.com", "pw").await.unwrap();

        assert!(backend.revoke(&response.token).unwrap());

        assert!(backend.verify_identity(&response.token).await.is_err());
    }

    #[tokio::test]
    async fn invite_is_single_use() {
        let backend = LocalBackend::in_memory().unwrap();
        let invite = backend.issue_invite(Role::Regional, Some("3")).unwrap();

        backend
            .redeem_invite(&invite, "new@example.com", "pw")
            .await
            .unwrap();
        let err = backend
            .redeem_invite(&invite, "other@example.com", "pw")
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Auth(INVALID_INVITE.to_string()));

        let response = backend.authenticate("new@example.com", "pw").await.unwrap();
        assert_eq!(response.user.role, Role::Regional);
        assert_eq!(response.user.region.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn invite_survives_duplicate_email() {
        let backend = backend_with_account();
        let invite = backend.issue_invite(Role::National, None).unwrap();

        let err = backend
            .redeem_invite(&invite, "rep@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Input(_)));

        backend
            .redeem_invite(&invite, "fresh@example.com", "pw")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn member_calls_require_session() {
        let backend = backend_with_account();
        let err = backend
            .list_members(&SessionToken::new("dev-token-nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Auth(_)));
    }

    #[tokio::test]
    async fn update_merges_patch_and_reports_missing() {
        let backend = backend_with_account();
        let token = backend
            .authenticate("rep@example.com", "pw")
            .await
            .unwrap()
            .token;
        let created = backend.create_member(&token, &fields()).await.unwrap();

        let patch = MemberPatch {
            jamaat: Some("Fes".to_string()),
            ..MemberPatch::default()
        };
        let updated = backend
            .update_member(&token, &created.id, &patch)
            .await
            .unwrap();
        assert_eq!(updated.fields.jamaat, "Fes");
        assert_eq!(updated.fields.first_name, "Ali");

        let stored = backend
            .get_member(&token, &created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, updated);

        let err = backend
            .update_member(&token, &MemberId::new("999"), &patch)
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::NotFound("Member not found: 999".to_string()));
    }

    #[test]
    fn digest_depends_on_salt() {
        assert_eq!(
            password_digest(&[1; RANDOM_BYTES], "pw"),
            password_digest(&[1; RANDOM_BYTES], "pw")
        );
        assert_ne!(
            password_digest(&[1; RANDOM_BYTES], "pw"),
            password_digest(&[2; RANDOM_BYTES], "pw")
        );
    }
}
