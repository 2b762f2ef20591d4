//! Session and credential lifecycle.
//!
//! This module owns everything about who is signed in: the persisted session
//! token, its verification at startup, login, invitation redemption and
//! logout.
//!
//! # Architecture
//!
//! ```text
//! SessionManager
//!     ├── Backend          (authenticate / redeem / verify)
//!     ├── CredentialStore  (persisted token, key "auth_token_v1")
//!     └── watch channel    (SessionSnapshot broadcast)
//! ```
//!
//! # Invariant
//!
//! An in-memory token always belongs to an identity the backend produced or
//! verified. When verification fails both are cleared together and the
//! persisted token is erased.

mod error;
mod manager;
mod storage;
mod types;

pub use error::{Result, SessionError};
pub use manager::SessionManager;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MemoryCredentialStore;
pub use storage::{Accessibility, CredentialStore, SESSION_TOKEN_KEY};
pub use types::{Identity, Role, SessionPhase, SessionSnapshot, SessionToken};
