//! Persisted credential store abstraction.
//!
//! This module defines the [`CredentialStore`] trait for platform-agnostic
//! storage of the session token. Implementations are provided by the
//! platform layer (the Flutter bridge backs it with the OS keyring).
//!
//! # Security
//!
//! - The session token is the only value stored through this trait
//! - Implementations should use OS-level secure storage (Keychain, Keystore, etc.)
//! - The session manager always asks for device-local accessibility

use super::error::SessionError;

/// Storage key for the session token.
pub const SESSION_TOKEN_KEY: &str = "auth_token_v1";

/// When a stored credential may be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    /// Readable while the device is unlocked; may be included in backups.
    WhenUnlocked,
    /// Readable while the device is unlocked; never leaves this device.
    WhenUnlockedThisDeviceOnly,
}

/// Trait for secure storage of the session credential.
///
/// Implementations must provide platform-specific secure storage using
/// OS-level security mechanisms (iOS Keychain, Android Keystore, etc.).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the store can be shared with the
/// session manager across tasks.
pub trait CredentialStore: Send + Sync {
    /// Stores bytes under the given key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn store(&self, key: &str, value: &[u8], accessibility: Accessibility)
        -> Result<(), SessionError>;

    /// Retrieves the bytes for the given key.
    ///
    /// Returns `Ok(None)` if nothing is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the retrieval operation fails.
    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError>;

    /// Deletes the value for the given key. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete(&self, key: &str) -> Result<(), SessionError>;

    /// Checks if a value exists for the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    fn exists(&self, key: &str) -> Result<bool, SessionError>;
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::{Accessibility, CredentialStore, SessionError};

    /// In-memory credential store for testing.
    ///
    /// This implementation is NOT secure and should only be used in tests.
    /// It records the accessibility each key was stored with and can be told
    /// to fail every operation.
    #[derive(Debug, Default)]
    pub struct MemoryCredentialStore {
        data: RwLock<HashMap<String, (Vec<u8>, Accessibility)>>,
        failing: RwLock<bool>,
    }

    impl MemoryCredentialStore {
        /// Creates a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent operation fail (or succeed again).
        pub fn set_failing(&self, failing: bool) {
            if let Ok(mut flag) = self.failing.write() {
                *flag = failing;
            }
        }

        /// Returns the accessibility `key` was stored with.
        #[must_use]
        pub fn accessibility(&self, key: &str) -> Option<Accessibility> {
            self.data
                .read()
                .ok()
                .and_then(|data| data.get(key).map(|(_, a)| *a))
        }

        fn check(&self) -> Result<(), SessionError> {
            let failing = self
                .failing
                .read()
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            if *failing {
                return Err(SessionError::Storage("credential store unavailable".to_string()));
            }
            Ok(())
        }
    }

    impl CredentialStore for MemoryCredentialStore {
        fn store(
            &self,
            key: &str,
            value: &[u8],
            accessibility: Accessibility,
        ) -> Result<(), SessionError> {
            self.check()?;
            let mut data = self
                .data
                .write()
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            data.insert(key.to_string(), (value.to_vec(), accessibility));
            Ok(())
        }

        fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
            self.check()?;
            let data = self
                .data
                .read()
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Ok(data.get(key).map(|(value, _)| value.clone()))
        }

        fn delete(&self, key: &str) -> Result<(), SessionError> {
            self.check()?;
            let mut data = self
                .data
                .write()
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            data.remove(key);
            Ok(())
        }

        fn exists(&self, key: &str) -> Result<bool, SessionError> {
            self.check()?;
            let data = self
                .data
                .read()
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Ok(data.contains_key(key))
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryCredentialStore;
