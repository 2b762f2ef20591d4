//! Platform keyring backing for the session credential.
//!
//! Each key becomes one keyring entry under the `roster` service. The native
//! store is chosen per target OS by [`install_platform_store`], which must run
//! once before the first entry is touched.

use keyring_core::{Entry, Error as KeyringError};
use log::debug;
use roster_core::session::{Accessibility, CredentialStore, SessionError};
use zeroize::Zeroize;

/// Keyring service name shared by every entry.
pub const KEYRING_SERVICE: &str = "roster";

/// [`CredentialStore`] on top of the OS keyring.
///
/// Accessibility is a property of the installed store rather than of each
/// entry: the iOS store uses the data-protection keychain, which never
/// syncs or migrates items off the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn entry(key: &str) -> Result<Entry, SessionError> {
        Entry::new(KEYRING_SERVICE, key).map_err(|e| storage_error(&e))
    }
}

fn storage_error(e: &KeyringError) -> SessionError {
    SessionError::Storage(e.to_string())
}

impl CredentialStore for KeyringCredentialStore {
    fn store(
        &self,
        key: &str,
        value: &[u8],
        accessibility: Accessibility,
    ) -> Result<(), SessionError> {
        debug!("Storing {key} in keyring ({accessibility:?})");
        Self::entry(key)?
            .set_secret(value)
            .map_err(|e| storage_error(&e))
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
        match Self::entry(key)?.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(KeyringError::NoEntry) => Ok(None),
            Err(e) => Err(storage_error(&e)),
        }
    }

    fn delete(&self, key: &str) -> Result<(), SessionError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
            Err(e) => Err(storage_error(&e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, SessionError> {
        match Self::entry(key)?.get_secret() {
            Ok(mut secret) => {
                secret.zeroize();
                Ok(true)
            }
            Err(KeyringError::NoEntry) => Ok(false),
            Err(e) => Err(storage_error(&e)),
        }
    }
}

/// Installs the native keyring store for the current platform.
///
/// # Errors
///
/// Returns an error message if the native store cannot be opened, or if the
/// platform has no supported keyring.
pub fn install_platform_store() -> Result<(), String> {
    #[cfg(target_os = "macos")]
    let store = apple_native_keyring_store::keychain::Store::new();

    #[cfg(target_os = "ios")]
    let store = apple_native_keyring_store::protected::Store::new();

    #[cfg(target_os = "linux")]
    let store = zbus_secret_service_keyring_store::Store::new();

    #[cfg(target_os = "windows")]
    let store = windows_native_keyring_store::Store::new();

    #[cfg(target_os = "android")]
    let store = android_native_keyring_store::Store::new();

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "linux",
        target_os = "windows",
        target_os = "android"
    ))]
    {
        let store = store.map_err(|e| format!("Failed to open platform keyring: {e}"))?;
        keyring_core::set_default_store(store);
        debug!("Platform keyring installed");
        Ok(())
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "linux",
        target_os = "windows",
        target_os = "android"
    )))]
    Err("No keyring store for this platform".to_string())
}
