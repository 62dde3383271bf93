//! Credential store abstraction.
//!
//! Secrets are addressed by a `(service, account)` pair and stored as opaque bytes.
//! Two backends are provided:
//!
//! * [`SystemKeyring`] talks to the platform credential service through the `keyring`
//!   crate (macOS Keychain, Windows Credential Manager, Linux Secret Service with the
//!   kernel keyutils as a session cache). Secrets outlive reboots on every platform.
//! * [`MemoryKeyring`] keeps secrets in process memory. It can be switched into an
//!   "unavailable" state to exercise degraded paths in tests.
//!
//! ```rust
//! use osprofiles_keyring::{CredentialStore, MemoryKeyring};
//!
//! # fn main() -> Result<(), osprofiles_keyring::KeyringError> {
//! let store = MemoryKeyring::new();
//! store.set("urn.osprofiles.demo.profile.v1", "default", b"secret")?;
//! assert_eq!(store.get("urn.osprofiles.demo.profile.v1", "default")?, b"secret");
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::{KeyringError, KeyringErrorExt};

use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Byte-oriented secret storage keyed by service and account.
pub trait CredentialStore: fmt::Debug + Send + Sync {
    /// Fetches the secret stored for `service`/`account`.
    ///
    /// # Errors
    /// [`KeyringError::NotFound`] when nothing is stored, other variants for backend faults.
    fn get(&self, service: &str, account: &str) -> Result<Vec<u8>, KeyringError>;

    /// Stores (or replaces) the secret for `service`/`account`.
    ///
    /// # Errors
    /// Any backend failure.
    fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), KeyringError>;

    /// Removes the secret for `service`/`account`.
    ///
    /// # Errors
    /// [`KeyringError::NotFound`] when nothing is stored, other variants for backend faults.
    fn delete(&self, service: &str, account: &str) -> Result<(), KeyringError>;
}

/// Operating system credential service.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemKeyring;

impl SystemKeyring {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether secrets written through this backend survive until explicitly deleted.
    #[must_use]
    pub fn persists_until_deleted() -> bool {
        matches!(
            keyring::default::default_credential_builder().persistence(),
            CredentialPersistence::UntilDelete
        )
    }

    fn entry(service: &str, account: &str) -> Result<keyring::Entry, KeyringError> {
        keyring::Entry::new(service, account).map_err(|e| map_backend(e, service, account))
    }
}

fn map_backend(err: keyring::Error, service: &str, account: &str) -> KeyringError {
    match err {
        keyring::Error::NoEntry => KeyringError::NotFound {
            message: format!("{service}/{account}").into(),
            context: None,
        },
        keyring::Error::NoStorageAccess(inner) => KeyringError::Unavailable {
            message: inner.to_string().into(),
            context: Some(format!("{service}/{account}").into()),
        },
        other => KeyringError::Backend {
            source: other,
            context: Some(format!("{service}/{account}").into()),
        },
    }
}

impl CredentialStore for SystemKeyring {
    fn get(&self, service: &str, account: &str) -> Result<Vec<u8>, KeyringError> {
        Self::entry(service, account)?.get_secret().map_err(|e| map_backend(e, service, account))
    }

    fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), KeyringError> {
        Self::entry(service, account)?
            .set_secret(secret)
            .map_err(|e| map_backend(e, service, account))?;
        debug!(service, account, "Credential stored");
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), KeyringError> {
        Self::entry(service, account)?
            .delete_credential()
            .map_err(|e| map_backend(e, service, account))?;
        debug!(service, account, "Credential removed");
        Ok(())
    }
}

#[derive(Default)]
struct MemoryInner {
    secrets: RwLock<HashMap<(String, String), Vec<u8>>>,
    unavailable: AtomicBool,
}

/// In-process credential store.
///
/// Clones share the same secrets and availability switch.
#[derive(Clone, Default)]
pub struct MemoryKeyring {
    inner: Arc<MemoryInner>,
}

impl fmt::Debug for MemoryKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryKeyring")
            .field("entries", &self.inner.secrets.read().len())
            .field("available", &self.is_available())
            .finish()
    }
}

impl MemoryKeyring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every operation, as a locked or missing keyring would.
    #[must_use]
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.inner.unavailable.load(Ordering::SeqCst)
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.secrets.read().len()
    }

    #[must_use]
    pub fn contains(&self, service: &str, account: &str) -> bool {
        self.inner.secrets.read().contains_key(&(service.to_owned(), account.to_owned()))
    }

    fn ensure_available(&self) -> Result<(), KeyringError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(KeyringError::Unavailable {
                message: "In-memory credential store is switched off".into(),
                context: None,
            })
        }
    }
}

impl CredentialStore for MemoryKeyring {
    fn get(&self, service: &str, account: &str) -> Result<Vec<u8>, KeyringError> {
        self.ensure_available()?;
        self.inner
            .secrets
            .read()
            .get(&(service.to_owned(), account.to_owned()))
            .cloned()
            .ok_or_else(|| KeyringError::NotFound {
                message: format!("{service}/{account}").into(),
                context: None,
            })
    }

    fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), KeyringError> {
        self.ensure_available()?;
        self.inner.secrets.write().insert((service.to_owned(), account.to_owned()), secret.to_vec());
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), KeyringError> {
        self.ensure_available()?;
        self.inner
            .secrets
            .write()
            .remove(&(service.to_owned(), account.to_owned()))
            .map(|_| ())
            .ok_or_else(|| KeyringError::NotFound {
                message: format!("{service}/{account}").into(),
                context: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip_and_delete() {
        let store = MemoryKeyring::new();
        store.set("svc", "acct", b"value").unwrap();
        assert!(store.contains("svc", "acct"));
        assert_eq!(store.get("svc", "acct").unwrap(), b"value");

        store.delete("svc", "acct").unwrap();
        assert!(store.get("svc", "acct").unwrap_err().is_not_found());
        assert!(store.delete("svc", "acct").unwrap_err().is_not_found());
    }

    #[test]
    fn test_memory_outage_rejects_everything() {
        let store = MemoryKeyring::new();
        store.set("svc", "acct", b"value").unwrap();
        store.set_available(false);

        assert!(matches!(store.get("svc", "acct"), Err(KeyringError::Unavailable { .. })));
        assert!(matches!(store.set("svc", "x", b"v"), Err(KeyringError::Unavailable { .. })));

        store.set_available(true);
        assert_eq!(store.get("svc", "acct").unwrap(), b"value");
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_system_backend_keeps_secrets_across_reboots() {
        assert!(SystemKeyring::persists_until_deleted());
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryKeyring::new();
        let other = store.clone();
        other.set("svc", "acct", b"shared").unwrap();
        assert_eq!(store.len(), 1);

        let debug = format!("{store:?}");
        assert!(!debug.contains("shared"), "secrets must not leak through Debug");
    }
}
