//! Per-record key lookup backed by a [`CredentialStore`].

use osprofiles_keyring::{CredentialStore, KeyringError};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{VaultError, VaultErrorExt};
use crate::types::EncryptionKey;

const CHECK_ACCOUNT_PREFIX: &str = "availability-check-";
const CHECK_SECRET: &[u8] = b"osprofiles-availability";

/// Fetches, creates and removes record keys in the credential store.
///
/// Keys are addressed by `(identifier, record_key)`, which maps onto the store's
/// `(service, account)` pair.
#[derive(Debug, Clone)]
pub struct KeyManager {
    store: Arc<dyn CredentialStore>,
}

impl KeyManager {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns the stored key without ever creating one.
    ///
    /// # Errors
    /// * [`VaultError::MissingKey`] if nothing is stored for the record.
    /// * [`VaultError::Keyring`] for any other credential store failure.
    /// * [`VaultError::InvalidKey`] if the stored secret is not a 256-bit key.
    pub fn get(&self, identifier: &str, record_key: &str) -> Result<EncryptionKey, VaultError> {
        match self.store.get(identifier, record_key) {
            Ok(bytes) => EncryptionKey::from_slice(&bytes)
                .context(format!("Stored key for {identifier}/{record_key} is malformed")),
            Err(KeyringError::NotFound { .. }) => Err(VaultError::MissingKey {
                message: format!("{identifier}/{record_key}").into(),
                context: None,
            }),
            Err(err) => {
                Err(err).context(format!("Fetching key for {identifier}/{record_key}"))
            },
        }
    }

    /// Returns the stored key, generating and persisting a new one if none exists.
    ///
    /// # Errors
    /// * [`VaultError::Keyring`] for any credential store failure other than "not found",
    ///   including failure to persist a freshly generated key.
    /// * [`VaultError::InvalidKey`] if the stored secret is not a 256-bit key.
    pub fn get_or_create(
        &self,
        identifier: &str,
        record_key: &str,
    ) -> Result<EncryptionKey, VaultError> {
        match self.get(identifier, record_key) {
            Err(VaultError::MissingKey { .. }) => {
                let key = EncryptionKey::generate()?;
                self.store
                    .set(identifier, record_key, key.as_bytes())
                    .context(format!("Persisting new key for {identifier}/{record_key}"))?;
                info!(identifier, record_key, "Generated new record encryption key");
                Ok(key)
            },
            found => found,
        }
    }

    /// Removes the key for a record. A missing key is not an error.
    ///
    /// # Errors
    /// [`VaultError::Keyring`] for any other credential store failure.
    pub fn delete(&self, identifier: &str, record_key: &str) -> Result<(), VaultError> {
        match self.store.delete(identifier, record_key) {
            Ok(()) | Err(KeyringError::NotFound { .. }) => {
                debug!(identifier, record_key, "Record encryption key removed");
                Ok(())
            },
            Err(err) => Err(err).context(format!("Deleting key for {identifier}/{record_key}")),
        }
    }

    /// Checks the credential store with a disposable write/read/delete cycle.
    ///
    /// Any failure, including a read-back mismatch, counts as unavailable. Once the
    /// write succeeds the disposable credential is removed whatever the read returned.
    #[must_use]
    pub fn is_available(&self, identifier: &str) -> bool {
        let account = format!("{CHECK_ACCOUNT_PREFIX}{identifier}");

        let outcome = self.store.set(identifier, &account, CHECK_SECRET).and_then(|()| {
            let read = self.store.get(identifier, &account);
            if let Err(err) = self.store.delete(identifier, &account) {
                debug!(identifier, error = %err, "Availability check credential left behind");
            }
            match read {
                Ok(bytes) if bytes == CHECK_SECRET => Ok(()),
                Ok(_) => Err(KeyringError::Internal {
                    message: "Check secret read back differently".into(),
                    context: None,
                }),
                Err(err) => Err(err),
            }
        });

        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(identifier, error = %err, "Credential store availability check failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprofiles_keyring::MemoryKeyring;

    fn manager() -> (KeyManager, MemoryKeyring) {
        let store = MemoryKeyring::new();
        (KeyManager::new(Arc::new(store.clone())), store)
    }

    #[test]
    fn test_get_or_create_is_stable() {
        let (keys, store) = manager();
        let first = keys.get_or_create("urn.test", "default").unwrap();
        let second = keys.get_or_create("urn.test", "default").unwrap();
        assert_eq!(first, second);
        assert!(store.contains("urn.test", "default"));
    }

    #[test]
    fn test_keys_are_per_record() {
        let (keys, _) = manager();
        let a = keys.get_or_create("urn.test", "a").unwrap();
        let b = keys.get_or_create("urn.test", "b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_backend_failure_propagates_instead_of_regenerating() {
        let (keys, store) = manager();
        keys.get_or_create("urn.test", "default").unwrap();
        store.set_available(false);

        let err = keys.get_or_create("urn.test", "default").unwrap_err();
        assert!(matches!(err, VaultError::Keyring { .. }));
    }

    #[test]
    fn test_malformed_stored_key() {
        let (keys, store) = manager();
        store.set("urn.test", "default", b"short").unwrap();
        let err = keys.get_or_create("urn.test", "default").unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey { .. }));
    }

    #[test]
    fn test_availability_check_leaves_no_residue() {
        let (keys, store) = manager();
        assert!(keys.is_available("urn.test"));
        assert_eq!(store.len(), 0);

        store.set_available(false);
        assert!(!keys.is_available("urn.test"));
    }

    /// Accepts writes and deletes but fails every read.
    #[derive(Debug, Default)]
    struct WriteOnlyStore {
        inner: MemoryKeyring,
    }

    impl CredentialStore for WriteOnlyStore {
        fn get(&self, _: &str, _: &str) -> Result<Vec<u8>, KeyringError> {
            Err(KeyringError::Unavailable { message: "read refused".into(), context: None })
        }

        fn set(&self, service: &str, account: &str, secret: &[u8]) -> Result<(), KeyringError> {
            self.inner.set(service, account, secret)
        }

        fn delete(&self, service: &str, account: &str) -> Result<(), KeyringError> {
            self.inner.delete(service, account)
        }
    }

    #[test]
    fn test_failed_read_back_still_cleans_up() {
        let inner = MemoryKeyring::new();
        let keys = KeyManager::new(Arc::new(WriteOnlyStore { inner: inner.clone() }));

        assert!(!keys.is_available("urn.test"));
        assert_eq!(inner.len(), 0, "the disposable credential must be removed");
    }

    #[test]
    fn test_get_never_creates() {
        let (keys, store) = manager();
        let err = keys.get("urn.test", "default").unwrap_err();
        assert!(err.is_missing_key());
        assert!(!store.contains("urn.test", "default"));

        let created = keys.get_or_create("urn.test", "default").unwrap();
        assert_eq!(keys.get("urn.test", "default").unwrap(), created);

        store.set_available(false);
        assert!(matches!(keys.get("urn.test", "default"), Err(VaultError::Keyring { .. })));
    }

    #[test]
    fn test_delete_tolerates_missing_key() {
        let (keys, store) = manager();
        keys.get_or_create("urn.test", "default").unwrap();
        keys.delete("urn.test", "default").unwrap();
        keys.delete("urn.test", "default").unwrap();
        assert!(!store.contains("urn.test", "default"));
    }
}
