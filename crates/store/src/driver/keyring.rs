use super::{Store, not_found};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreErrorExt};
use crate::identity::RecordId;
use crate::security::{Classified, persistent_json};
use osprofiles_keyring::{CredentialStore, KeyringError};
use std::sync::Arc;
use tracing::debug;

/// Whole record stored as one credential under `(namespace, key)`.
#[derive(Debug)]
pub struct KeyringStore {
    id: RecordId,
    credentials: Arc<dyn CredentialStore>,
}

impl KeyringStore {
    /// # Errors
    /// Identifier validation failures.
    pub fn open(namespace: &str, key: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self { id: RecordId::new(namespace, key)?, credentials: Arc::clone(config.credentials()) })
    }
}

impl Store for KeyringStore {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn exists(&self) -> bool {
        self.credentials
            .get(self.id.namespace(), self.id.key())
            .is_ok_and(|secret| !secret.is_empty())
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        match self.credentials.get(self.id.namespace(), self.id.key()) {
            Ok(secret) => Ok(secret),
            Err(KeyringError::NotFound { .. }) => Err(not_found(&self.id)),
            Err(err) => Err(err).context(format!("Reading {}", self.id)),
        }
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        let bytes = persistent_json(record)?;
        self.credentials
            .set(self.id.namespace(), self.id.key(), &bytes)
            .context(format!("Writing {}", self.id))?;
        debug!(record = %self.id, "Record stored in credential store");
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        match self.credentials.delete(self.id.namespace(), self.id.key()) {
            Ok(()) | Err(KeyringError::NotFound { .. }) => Ok(()),
            Err(err) => Err(err).context(format!("Deleting {}", self.id)),
        }
    }
}
