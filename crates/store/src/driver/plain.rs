use super::{Store, artifact_exists, not_found, open_storage, read_optional, remove_into};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::identity::{Artifact, RecordId};
use crate::managed::{ManagedOverride, write_error};
use crate::security::{Classified, SecurityLevel, persistent_json};
use osprofiles_storage::Storage;
use tracing::debug;

/// Whole record as readable JSON in `<base>.json`.
///
/// Record types declaring secure fields are refused.
#[derive(Debug)]
pub struct PlainFileStore {
    id: RecordId,
    storage: Storage,
    managed: Option<ManagedOverride>,
}

impl PlainFileStore {
    /// # Errors
    /// Identifier validation, or failure to open the profile directory.
    pub fn open(namespace: &str, key: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let id = RecordId::new(namespace, key)?;
        Ok(Self { storage: open_storage(config)?, managed: config.managed().cloned(), id })
    }
}

impl Store for PlainFileStore {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn exists(&self) -> bool {
        self.managed.as_ref().is_some_and(ManagedOverride::is_present)
            || artifact_exists(&self.storage, &self.id.artifact(Artifact::Json))
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        if let Some(bytes) = self.managed.as_ref().and_then(ManagedOverride::read) {
            return Ok(bytes);
        }
        read_optional(&self.storage, &self.id.artifact(Artifact::Json))?
            .ok_or_else(|| not_found(&self.id))
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        if R::declares(SecurityLevel::Secure) {
            return Err(StoreError::SecurityMode {
                message: "plain-file storage cannot hold secure fields".into(),
                context: Some(self.id.to_string().into()),
            });
        }

        let bytes = persistent_json(record)?;
        let managed = self.managed.as_ref();
        self.storage
            .write(&self.id.artifact(Artifact::Json), &bytes)
            .map_err(|e| write_error(managed, e, "Writing plain record"))?;
        debug!(record = %self.id, "Plain record stored");
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        let managed = self.managed.as_ref();
        let mut errors = Vec::new();
        remove_into(&self.storage, &self.id.artifact(Artifact::Json), &mut errors, |e| {
            write_error(managed, e, "Removing plain record")
        });
        StoreError::collect(errors)
    }
}
