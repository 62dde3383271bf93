use super::{
    Store, artifact_exists, envelope_for, existing_envelope, not_found, open_storage,
    read_optional, remove_into,
};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreErrorExt};
use crate::identity::{Artifact, RecordId};
use crate::managed::{ManagedOverride, write_error};
use crate::metadata::LegacyMetadata;
use crate::security::{Classified, persistent_json};
use chrono::Utc;
use osprofiles_storage::Storage;
use osprofiles_vault::{Envelope, KeyManager};
use tracing::debug;

/// Single-file layout: the whole record encrypted into `<base>.enc`, described by `<base>.nfo`.
#[derive(Debug)]
pub struct FileStore {
    id: RecordId,
    storage: Storage,
    keys: KeyManager,
    managed: Option<ManagedOverride>,
}

impl FileStore {
    /// # Errors
    /// Identifier validation, or failure to open the profile directory.
    pub fn open(namespace: &str, key: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let id = RecordId::new(namespace, key)?;
        Ok(Self {
            storage: open_storage(config)?,
            keys: KeyManager::new(config.credentials().clone()),
            managed: config.managed().cloned(),
            id,
        })
    }

    /// Sidecar written with the record, if any.
    ///
    /// # Errors
    /// I/O or decoding failures of an existing sidecar.
    pub fn metadata(&self) -> Result<Option<LegacyMetadata>, StoreError> {
        read_optional(&self.storage, &self.id.artifact(Artifact::LegacyMetadata))?
            .map(|bytes| serde_json::from_slice(&bytes).context("Decoding legacy metadata"))
            .transpose()
    }

    /// [`Store::delete`] plus removal of the record's encryption key.
    ///
    /// # Errors
    /// Every failed step, aggregated.
    pub fn destroy(&mut self) -> Result<(), StoreError> {
        let mut errors = self.delete().err().into_iter().collect::<Vec<_>>();
        if let Err(err) = self.keys.delete(self.id.urn(), self.id.key()) {
            errors.push(err.into());
        }
        StoreError::collect(errors)
    }

    fn managed_bytes(&self) -> Option<Vec<u8>> {
        self.managed.as_ref().and_then(ManagedOverride::read)
    }
}

impl Store for FileStore {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn exists(&self) -> bool {
        self.managed.as_ref().is_some_and(ManagedOverride::is_present)
            || artifact_exists(&self.storage, &self.id.artifact(Artifact::Encrypted))
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        if let Some(bytes) = self.managed_bytes() {
            return Ok(bytes);
        }

        let blob = read_optional(&self.storage, &self.id.artifact(Artifact::Encrypted))?
            .ok_or_else(|| not_found(&self.id))?;
        let envelope = existing_envelope(&self.keys, &self.id)?;
        envelope.open(&blob).context(format!("Decrypting {}", self.id))
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        let plaintext = persistent_json(record)?;
        let envelope: Envelope = envelope_for(&self.keys, &self.id)?;
        let blob = envelope.seal(&plaintext)?;

        let managed = self.managed.as_ref();
        self.storage
            .write(&self.id.artifact(Artifact::Encrypted), &blob)
            .map_err(|e| write_error(managed, e, "Writing encrypted record"))?;

        let meta = LegacyMetadata::build(self.id.key(), self.id.urn(), envelope.algorithm(), Utc::now());
        let json = serde_json::to_vec_pretty(&meta)?;
        self.storage
            .write(&self.id.artifact(Artifact::LegacyMetadata), &json)
            .map_err(|e| write_error(managed, e, "Writing legacy metadata"))
            .map_err(|e| StoreError::Metadata { source: Box::new(e), context: None })?;

        debug!(record = %self.id, "Encrypted record stored");
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        let managed = self.managed.as_ref();
        let mut errors = Vec::new();
        for artifact in [Artifact::Encrypted, Artifact::LegacyMetadata] {
            remove_into(&self.storage, &self.id.artifact(artifact), &mut errors, |e| {
                write_error(managed, e, "Removing record artifact")
            });
        }
        StoreError::collect(errors)
    }
}
