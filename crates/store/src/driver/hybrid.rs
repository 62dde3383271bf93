//! The hybrid engine: secure fields encrypted, plaintext fields readable, temporary
//! fields in memory, plus a metadata sidecar.

use super::{
    Store, artifact_exists, envelope_for, existing_envelope, not_found, open_storage,
    read_optional, remove_into,
};
use crate::config::{SecurityMode, StoreConfig};
use crate::error::{StoreError, StoreErrorExt};
use crate::identity::{Artifact, RecordId};
use crate::managed::{ManagedOverride, write_error};
use crate::metadata::{MetadataDraft, RecordMetadata};
use crate::security::{Classified, SplitData, split_record};
use chrono::Utc;
use osprofiles_storage::Storage;
use osprofiles_vault::KeyManager;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// One record split across up to three artifacts:
///
/// ```text
/// <urn>.<key>.secure.enc       nonce || ciphertext || tag of the secure-field map
/// <urn>.<key>.plaintext.json   plaintext-field map
/// <urn>.<key>.metadata.json    RecordMetadata, written last
/// ```
///
/// Temporary fields live in this handle only. The handle is not synchronized; share it
/// across threads behind a lock.
///
/// ```rust
/// use osprofiles_keyring::MemoryKeyring;
/// use osprofiles_store::{HybridStore, Store, StoreConfig, profile_model};
/// use std::sync::Arc;
///
/// #[profile_model]
/// #[derive(Clone, Default, PartialEq)]
/// struct Connection {
///     endpoint: String,
///     #[security(secure)]
///     api_key: String,
/// }
///
/// # fn main() -> Result<(), osprofiles_store::StoreError> {
/// # let dir = tempfile::tempdir().unwrap();
/// let config = StoreConfig::builder()
///     .directory(dir.path())
///     .credentials(Arc::new(MemoryKeyring::new()))
///     .build();
///
/// let mut store = HybridStore::open("demo", "default", &config)?;
/// let record = Connection { endpoint: "https://api".into(), api_key: "sk-123".into() };
/// store.set(&record)?;
/// assert_eq!(store.get_record::<Connection>()?, record);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HybridStore {
    id: RecordId,
    storage: Storage,
    keys: KeyManager,
    mode: SecurityMode,
    degraded: bool,
    app_version: Option<String>,
    managed: Option<ManagedOverride>,
    temporary: Map<String, Value>,
}

impl HybridStore {
    /// Validates the identifier, opens the directory and settles the security mode.
    ///
    /// In [`SecurityMode::Keyring`] the credential store is checked once. If it is
    /// unavailable the store downgrades to [`SecurityMode::Insecure`] with a warning, unless
    /// fallback is disabled.
    ///
    /// # Errors
    /// * Identifier validation failures.
    /// * [`StoreError::KeyringUnavailable`] in strict mode.
    /// * [`StoreError::Storage`] if the directory cannot be opened.
    pub fn open(namespace: &str, key: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let id = RecordId::new(namespace, key)?;
        let keys = KeyManager::new(config.credentials().clone());

        let mut mode = config.security_mode();
        let mut degraded = false;
        if mode == SecurityMode::Keyring && !keys.is_available(id.urn()) {
            if !config.fallback() {
                return Err(StoreError::KeyringUnavailable {
                    message: "credential store did not pass the availability check".into(),
                    context: Some(id.to_string().into()),
                });
            }
            warn!(record = %id, "Keyring unavailable, falling back to insecure mode; secure fields cannot be stored");
            mode = SecurityMode::Insecure;
            degraded = true;
        }

        let storage = open_storage(config)?;
        info!(record = %id, mode = %mode, root = %storage.root().display(), "Hybrid store opened");

        Ok(Self {
            id,
            storage,
            keys,
            mode,
            degraded,
            app_version: config.app_version().map(str::to_owned),
            managed: config.managed().cloned(),
            temporary: Map::new(),
        })
    }

    /// Mode in effect after the availability check.
    #[must_use]
    pub const fn security_mode(&self) -> SecurityMode {
        self.mode
    }

    /// `true` if the store fell back to insecure mode at construction.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    #[must_use]
    pub fn storage_root(&self) -> &std::path::Path {
        self.storage.root()
    }

    /// Physical path of one of this record's artifacts.
    ///
    /// # Errors
    /// Only if the artifact name fails sandbox validation.
    pub fn artifact_path(&self, artifact: Artifact) -> Result<std::path::PathBuf, StoreError> {
        Ok(self.storage.resolve(&self.id.artifact(artifact))?)
    }

    // --- Temporary fields ---

    /// Overlays a value on the next reads; never written to disk.
    pub fn set_temporary(&mut self, field: impl Into<String>, value: Value) {
        self.temporary.insert(field.into(), value);
    }

    pub fn clear_temporary(&mut self) {
        self.temporary.clear();
    }

    pub fn clear_temporary_field(&mut self, field: &str) {
        self.temporary.remove(field);
    }

    #[must_use]
    pub const fn temporary(&self) -> &Map<String, Value> {
        &self.temporary
    }

    // --- Metadata ---

    /// The metadata sidecar, if one was written.
    ///
    /// # Errors
    /// I/O failures or an undecodable sidecar.
    pub fn metadata(&self) -> Result<Option<RecordMetadata>, StoreError> {
        read_optional(&self.storage, &self.id.artifact(Artifact::Metadata))?
            .map(|bytes| serde_json::from_slice(&bytes).context("Decoding record metadata"))
            .transpose()
    }

    fn write_metadata(&self, split: &SplitData, algorithm: Option<&str>) -> Result<(), StoreError> {
        let previous = self.metadata().unwrap_or_else(|err| {
            warn!(record = %self.id, error = %err, "Ignoring unreadable metadata");
            None
        });
        let draft = MetadataDraft {
            profile_name: self.id.key(),
            urn: self.id.urn(),
            security_mode: self.mode,
            has_secure_data: split.has_secure_data(),
            has_plaintext_data: split.has_plaintext_data(),
            encryption_alg: algorithm,
            app_version: self.app_version.as_deref(),
        };
        let meta = RecordMetadata::build(&draft, previous.as_ref(), Utc::now());
        let json = serde_json::to_vec_pretty(&meta)?;

        self.storage
            .write(&self.id.artifact(Artifact::Metadata), &json)
            .map_err(|e| write_error(self.managed.as_ref(), e, "Writing metadata"))
    }

    // --- Tiers ---

    fn read_secure(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let name = self.id.artifact(Artifact::Secure);
        if !artifact_exists(&self.storage, &name) {
            return Ok(None);
        }
        if self.mode == SecurityMode::Insecure {
            return Err(StoreError::SecurityMode {
                message: "secure data exists but the store runs without a keyring".into(),
                context: Some(self.id.to_string().into()),
            });
        }

        let Some(blob) = read_optional(&self.storage, &name)? else {
            return Ok(None);
        };
        let envelope = existing_envelope(&self.keys, &self.id)?;
        Ok(Some(envelope.open(&blob).context(format!("Decrypting secure fields of {}", self.id))?))
    }

    /// Writes or clears one tier. An empty tier removes its stale artifact.
    fn write_tier(&self, artifact: Artifact, data: Option<Vec<u8>>) -> Result<(), StoreError> {
        let name = self.id.artifact(artifact);
        let managed = self.managed.as_ref();
        match data {
            Some(bytes) => {
                self.storage.write(&name, &bytes).map_err(|e| write_error(managed, e, "Writing record data"))
            },
            None => self
                .storage
                .remove_if_exists(&name)
                .map(|_| ())
                .map_err(|e| write_error(managed, e, "Removing stale record data")),
        }
    }

    /// [`Store::delete`] plus removal of the record's encryption key.
    ///
    /// The key is left alone while degraded, since the credential store is unreachable.
    ///
    /// # Errors
    /// Every failed step, aggregated.
    pub fn destroy(&mut self) -> Result<(), StoreError> {
        let mut errors = self.delete().err().into_iter().collect::<Vec<_>>();
        if self.mode == SecurityMode::Keyring {
            if let Err(err) = self.keys.delete(self.id.urn(), self.id.key()) {
                errors.push(err.into());
            }
        }
        StoreError::collect(errors)
    }
}

impl Store for HybridStore {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn exists(&self) -> bool {
        self.managed.as_ref().is_some_and(ManagedOverride::is_present)
            || artifact_exists(&self.storage, &self.id.artifact(Artifact::Secure))
            || artifact_exists(&self.storage, &self.id.artifact(Artifact::Plaintext))
    }

    /// Secure, plaintext and temporary fields merged into one JSON object, in that
    /// order of precedence (temporary wins).
    fn get(&self) -> Result<Vec<u8>, StoreError> {
        if let Some(bytes) = self.managed.as_ref().and_then(ManagedOverride::read) {
            return Ok(bytes);
        }

        let secure = self.read_secure()?;
        let plaintext = read_optional(&self.storage, &self.id.artifact(Artifact::Plaintext))?;
        if secure.is_none() && plaintext.is_none() {
            return Err(not_found(&self.id));
        }

        let mut split = SplitData::from_artifacts(secure.as_deref(), plaintext.as_deref())?;
        for (field, value) in &self.temporary {
            split.add_temporary(field.clone(), value.clone());
        }
        Ok(serde_json::to_vec(&split.merged(true))?)
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        let split = split_record(record)?;

        if split.has_secure_data() && self.mode == SecurityMode::Insecure {
            return Err(StoreError::SecurityMode {
                message: "record has secure fields but no keyring is available".into(),
                context: Some(self.id.to_string().into()),
            });
        }

        let mut algorithm = None;
        let secure = if split.has_secure_data() {
            let envelope = envelope_for(&self.keys, &self.id)?;
            algorithm = Some(envelope.algorithm());
            Some(envelope.seal(&split.serialize_secure()?)?)
        } else {
            None
        };
        let plaintext =
            if split.has_plaintext_data() { Some(split.serialize_plaintext()?) } else { None };

        self.write_tier(Artifact::Secure, secure)?;
        self.write_tier(Artifact::Plaintext, plaintext)?;
        self.temporary.clone_from(&split.temporary);

        self.write_metadata(&split, algorithm)
            .map_err(|e| StoreError::Metadata { source: Box::new(e), context: Some(self.id.to_string().into()) })?;

        debug!(
            record = %self.id,
            secure = split.secure.len(),
            plaintext = split.plaintext.len(),
            temporary = split.temporary.len(),
            "Hybrid record stored"
        );
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        self.temporary.clear();

        let managed = self.managed.as_ref();
        let mut errors = Vec::new();
        for artifact in [Artifact::Secure, Artifact::Plaintext, Artifact::Metadata] {
            remove_into(&self.storage, &self.id.artifact(artifact), &mut errors, |e| {
                write_error(managed, e, "Removing record artifact")
            });
        }
        if errors.is_empty() {
            debug!(record = %self.id, "Hybrid record deleted");
        }
        StoreError::collect(errors)
    }
}
