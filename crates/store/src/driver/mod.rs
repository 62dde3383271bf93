//! The uniform four-operation contract and its backends.
//!
//! | Driver | Medium | Secure fields |
//! |--------|--------|---------------|
//! | [`KeyringStore`] | OS credential store | inside the credential store |
//! | [`FileStore`] | one encrypted file + `.nfo` sidecar | whole record encrypted |
//! | [`PlainFileStore`] | one readable JSON file | refused |
//! | [`MemoryStore`] | process memory | held in memory |
//! | [`HybridStore`] | encrypted + plaintext artifacts + metadata | encrypted artifact |
//!
//! [`Driver`] selects one of them at construction time.

mod file;
mod hybrid;
mod keyring;
mod memory;
mod plain;

pub use file::FileStore;
pub use hybrid::HybridStore;
pub use keyring::KeyringStore;
pub use memory::{MemoryArena, MemoryStore};
pub use plain::PlainFileStore;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreErrorExt};
use crate::identity::RecordId;
use crate::security::{Classified, assign_fields};
use osprofiles_storage::{Storage, StorageError};
use osprofiles_vault::{Envelope, KeyManager};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Storage for exactly one record, addressed by a validated [`RecordId`].
pub trait Store {
    fn id(&self) -> &RecordId;

    /// `true` if the record (or a managed override for it) is present.
    fn exists(&self) -> bool;

    /// The stored record as JSON bytes.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when nothing is stored; backend, crypto or decoding
    /// failures otherwise.
    fn get(&self) -> Result<Vec<u8>, StoreError>;

    /// Replaces the stored record. Writes are whole-record.
    ///
    /// # Errors
    /// Classification, security-mode, crypto or I/O failures.
    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError>;

    /// Removes everything stored for the record. Removing an absent record succeeds.
    ///
    /// # Errors
    /// Backend failures; file-backed drivers report every failed artifact together.
    fn delete(&mut self) -> Result<(), StoreError>;

    /// Reads the record back into a value produced by `factory`.
    ///
    /// Stored fields the type no longer declares, or whose values no longer fit, are skipped.
    ///
    /// # Errors
    /// Same as [`Store::get`], plus [`StoreError::Serialization`] if the bytes are not
    /// a JSON object.
    fn get_record_with<R, F>(&self, factory: F) -> Result<R, StoreError>
    where
        Self: Sized,
        R: Classified,
        F: FnOnce() -> R,
    {
        let bytes = self.get()?;
        let fields: Map<String, Value> =
            serde_json::from_slice(&bytes).context(format!("Decoding record {}", self.id()))?;
        let mut record = factory();
        assign_fields(&mut record, fields);
        Ok(record)
    }

    /// [`Store::get_record_with`] starting from `R::default()`.
    ///
    /// # Errors
    /// See [`Store::get_record_with`].
    fn get_record<R>(&self) -> Result<R, StoreError>
    where
        Self: Sized,
        R: Classified + Default,
    {
        self.get_record_with(R::default)
    }
}

/// Backend selector, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Keyring,
    File,
    Plain,
    Memory,
    #[default]
    Hybrid,
}

impl DriverKind {
    pub const ALL: [Self; 5] = [Self::Keyring, Self::File, Self::Plain, Self::Memory, Self::Hybrid];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::File => "file",
            Self::Plain => "plain",
            Self::Memory => "memory",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == normalized).ok_or_else(|| {
            StoreError::Internal {
                message: format!("unknown driver `{raw}`").into(),
                context: Some("expected keyring, file, plain, memory or hybrid".into()),
            }
        })
    }
}

/// One backend, chosen at construction.
#[derive(Debug)]
pub enum Driver {
    Keyring(KeyringStore),
    File(FileStore),
    Plain(PlainFileStore),
    Memory(MemoryStore),
    Hybrid(HybridStore),
}

impl Driver {
    /// Opens the `kind` backend for `(namespace, key)`.
    ///
    /// # Errors
    /// Identifier validation runs first for every kind; then backend-specific setup.
    pub fn open(
        kind: DriverKind,
        namespace: &str,
        key: &str,
        config: &StoreConfig,
    ) -> Result<Self, StoreError> {
        Ok(match kind {
            DriverKind::Keyring => Self::Keyring(KeyringStore::open(namespace, key, config)?),
            DriverKind::File => Self::File(FileStore::open(namespace, key, config)?),
            DriverKind::Plain => Self::Plain(PlainFileStore::open(namespace, key, config)?),
            DriverKind::Memory => Self::Memory(MemoryStore::open(namespace, key, config)?),
            DriverKind::Hybrid => Self::Hybrid(HybridStore::open(namespace, key, config)?),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> DriverKind {
        match self {
            Self::Keyring(_) => DriverKind::Keyring,
            Self::File(_) => DriverKind::File,
            Self::Plain(_) => DriverKind::Plain,
            Self::Memory(_) => DriverKind::Memory,
            Self::Hybrid(_) => DriverKind::Hybrid,
        }
    }

    /// The hybrid store, when that is the selected backend.
    #[must_use]
    pub fn as_hybrid_mut(&mut self) -> Option<&mut HybridStore> {
        match self {
            Self::Hybrid(store) => Some(store),
            _ => None,
        }
    }

    /// Deletes the record and, for backends that own one, its encryption key.
    ///
    /// # Errors
    /// Aggregated cleanup failures.
    pub fn destroy(&mut self) -> Result<(), StoreError> {
        match self {
            Self::Hybrid(store) => store.destroy(),
            Self::File(store) => store.destroy(),
            other => other.delete(),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $body:expr) => {
        match $self {
            Driver::Keyring($store) => $body,
            Driver::File($store) => $body,
            Driver::Plain($store) => $body,
            Driver::Memory($store) => $body,
            Driver::Hybrid($store) => $body,
        }
    };
}

impl Store for Driver {
    fn id(&self) -> &RecordId {
        dispatch!(self, store => store.id())
    }

    fn exists(&self) -> bool {
        dispatch!(self, store => store.exists())
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        dispatch!(self, store => store.get())
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        dispatch!(self, store => store.set(record))
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        dispatch!(self, store => store.delete())
    }
}

// --- Helpers shared by the file-backed drivers ---

pub(crate) fn open_storage(config: &StoreConfig) -> Result<Storage, StoreError> {
    let dir = config.resolve_directory()?;
    Storage::builder()
        .root(&dir)
        .open()
        .context(format!("Opening profile directory {}", dir.display()))
}

/// Reads an artifact, mapping "missing" to `None`.
pub(crate) fn read_optional(storage: &Storage, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
    match storage.read(name) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err).context(format!("Reading {name}")),
    }
}

pub(crate) fn artifact_exists(storage: &Storage, name: &str) -> bool {
    storage.exists(name).unwrap_or(false)
}

pub(crate) fn not_found(id: &RecordId) -> StoreError {
    StoreError::NotFound { message: id.to_string().into(), context: None }
}

/// Envelope for sealing the record, creating its key on first use.
pub(crate) fn envelope_for(keys: &KeyManager, id: &RecordId) -> Result<Envelope, StoreError> {
    let key = keys.get_or_create(id.urn(), id.key()).context(format!("Encryption key for {id}"))?;
    Ok(Envelope::new(&key)?)
}

/// Envelope for opening an existing artifact. A lost key is an error, never a fresh key.
pub(crate) fn existing_envelope(keys: &KeyManager, id: &RecordId) -> Result<Envelope, StoreError> {
    let key = keys.get(id.urn(), id.key()).context(format!("Encryption key for {id}"))?;
    Ok(Envelope::new(&key)?)
}

/// Removes an artifact if present, pushing any failure onto `errors`.
pub(crate) fn remove_into(
    storage: &Storage,
    name: &str,
    errors: &mut Vec<StoreError>,
    explain: impl FnOnce(StorageError) -> StoreError,
) {
    if let Err(err) = storage.remove_if_exists(name) {
        errors.push(explain(err));
    }
}
