use super::{Store, not_found};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::identity::RecordId;
use crate::metadata::MemoryMetadata;
use crate::security::{Classified, persistent_json};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    metadata: MemoryMetadata,
}

/// Process-local backing map for [`MemoryStore`]s.
///
/// Clones share entries, so stores opened with the same arena see each other's records.
#[derive(Clone, Default)]
pub struct MemoryArena {
    entries: Arc<RwLock<HashMap<RecordId, MemoryEntry>>>,
}

impl fmt::Debug for MemoryArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryArena").field("entries", &self.len()).finish()
    }
}

impl MemoryArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Record held in a [`MemoryArena`]; lost when the last arena handle is dropped.
#[derive(Debug)]
pub struct MemoryStore {
    id: RecordId,
    arena: MemoryArena,
    app_version: Option<String>,
}

impl MemoryStore {
    /// # Errors
    /// Identifier validation failures.
    pub fn open(namespace: &str, key: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            id: RecordId::new(namespace, key)?,
            arena: config.memory().clone(),
            app_version: config.app_version().map(str::to_owned),
        })
    }

    /// Bookkeeping for the stored entry.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if nothing is stored.
    pub fn metadata(&self) -> Result<MemoryMetadata, StoreError> {
        self.arena
            .entries
            .read()
            .get(&self.id)
            .map(|entry| entry.metadata.clone())
            .ok_or_else(|| not_found(&self.id))
    }
}

impl Store for MemoryStore {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn exists(&self) -> bool {
        self.arena.entries.read().contains_key(&self.id)
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        self.arena
            .entries
            .read()
            .get(&self.id)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| not_found(&self.id))
    }

    fn set<R: Classified>(&mut self, record: &R) -> Result<(), StoreError> {
        let value = persistent_json(record)?;
        let now = Utc::now();

        let mut entries = self.arena.entries.write();
        match entries.get_mut(&self.id) {
            Some(entry) => {
                entry.value = value;
                entry.metadata.touch(now);
            },
            None => {
                let metadata = MemoryMetadata::new(self.id.key(), self.app_version.as_deref(), now);
                entries.insert(self.id.clone(), MemoryEntry { value, metadata });
            },
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        self.arena.entries.write().remove(&self.id);
        Ok(())
    }
}
