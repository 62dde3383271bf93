//! Read-only managed configuration that takes precedence over local storage.

use crate::error::StoreError;
use osprofiles_storage::StorageError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Source of administrator-provided record contents.
///
/// A source is consulted by identifier (usually a reverse-DNS name) and is never written.
pub trait ManagedSource: fmt::Debug + Send + Sync {
    /// The managed bytes for `identifier`, or `None` when nothing readable is provided.
    fn read(&self, identifier: &str) -> Option<Vec<u8>>;
}

/// A directory holding one file per identifier, e.g. `/Library/Managed Preferences`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDirectory {
    root: PathBuf,
    extension: String,
}

impl ManagedDirectory {
    /// Files named `<identifier>.json` under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, "json")
    }

    #[must_use]
    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self { root: root.into(), extension: extension.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path consulted for `identifier`; `None` if the identifier is not a plain file stem.
    #[must_use]
    pub fn path_for(&self, identifier: &str) -> Option<PathBuf> {
        let plain = !identifier.is_empty()
            && identifier != "."
            && identifier != ".."
            && !identifier.contains(['/', '\\']);
        plain.then(|| self.root.join(format!("{identifier}.{}", self.extension)))
    }
}

impl ManagedSource for ManagedDirectory {
    fn read(&self, identifier: &str) -> Option<Vec<u8>> {
        let path = self.path_for(identifier)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), "Managed configuration found");
                Some(bytes)
            },
            Err(_) => None,
        }
    }
}

/// A managed source bound to the identifier a store consults.
#[derive(Debug, Clone)]
pub struct ManagedOverride {
    identifier: String,
    source: Arc<dyn ManagedSource>,
}

impl ManagedOverride {
    #[must_use]
    pub fn new(identifier: impl Into<String>, source: Arc<dyn ManagedSource>) -> Self {
        Self { identifier: identifier.into(), source }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn read(&self) -> Option<Vec<u8>> {
        self.source.read(&self.identifier)
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.read().is_some()
    }
}

/// Explains a failed write or delete.
///
/// A present managed source wins; access-denied failures become [`StoreError::ReadOnly`];
/// anything else stays a storage error.
pub(crate) fn write_error(
    managed: Option<&ManagedOverride>,
    err: StorageError,
    action: &'static str,
) -> StoreError {
    if let Some(managed) = managed.filter(|m| m.is_present()) {
        return StoreError::ManagedConfiguration {
            message: format!("`{}` is managed by your organization", managed.identifier()).into(),
            context: Some(action.into()),
        };
    }
    if err.is_access_denied() {
        return StoreError::ReadOnly { message: err.to_string().into(), context: Some(action.into()) };
    }
    StoreError::Storage { source: err, context: Some(action.into()) }
}
