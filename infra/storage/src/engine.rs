//! Core storage engine providing sandboxed, atomic, owner-only file I/O.
//!
//! The [`Storage`] handle owns a single flat directory. Every artifact is addressed by a
//! plain file name, written atomically and readable only by the current user.

use crate::builder::StorageBuilder;
use crate::error::StorageError;
use crate::maintenance::{self, TMP_MARKER};
use crate::security;
use std::fs;
use std::io::{ErrorKind, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// File mode for artifacts (owner read/write only).
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) const FILE_MODE: u32 = 0o600;

/// The internal shared state of a [`Storage`] instance.
#[derive(Debug)]
pub struct StorageInner {
    /// The canonicalized physical directory holding every artifact.
    pub(crate) root: PathBuf,
}

/// Process-wide temp name counter; handles on the same directory must never share a name.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Fresh temp names tried before a write gives up on `AlreadyExists`.
const TMP_ATTEMPTS: usize = 8;

/// A cheaply clonable handle to a storage directory.
///
/// - **Sandboxing**: artifact names are single file names; traversal is refused.
/// - **Atomic Writes**: unique temp file, `fsync`, then `rename` over the target.
/// - **Privacy**: files are created `0600`, the root directory `0700` (Unix).
/// - **Self-Healing**: stale temp files are removed when the storage is opened.
///
/// # Example
///
/// ```rust
/// use osprofiles_storage::{Storage, StorageError};
///
/// # fn main() -> Result<(), StorageError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// let storage = Storage::builder().root(tmp.path().join("profiles")).open()?;
///
/// storage.write("app.default.plaintext.json", br#"{"region":"eu"}"#)?;
/// assert!(storage.exists("app.default.plaintext.json")?);
/// assert_eq!(storage.read("app.default.plaintext.json")?, br#"{"region":"eu"}"#);
///
/// storage.delete("app.default.plaintext.json")?;
/// assert!(!storage.exists("app.default.plaintext.json")?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .open()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// The canonical storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves an artifact name to its physical path inside the root.
    ///
    /// # Errors
    /// [`StorageError::PathTraversalAttempt`] if `name` is not a plain file name or is a
    /// symlink leaving the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        security::resolve_artifact(&self.root, name)
    }

    /// Reads a whole artifact.
    ///
    /// # Errors
    /// * [`StorageError::FileNotFound`] if the artifact does not exist.
    /// * [`StorageError::PermissionDenied`] if it cannot be read.
    /// * [`StorageError::Io`] for other failures.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|e| StorageError::from_io(e, &path, "Read failed"))
    }

    /// Writes an artifact atomically.
    ///
    /// 1. Data goes to a unique temp file (`.osptmp.<pid>.<n>`) created with mode `0600`.
    /// 2. The temp file is synced to disk.
    /// 3. The temp file is renamed over the target; the directory is synced.
    ///
    /// A failed write leaves the previous artifact untouched and removes the temp file.
    ///
    /// # Errors
    /// * [`StorageError::PermissionDenied`] / [`StorageError::ReadOnly`] when the
    ///   directory refuses writes.
    /// * [`StorageError::Io`] for other failures (disk full, hardware fault).
    pub fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(name)?;
        let temp = Self::create_temp(&target, data)?;

        if let Err(err) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::from_io(err, &target, "Atomic swap failed"));
        }

        sync_dir(&self.root);
        debug!(path = %target.display(), bytes = data.len(), "Artifact saved atomically");
        Ok(())
    }

    /// Deletes an artifact.
    ///
    /// # Errors
    /// * [`StorageError::FileNotFound`] if the artifact does not exist.
    /// * [`StorageError::PermissionDenied`] / [`StorageError::ReadOnly`] /
    ///   [`StorageError::Io`] for other failures.
    pub fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).map_err(|e| StorageError::from_io(e, &path, "Delete failed"))?;
        debug!(path = %path.display(), "Artifact deleted");
        Ok(())
    }

    /// Deletes an artifact if present; returns whether something was removed.
    ///
    /// # Errors
    /// Same as [`Storage::delete`], except a missing artifact is `Ok(false)`.
    pub fn remove_if_exists(&self, name: &str) -> Result<bool, StorageError> {
        match self.delete(name) {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Checks whether an artifact exists.
    ///
    /// # Errors
    /// Only when `name` fails sandbox validation.
    pub fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(name)?.is_file())
    }

    /// Removes stale temp files; returns `(removed, failed)`.
    pub fn purge_tmp(&self) -> (usize, usize) {
        maintenance::purge_tmp(&self.root)
    }

    /// Temp names do not embed the target name, so they stay short for any valid artifact.
    fn unique_tmp_path(target: &Path) -> PathBuf {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        target.with_file_name(format!("{TMP_MARKER}{}.{counter}", std::process::id()))
    }

    /// Writes `data` into a freshly created temp file next to `target`.
    ///
    /// A name that already exists belongs to someone else: it is skipped, never removed.
    fn create_temp(target: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
        let mut attempt = 0;
        loop {
            let temp = Self::unique_tmp_path(target);
            match write_synced(&temp, data) {
                Ok(()) => return Ok(temp),
                Err(err) if err.kind() == ErrorKind::AlreadyExists && attempt + 1 < TMP_ATTEMPTS => {
                    debug!(path = %temp.display(), "Temp name taken, retrying");
                    attempt += 1;
                },
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    return Err(StorageError::from_io(err, &temp, "Temp write failed"));
                },
                Err(err) => {
                    let _ = fs::remove_file(&temp);
                    return Err(StorageError::from_io(err, &temp, "Temp write failed"));
                },
            }
        }
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn sync_dir(path: &Path) {
    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(path).and_then(|dir| dir.sync_all()) {
            warn!(path = %path.display(), error = %err, "Directory sync failed");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_names_are_unique_and_marked() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::builder().root(dir.path()).open().unwrap();
        let target = storage.root().join("a.json");

        let first = Storage::unique_tmp_path(&target);
        let second = Storage::unique_tmp_path(&target);
        assert_ne!(first, second);
        assert!(first.to_string_lossy().contains(TMP_MARKER));
    }
}
