use crate::engine::{Storage, StorageInner};
use crate::error::StorageError;
use private::Sealed;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Directory mode for storage roots (owner only).
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) const DIR_MODE: u32 = 0o700;

#[derive(Debug, Clone, Copy)]
struct StorageConfig {
    create: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: StorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory for the storage engine"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        StorageBuilder { state: WithRoot(path.into()), config: self.config }
    }
}

impl StorageBuilder<WithRoot> {
    /// Consumes the configuration and opens the storage root.
    ///
    /// Boot sequence:
    /// 1. Creates the root with owner-only permissions if `create(true)` (the default).
    /// 2. Canonicalizes the root so later symlink checks compare physical paths.
    /// 3. Removes stale temp files left by interrupted writes. Cleanup failures are
    ///    logged and do not fail the open.
    ///
    /// # Errors
    ///
    /// * [`StorageError::FileNotFound`] if the root is missing and `create` is false.
    /// * [`StorageError::PermissionDenied`] / [`StorageError::ReadOnly`] if the root
    ///   cannot be created.
    /// * [`StorageError::Io`] for other filesystem failures.
    pub fn open(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;

        if self.config.create && !root.is_dir() {
            create_private_dir(root)?;
            info!(path = %root.display(), "Bootstrapped storage root directory");
        }

        let canonical = root
            .canonicalize()
            .map_err(|e| StorageError::from_io(e, root, "Resolving storage root"))?;

        let storage = Storage {
            inner: Arc::new(StorageInner { root: canonical }),
        };
        storage.purge_tmp();

        Ok(storage)
    }
}

fn create_private_dir(path: &Path) -> Result<(), StorageError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path).map_err(|e| StorageError::from_io(e, path, "Creating storage root"))
}
