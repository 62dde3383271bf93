//! Immutable store configuration.

use crate::driver::MemoryArena;
use crate::error::StoreError;
use crate::managed::{ManagedOverride, ManagedSource};
use osprofiles_keyring::{CredentialStore, SystemKeyring};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory name used next to the executable when no directory is configured.
pub const DEFAULT_DIRECTORY_NAME: &str = "profiles";

/// How secure fields are protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Secure fields are encrypted with a key held in the credential store.
    #[default]
    Keyring,
    /// No credential store; records with secure fields are refused.
    Insecure,
}

impl SecurityMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::Insecure => "insecure",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every driver.
///
/// Built once and passed by reference into driver constructors; drivers copy what they
/// need, so one configuration can open many records.
///
/// ```rust
/// use osprofiles_store::{SecurityMode, StoreConfig};
///
/// let config = StoreConfig::builder()
///     .directory("/tmp/profiles")
///     .security_mode(SecurityMode::Keyring)
///     .fallback(false)
///     .app_version("1.4.0")
///     .build();
///
/// assert!(!config.fallback());
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    directory: Option<PathBuf>,
    security_mode: SecurityMode,
    fallback: bool,
    app_version: Option<String>,
    managed: Option<ManagedOverride>,
    credentials: Arc<dyn CredentialStore>,
    memory: MemoryArena,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            security_mode: SecurityMode::Keyring,
            fallback: true,
            app_version: None,
            managed: None,
            credentials: Arc::new(SystemKeyring::new()),
            memory: MemoryArena::default(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    #[must_use]
    pub const fn security_mode(&self) -> SecurityMode {
        self.security_mode
    }

    /// Whether an unavailable credential store downgrades to [`SecurityMode::Insecure`].
    #[must_use]
    pub const fn fallback(&self) -> bool {
        self.fallback
    }

    #[must_use]
    pub fn app_version(&self) -> Option<&str> {
        self.app_version.as_deref()
    }

    #[must_use]
    pub fn managed(&self) -> Option<&ManagedOverride> {
        self.managed.as_ref()
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryArena {
        &self.memory
    }

    /// The configured directory, or `profiles/` next to the running executable.
    ///
    /// # Errors
    /// [`StoreError::Internal`] if the executable path cannot be determined.
    pub fn resolve_directory(&self) -> Result<PathBuf, StoreError> {
        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().map_err(|e| StoreError::Internal {
            message: e.to_string().into(),
            context: Some("Locating the executable for the default profile directory".into()),
        })?;
        let parent = exe.parent().ok_or_else(|| StoreError::Internal {
            message: "executable has no parent directory".into(),
            context: None,
        })?;
        Ok(parent.join(DEFAULT_DIRECTORY_NAME))
    }
}

/// Fluent builder for [`StoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub const fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.config.security_mode = mode;
        self
    }

    /// `false` makes an unavailable credential store a construction error (strict mode).
    #[must_use]
    pub const fn fallback(mut self, fallback: bool) -> Self {
        self.config.fallback = fallback;
        self
    }

    #[must_use]
    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app_version = Some(version.into());
        self
    }

    /// Consults `source` under `identifier` before local storage.
    #[must_use]
    pub fn managed(mut self, identifier: impl Into<String>, source: Arc<dyn ManagedSource>) -> Self {
        self.config.managed = Some(ManagedOverride::new(identifier, source));
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Shares an in-memory arena between memory-driver instances.
    #[must_use]
    pub fn memory(mut self, arena: MemoryArena) -> Self {
        self.config.memory = arena;
        self
    }

    #[must_use]
    pub fn build(self) -> StoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.security_mode(), SecurityMode::Keyring);
        assert!(config.fallback());
        assert!(config.directory().is_none());
        assert!(config.managed().is_none());
        assert!(config.resolve_directory().unwrap().ends_with(DEFAULT_DIRECTORY_NAME));
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&SecurityMode::Insecure).unwrap(), "\"insecure\"");
        let mode: SecurityMode = serde_json::from_str("\"keyring\"").unwrap();
        assert_eq!(mode, SecurityMode::Keyring);
    }
}
