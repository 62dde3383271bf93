//! Layered configuration for binaries built on the profile registry.

use config::{Config, Environment, File};
use osprofiles_store::{DriverKind, SecurityMode, StoreConfig, StoreConfigBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ProfileError, ProfileErrorExt};

/// Prefix of environment overrides, e.g. `OSPROFILES__DRIVER=memory`.
pub const ENV_PREFIX: &str = "OSPROFILES";

const DEFAULT_NAMESPACE: &str = "osprofiles";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Everything a binary needs to open a [`ProfileRegistry`](crate::ProfileRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Application namespace; becomes part of every record identifier.
    pub namespace: String,
    /// Storage root for file-backed drivers. Defaults next to the executable.
    pub directory: Option<PathBuf>,
    pub driver: DriverKind,
    pub security_mode: SecurityMode,
    /// Continue in insecure mode when the credential store is unreachable.
    pub fallback: bool,
    pub app_version: Option<String>,
    pub log: LogConfig,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            directory: None,
            driver: DriverKind::default(),
            security_mode: SecurityMode::default(),
            fallback: true,
            app_version: None,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_owned(), directory: None, json: false }
    }
}

impl ProfilesConfig {
    /// A store configuration builder pre-filled from these settings.
    ///
    /// Credentials default to the OS keyring; override them on the returned builder.
    #[must_use]
    pub fn store_builder(&self) -> StoreConfigBuilder {
        let mut builder = StoreConfig::builder()
            .security_mode(self.security_mode)
            .fallback(self.fallback);
        if let Some(directory) = &self.directory {
            builder = builder.directory(directory);
        }
        if let Some(version) = &self.app_version {
            builder = builder.app_version(version);
        }
        builder
    }

    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        self.store_builder().build()
    }
}

/// Loads [`ProfilesConfig`] from an optional file overlaid with the process environment.
///
/// Layers, later wins:
/// 1. Built-in defaults.
/// 2. **File** at `path` (format from the extension: TOML, JSON, YAML...). Must exist when given.
/// 3. **Environment** variables prefixed with `OSPROFILES__`; nested keys use `__`
///    (`OSPROFILES__LOG__LEVEL=debug` maps to `log.level`).
///
/// # Errors
/// [`ProfileError::Config`] if the file is missing or unreadable, or a value does not fit.
///
/// # Example
/// ```rust
/// use osprofiles::load_config;
///
/// let config = load_config(None).unwrap_or_default();
/// assert!(!config.namespace.is_empty());
/// ```
pub fn load_config(path: Option<&Path>) -> Result<ProfilesConfig, ProfileError> {
    load_config_from(path, None)
}

/// [`load_config`] with an explicit environment map in place of the process environment.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_from(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<ProfilesConfig, ProfileError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        info!("Loading config from {}", path.display());
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").source(env))
        .build()
        .context("Failed to build config")?
        .try_deserialize::<ProfilesConfig>()
        .context("Failed to deserialize config")
}
