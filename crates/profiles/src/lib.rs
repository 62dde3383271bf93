//! Client layer for the osprofiles storage engine.
//! Loads layered configuration and keeps a registry of named profiles on top of one driver.
//! Keep this crate thin: storage semantics live in `osprofiles-store`.
//!
//! ## Usage
//! - Load a [`ProfilesConfig`] with [`load_config`] (file plus `OSPROFILES__*` overrides).
//! - Open a [`ProfileRegistry`] from it and add, list, load or delete profiles.

pub mod config;
mod error;
mod registry;

pub use config::{ENV_PREFIX, LogConfig, ProfilesConfig, load_config, load_config_from};
pub use error::{ProfileError, ProfileErrorExt};
pub use osprofiles_keyring as keyring;
pub use osprofiles_store as store;
pub use registry::{
    GLOBAL_KEY, GlobalState, NamedProfile, PROFILE_KEY_PREFIX, ProfileHandle, ProfileRegistry,
    REGISTRY_VERSION, profile_store_key, validate_profile_name,
};
