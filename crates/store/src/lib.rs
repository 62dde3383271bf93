//! # Hybrid Security Profile Storage
//!
//! Stores application profiles on the local machine, splitting each record by the
//! declared sensitivity of its fields:
//!
//! | Level | Where it lives |
//! |-------|----------------|
//! | `secure` | encrypted at rest, per-record key in the OS credential store |
//! | `plaintext` | readable JSON next to it |
//! | `temporary` | memory of the store handle, never persisted |
//!
//! Records declare their fields with [`profile_model`]; the classification table is
//! generated at compile time. Five interchangeable backends implement the [`Store`]
//! contract and [`Driver`] picks one at construction.
//!
//! ```rust
//! use osprofiles_keyring::MemoryKeyring;
//! use osprofiles_store::{Driver, DriverKind, Store, StoreConfig, profile_model};
//! use std::sync::Arc;
//!
//! #[profile_model]
//! #[derive(Clone, Default, PartialEq)]
//! pub struct ServiceProfile {
//!     pub name: String,
//!     #[security(secure)]
//!     pub api_key: String,
//!     #[security(temporary)]
//!     pub session: String,
//! }
//!
//! # fn main() -> Result<(), osprofiles_store::StoreError> {
//! # let dir = tempfile::tempdir().unwrap();
//! let config = StoreConfig::builder()
//!     .directory(dir.path())
//!     .credentials(Arc::new(MemoryKeyring::new()))
//!     .build();
//!
//! let mut store = Driver::open(DriverKind::Hybrid, "demo", "prod", &config)?;
//! store.set(&ServiceProfile { name: "prod".into(), api_key: "sk-123".into(), session: "tmp".into() })?;
//!
//! let reopened = Driver::open(DriverKind::Hybrid, "demo", "prod", &config)?;
//! let profile: ServiceProfile = reopened.get_record()?;
//! assert_eq!(profile.api_key, "sk-123");
//! assert!(profile.session.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Concurrency: no locking across processes; last writer wins. A store handle is not
//! synchronized internally.

extern crate self as osprofiles_store;

mod config;
mod driver;
mod error;
mod identity;
mod managed;
mod metadata;
mod platform;
mod security;
mod versions;

pub use config::{DEFAULT_DIRECTORY_NAME, SecurityMode, StoreConfig, StoreConfigBuilder};
pub use driver::{
    Driver, DriverKind, FileStore, HybridStore, KeyringStore, MemoryArena, MemoryStore,
    PlainFileStore, Store,
};
pub use error::{StoreError, StoreErrorExt};
pub use identity::{Artifact, MAX_FILE_NAME_LEN, RecordId, build_urn, validate_namespace_key};
pub use managed::{ManagedDirectory, ManagedOverride, ManagedSource};
pub use metadata::{LegacyMetadata, MemoryMetadata, RecordMetadata};
pub use osprofiles_derive::profile_model;
pub use platform::{AppDirectories, Os, TEST_BASE_PATH_ENV};
pub use security::{
    Classification, Classified, FieldAssignment, FieldInfo, FieldSpec, SENSITIVE_KEYWORDS,
    SecurityLevel, SecurityReport, SplitData, assign_fields, check_security_compliance, classify,
    combine_split_data, generate_security_report, persistent_json, split_record,
    validate_classification,
};
pub use versions::{FormatVersion, LIBRARY_VERSION};

/// Re-exports used by code generated with [`profile_model`].
#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}

pub mod prelude {
    pub use crate::{
        Classified, Driver, DriverKind, HybridStore, SecurityLevel, SecurityMode, Store,
        StoreConfig, StoreError, StoreErrorExt, profile_model,
    };
}
