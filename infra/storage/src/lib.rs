//! A small, sandboxed storage engine for profile artifacts.
//!
//! It wraps one flat directory and offers synchronous whole-file operations with the
//! protections a credential-adjacent store needs:
//!
//! - **Sandbox Security**: artifact names must be plain file names; symlinks escaping
//!   the root are refused.
//! - **Atomic Writes**: unique temp write, `fsync`, `rename`. Readers never see a
//!   partially written artifact.
//! - **Owner-only Permissions**: directories `0700`, files `0600` on Unix.
//! - **Error Classification**: permission and read-only failures are reported apart
//!   from generic I/O faults so callers can explain them.
//! - **Self-Healing**: orphaned temp files are removed when the storage is opened.
//!
//! Atomicity is per artifact. Writing several artifacts is not a transaction.

mod builder;
mod engine;
mod error;
mod maintenance;
mod security;

pub use builder::StorageBuilder;
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
