//! # Store Errors
//!
//! [`StoreError`] groups the failure kinds of the engine: validation, availability,
//! cryptography, I/O and security-mode violations.

use osprofiles_keyring::KeyringError;
use osprofiles_storage::StorageError;
use osprofiles_vault::VaultError;
use std::borrow::Cow;

/// A specialized [`StoreError`] enum of this crate.
#[osprofiles_derive::osp_error]
pub enum StoreError {
    #[error("Invalid namespace{}: {message}", format_context(.context))]
    NamespaceInvalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid key{}: {message}", format_context(.context))]
    KeyInvalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The artifact file name derived from namespace and key is too long.
    #[error("Name too long{}: {message}", format_context(.context))]
    LengthExceeded { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid security level{}: {message}", format_context(.context))]
    SecurityLevel { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The value could not be classified field by field.
    #[error("Classification error{}: {message}", format_context(.context))]
    Classification { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Field classified more than once{}: {message}", format_context(.context))]
    DuplicateField { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The credential store is required (strict mode) but cannot be used.
    #[error("Keyring unavailable{}: {message}", format_context(.context))]
    KeyringUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Secure data was written or read while running without a credential store.
    #[error("Security mode violation{}: {message}", format_context(.context))]
    SecurityMode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Record not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Cryptographic failure{}: {source}", format_context(.context))]
    Crypto { source: VaultError, context: Option<Cow<'static, str>> },

    #[error("Credential store failure{}: {source}", format_context(.context))]
    Keyring { source: KeyringError, context: Option<Cow<'static, str>> },

    #[error("Storage failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    /// A write was refused while a managed configuration controls the record.
    #[error("Record is managed remotely and cannot be modified{}: {message}", format_context(.context))]
    ManagedConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage location is read-only{}: {message}", format_context(.context))]
    ReadOnly { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// The data artifacts were written but the metadata artifact was not.
    #[error("Metadata write failed after data was stored{}: {source}", format_context(.context))]
    Metadata { source: Box<StoreError>, context: Option<Cow<'static, str>> },

    /// Several independent cleanup steps failed.
    #[error("Cleanup incomplete{}: {}", format_context(.context), join_errors(.errors))]
    Cleanup { errors: Vec<StoreError>, context: Option<Cow<'static, str>> },

    #[error("Internal store error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn join_errors(errors: &[StoreError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl StoreError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// `true` for the identifier validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NamespaceInvalid { .. } | Self::KeyInvalid { .. } | Self::LengthExceeded { .. }
        )
    }

    /// `true` when an encrypted artifact exists but its key is gone from the credential store.
    #[must_use]
    pub const fn is_missing_key(&self) -> bool {
        matches!(self, Self::Crypto { source, .. } if source.is_missing_key())
    }

    /// Collapses a list of independent failures into one error, if any occurred.
    pub(crate) fn collect(mut errors: Vec<Self>) -> Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Cleanup { errors, context: None }),
        }
    }
}
