//! # Vault Errors
//!
//! This module defines the [`VaultError`] enum used by the envelope cipher and the key manager.

use osprofiles_keyring::KeyringError;
use std::borrow::Cow;

/// A specialized [`VaultError`] enum for vault-related failures.
#[osprofiles_derive::osp_error]
pub enum VaultError {
    /// Failure during the encryption process.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Authentication failed while opening a blob.
    ///
    /// This means a wrong key or a tampered/corrupted blob.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The blob is too short to contain a nonce.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Key material has the wrong length or could not be produced.
    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No key is stored for a record that was expected to have one.
    #[error("Missing key{}: {message}", format_context(.context))]
    MissingKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The credential store failed for a reason other than "not found".
    #[error("Key storage error{}: {source}", format_context(.context))]
    Keyring { source: KeyringError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    /// Returns `true` when the record key is absent from the credential store.
    #[must_use]
    pub const fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}
