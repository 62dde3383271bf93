use crate::error::VaultError;
use aead::{AeadInOut, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use getrandom::fill;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

// --- Aliases ---

pub type Aes = Aes256Gcm;
pub type ChaCha = ChaCha20Poly1305;

// --- Format constants ---

/// Symmetric key length in bytes (256-bit).
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (96-bit).
pub const NONCE_LEN: usize = 12;

/// AEAD tag length (128-bit).
pub const TAG_LEN: usize = 16;

mod private {
    pub trait Sealed {}
    impl Sealed for super::Aes {}
    impl Sealed for super::ChaCha {}
}

/// Supported AEAD ciphers, named the way they are recorded in record metadata.
pub trait VaultCipher: AeadInOut + KeyInit + private::Sealed + 'static {
    const ALGORITHM: &'static str;
}

impl VaultCipher for Aes {
    const ALGORITHM: &'static str = "AES-256-GCM";
}

impl VaultCipher for ChaCha {
    const ALGORITHM: &'static str = "CHACHA20-POLY1305";
}

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generates a fresh key from the system CSPRNG.
    ///
    /// # Errors
    /// [`VaultError::InvalidKey`] if the system RNG is unavailable.
    pub fn generate() -> Result<Self, VaultError> {
        let mut bytes = [0u8; KEY_LEN];
        fill(&mut bytes).map_err(|e| VaultError::InvalidKey {
            message: e.to_string().into(),
            context: Some("System RNG unavailable for key generation".into()),
        })?;
        Ok(Self(bytes))
    }

    /// Wraps existing key material.
    ///
    /// # Errors
    /// [`VaultError::InvalidKey`] if `bytes` is not exactly [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| VaultError::InvalidKey {
            message: format!("expected {KEY_LEN} bytes, got {}", bytes.len()).into(),
            context: None,
        })?;
        Ok(Self(array))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        let a = EncryptionKey::generate().unwrap();
        let b = EncryptionKey::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(EncryptionKey::from_slice(&[0u8; 16]).is_err());
        assert!(EncryptionKey::from_slice(&[7u8; KEY_LEN]).is_ok());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EncryptionKey::from_slice(&[0xAB; KEY_LEN]).unwrap();
        assert_eq!(format!("{key:?}"), "EncryptionKey(<redacted>)");
    }
}
