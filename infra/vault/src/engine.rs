//! Envelope cipher producing self-contained `nonce || ciphertext || tag` blobs.

use aead::inout::InOutBuf;
use aead::{Key, Nonce};
use getrandom::fill;
use std::fmt;

use crate::error::VaultError;
use crate::types::{Aes, EncryptionKey, NONCE_LEN, TAG_LEN, VaultCipher};

/// Authenticated encryption bound to a single [`EncryptionKey`].
///
/// Every [`seal`](Self::seal) draws a fresh random nonce and prepends it to the output,
/// so the blob carries everything [`open`](Self::open) needs besides the key:
///
/// ```text
/// [NONCE(12)][CIPHERTEXT(N)][TAG(16)]
/// ```
///
/// There is no version byte or other header.
///
/// ```rust
/// use osprofiles_vault::{EncryptionKey, Envelope, VaultError};
///
/// # fn main() -> Result<(), VaultError> {
/// let key = EncryptionKey::generate()?;
/// let envelope: Envelope = Envelope::new(&key)?;
///
/// let blob = envelope.seal(br#"{"api_key":"k-123"}"#)?;
/// assert_eq!(envelope.open(&blob)?, br#"{"api_key":"k-123"}"#);
/// # Ok(())
/// # }
/// ```
pub struct Envelope<C = Aes>
where
    C: VaultCipher,
{
    cipher: C,
}

impl<C: VaultCipher> fmt::Debug for Envelope<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope").field("algorithm", &C::ALGORITHM).finish_non_exhaustive()
    }
}

impl<C: VaultCipher> Envelope<C> {
    /// Builds the cipher for `key`.
    ///
    /// # Errors
    /// [`VaultError::InvalidKey`] if the key does not fit the cipher.
    pub fn new(key: &EncryptionKey) -> Result<Self, VaultError> {
        let key = Key::<C>::try_from(&key.as_bytes()[..]).map_err(|_| VaultError::InvalidKey {
            message: "Key length does not match cipher".into(),
            context: Some(C::ALGORITHM.into()),
        })?;
        Ok(Self { cipher: C::new(&key) })
    }

    /// Name of the algorithm, as written into record metadata.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        C::ALGORITHM
    }

    fn next_nonce() -> Result<Nonce<C>, VaultError> {
        let mut nonce = Nonce::<C>::default();
        fill(&mut nonce).map_err(|e| VaultError::Encryption {
            message: e.to_string().into(),
            context: Some("System RNG unavailable for nonce generation".into()),
        })?;
        Ok(nonce)
    }

    /// Encrypts `plaintext` under a fresh nonce.
    ///
    /// # Errors
    /// [`VaultError::Encryption`] if the RNG or the AEAD primitive fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Self::next_nonce()?;

        let mut buf = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(plaintext);

        let (_nonce_part, data_part) = buf.split_at_mut(nonce.len());
        let tag = self
            .cipher
            .encrypt_inout_detached(&nonce, &[], InOutBuf::from(data_part))
            .map_err(|_| VaultError::Encryption {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            })?;

        buf.extend_from_slice(tag.as_slice());
        Ok(buf)
    }

    /// Authenticates and decrypts a blob produced by [`seal`](Self::seal).
    ///
    /// # Errors
    /// * [`VaultError::InvalidPayload`] if the blob is shorter than the nonce.
    /// * [`VaultError::Decryption`] if authentication fails (wrong key, tampering, truncation).
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, VaultError> {
        if blob.len() < NONCE_LEN {
            return Err(VaultError::InvalidPayload {
                message: format!(
                    "Ciphertext too short ({} bytes), nonce alone needs {NONCE_LEN}",
                    blob.len()
                )
                .into(),
                context: None,
            });
        }

        let (nonce_slice, sealed) = blob.split_at(NONCE_LEN);
        if sealed.len() < TAG_LEN {
            return Err(VaultError::Decryption {
                message: "Decryption failed".into(),
                context: Some("Authentication tag missing".into()),
            });
        }
        let (ciphertext, tag_slice) = sealed.split_at(sealed.len() - TAG_LEN);

        let nonce = nonce_slice.try_into().map_err(|_| VaultError::Decryption {
            message: "Invalid nonce length".into(),
            context: None,
        })?;
        let tag = tag_slice.try_into().map_err(|_| VaultError::Decryption {
            message: "Invalid tag length".into(),
            context: None,
        })?;

        let mut buf = ciphertext.to_vec();
        self.cipher.decrypt_inout_detached(&nonce, &[], InOutBuf::from(&mut buf[..]), &tag).map_err(
            |_| VaultError::Decryption {
                message: "Decryption failed".into(),
                context: Some("AEAD authentication failed".into()),
            },
        )?;

        Ok(buf)
    }
}
