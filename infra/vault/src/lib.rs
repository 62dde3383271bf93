//! Envelope encryption and key management for profile records.
//!
//! ## Blob Format
//!
//! [`Envelope::seal`] produces a self-contained blob:
//!
//! ```text
//! [NONCE(12)][CIPHERTEXT(N)][TAG(16)]
//! ```
//!
//! There is no header or version byte; the algorithm is recorded next to the blob
//! (in record metadata) rather than inside it.
//!
//! ## Nonce Policy
//!
//! Every seal draws a **random 96-bit nonce** from the system CSPRNG. Keys are per
//! record and records are rewritten rarely, so the probabilistic bound is far away.
//!
//! ## Key Management
//!
//! [`KeyManager`] stores one 256-bit key per `(identifier, record_key)` pair in a
//! [`CredentialStore`](osprofiles_keyring::CredentialStore). A missing key is generated on
//! first use; any other credential store failure is surfaced instead of silently
//! generating a replacement key that could never open existing blobs.
//!
//! ```rust
//! use osprofiles_keyring::MemoryKeyring;
//! use osprofiles_vault::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), VaultError> {
//! let keys = KeyManager::new(Arc::new(MemoryKeyring::new()));
//! let key = keys.get_or_create("urn.osprofiles.demo.profile.v1", "default")?;
//!
//! let envelope = Envelope::<Aes>::new(&key)?;
//! let blob = envelope.seal(b"top secret")?;
//! assert_eq!(envelope.open(&blob)?, b"top secret");
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod keys;
mod types;

pub use engine::Envelope;
pub use error::{VaultError, VaultErrorExt};
pub use keys::KeyManager;
pub use types::{EncryptionKey, KEY_LEN, NONCE_LEN, TAG_LEN};

pub mod prelude {
    pub use crate::engine::Envelope;
    pub use crate::error::{VaultError, VaultErrorExt};
    pub use crate::keys::KeyManager;
    pub use crate::types::{Aes, ChaCha, EncryptionKey};
}

pub mod algorithms {
    pub use crate::types::{Aes, ChaCha, VaultCipher};
}
