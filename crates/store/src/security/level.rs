use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a field's value is allowed to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Encrypted at rest, key held in the credential store.
    Secure,
    /// Stored as readable JSON.
    #[default]
    Plaintext,
    /// Kept in memory for the lifetime of the store handle only.
    Temporary,
}

impl SecurityLevel {
    pub const ALL: [Self; 3] = [Self::Secure, Self::Plaintext, Self::Temporary];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Plaintext => "plaintext",
            Self::Temporary => "temporary",
        }
    }

    /// `true` if values at this level ever reach a persistent medium.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Temporary)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a textual tag, ignoring case and surrounding whitespace.
///
/// Unknown values are rejected rather than defaulted.
impl FromStr for SecurityLevel {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|level| level.as_str() == normalized).ok_or_else(|| {
            StoreError::SecurityLevel {
                message: format!("`{raw}` (expected secure, plaintext or temporary)").into(),
                context: None,
            }
        })
    }
}
