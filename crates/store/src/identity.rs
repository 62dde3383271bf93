//! Validated `(namespace, key)` identifiers and the artifact names derived from them.

use crate::error::StoreError;
use std::fmt;

/// Product segment of every URN.
pub const PRODUCT: &str = "osprofiles";

/// Layout version segment of every URN.
pub const URN_VERSION: &str = "v1";

/// Longest file name an artifact may have.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// The on-disk artifacts a record can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Encrypted secure-field map (hybrid).
    Secure,
    /// Readable plaintext-field map (hybrid).
    Plaintext,
    /// Hybrid metadata sidecar.
    Metadata,
    /// Whole record, encrypted (legacy single-file layout).
    Encrypted,
    /// Legacy metadata sidecar.
    LegacyMetadata,
    /// Whole record as readable JSON (plain-file driver).
    Json,
}

impl Artifact {
    pub const ALL: [Self; 6] = [
        Self::Secure,
        Self::Plaintext,
        Self::Metadata,
        Self::Encrypted,
        Self::LegacyMetadata,
        Self::Json,
    ];

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Secure => ".secure.enc",
            Self::Plaintext => ".plaintext.json",
            Self::Metadata => ".metadata.json",
            Self::Encrypted => ".enc",
            Self::LegacyMetadata => ".nfo",
            Self::Json => ".json",
        }
    }

    fn longest_suffix() -> usize {
        Self::ALL.iter().map(|a| a.suffix().len()).max().unwrap_or_default()
    }
}

/// A validated record address.
///
/// Construction checks both parts and the length of every artifact name, so no driver
/// performs I/O with an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    namespace: String,
    key: String,
    urn: String,
}

impl RecordId {
    /// # Errors
    /// [`StoreError::NamespaceInvalid`], [`StoreError::KeyInvalid`] or
    /// [`StoreError::LengthExceeded`].
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Result<Self, StoreError> {
        let namespace = namespace.into();
        let key = key.into();
        validate_namespace_key(&namespace, &key)?;

        let urn = build_urn(&namespace);
        Ok(Self { namespace, key, urn })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `urn.osprofiles.<namespace>.profile.v1`; also the credential-store service for
    /// per-record encryption keys.
    #[must_use]
    pub fn urn(&self) -> &str {
        &self.urn
    }

    /// `<urn>.<key>`, the common stem of every artifact.
    #[must_use]
    pub fn base_name(&self) -> String {
        format!("{}.{}", self.urn, self.key)
    }

    #[must_use]
    pub fn artifact(&self, artifact: Artifact) -> String {
        format!("{}.{}{}", self.urn, self.key, artifact.suffix())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.key)
    }
}

#[must_use]
pub fn build_urn(namespace: &str) -> String {
    format!("urn.{PRODUCT}.{namespace}.profile.{URN_VERSION}")
}

/// Checks `namespace` and `key` without building a [`RecordId`].
///
/// # Errors
/// * [`StoreError::NamespaceInvalid`] / [`StoreError::KeyInvalid`] for empty values or
///   characters outside `[A-Za-z0-9_-]` and internal periods.
/// * [`StoreError::LengthExceeded`] if the longest artifact file name exceeds
///   [`MAX_FILE_NAME_LEN`].
pub fn validate_namespace_key(namespace: &str, key: &str) -> Result<(), StoreError> {
    if let Err(reason) = check_segment(namespace) {
        return Err(StoreError::NamespaceInvalid { message: reason.into(), context: Some(quoted(namespace)) });
    }
    if let Err(reason) = check_segment(key) {
        return Err(StoreError::KeyInvalid { message: reason.into(), context: Some(quoted(key)) });
    }

    let longest = build_urn(namespace).len() + 1 + key.len() + Artifact::longest_suffix();
    if longest > MAX_FILE_NAME_LEN {
        return Err(StoreError::LengthExceeded {
            message: format!("artifact file name would be {longest} characters, limit is {MAX_FILE_NAME_LEN}")
                .into(),
            context: None,
        });
    }

    Ok(())
}

fn quoted(value: &str) -> std::borrow::Cow<'static, str> {
    format!("`{value}`").into()
}

fn check_segment(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("value cannot be empty");
    }
    if value.starts_with('.') || value.ends_with('.') {
        return Err("value cannot start or end with a period");
    }
    if value.contains("..") {
        return Err("value cannot contain consecutive periods");
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err("value contains invalid characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_examples() {
        assert!(matches!(
            validate_namespace_key("", "key"),
            Err(StoreError::NamespaceInvalid { .. })
        ));
        assert!(matches!(
            validate_namespace_key("a.", "key"),
            Err(StoreError::NamespaceInvalid { .. })
        ));
        assert!(matches!(validate_namespace_key("ns", ""), Err(StoreError::KeyInvalid { .. })));
        assert!(matches!(
            validate_namespace_key("ns", "bad/key"),
            Err(StoreError::KeyInvalid { .. })
        ));
        assert!(validate_namespace_key("ok-name", "ok_key").is_ok());
        assert!(validate_namespace_key("com.example.app", "default").is_ok());
    }

    #[test]
    fn test_period_rules() {
        for bad in [".lead", "trail.", "dou..ble", "."] {
            assert!(validate_namespace_key(bad, "k").is_err(), "{bad}");
        }
    }

    #[test]
    fn test_length_limit_uses_longest_artifact() {
        let ns = "n";
        let stem = build_urn(ns).len() + 1;
        let fits = "k".repeat(MAX_FILE_NAME_LEN - stem - ".plaintext.json".len());
        let id = RecordId::new(ns, fits.clone()).unwrap();
        assert_eq!(id.artifact(Artifact::Plaintext).len(), MAX_FILE_NAME_LEN);

        let too_long = format!("{fits}k");
        assert!(matches!(
            validate_namespace_key(ns, &too_long),
            Err(StoreError::LengthExceeded { .. })
        ));
    }

    #[test]
    fn test_artifact_names() {
        let id = RecordId::new("demo", "default").unwrap();
        assert_eq!(id.urn(), "urn.osprofiles.demo.profile.v1");
        assert_eq!(id.artifact(Artifact::Secure), "urn.osprofiles.demo.profile.v1.default.secure.enc");
        assert_eq!(id.artifact(Artifact::LegacyMetadata), "urn.osprofiles.demo.profile.v1.default.nfo");
        assert_eq!(id.to_string(), "demo/default");
    }
}
