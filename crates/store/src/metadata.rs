//! Descriptive sidecars. Metadata never holds field values.

use crate::config::SecurityMode;
use crate::versions::{FormatVersion, LIBRARY_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sidecar of a hybrid record (`.metadata.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub profile_name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub security_mode: SecurityMode,
    pub has_secure_data: bool,
    pub has_plaintext_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_alg: Option<String>,
    /// Namespace URN the record was written under.
    pub version: String,
    pub library_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    pub profile_format_version: String,
}

/// Inputs for one metadata write.
#[derive(Debug, Clone)]
pub(crate) struct MetadataDraft<'a> {
    pub profile_name: &'a str,
    pub urn: &'a str,
    pub security_mode: SecurityMode,
    pub has_secure_data: bool,
    pub has_plaintext_data: bool,
    pub encryption_alg: Option<&'a str>,
    pub app_version: Option<&'a str>,
}

impl RecordMetadata {
    /// Metadata for a write happening `now`, keeping `created_at` from `previous`.
    pub(crate) fn build(
        draft: &MetadataDraft<'_>,
        previous: Option<&Self>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            profile_name: draft.profile_name.to_owned(),
            created_at: previous.map_or(now, |p| p.created_at),
            last_modified: now,
            security_mode: draft.security_mode,
            has_secure_data: draft.has_secure_data,
            has_plaintext_data: draft.has_plaintext_data,
            encryption_alg: draft.encryption_alg.map(str::to_owned),
            version: draft.urn.to_owned(),
            library_version: LIBRARY_VERSION.to_owned(),
            app_version: draft.app_version.map(str::to_owned),
            profile_format_version: FormatVersion::Hybrid.as_str().to_owned(),
        }
    }

    #[must_use]
    pub fn format_version(&self) -> Option<FormatVersion> {
        FormatVersion::parse(&self.profile_format_version)
    }
}

/// Sidecar of a single-file encrypted record (`.nfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMetadata {
    pub profile_name: String,
    pub created_at: DateTime<Utc>,
    pub encryption_alg: String,
    pub version: String,
    #[serde(default = "single_file_format")]
    pub profile_format_version: String,
}

fn single_file_format() -> String {
    FormatVersion::SingleFile.as_str().to_owned()
}

impl LegacyMetadata {
    pub(crate) fn build(profile_name: &str, urn: &str, algorithm: &str, now: DateTime<Utc>) -> Self {
        Self {
            profile_name: profile_name.to_owned(),
            created_at: now,
            encryption_alg: algorithm.to_owned(),
            version: urn.to_owned(),
            profile_format_version: single_file_format(),
        }
    }
}

/// Bookkeeping kept beside in-memory entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub profile_name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub library_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    pub profile_format_version: String,
}

impl MemoryMetadata {
    pub(crate) fn new(profile_name: &str, app_version: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            profile_name: profile_name.to_owned(),
            created_at: now,
            last_modified: now,
            library_version: LIBRARY_VERSION.to_owned(),
            app_version: app_version.map(str::to_owned),
            profile_format_version: FormatVersion::Legacy.as_str().to_owned(),
        }
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }
}
