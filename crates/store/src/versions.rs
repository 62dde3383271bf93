//! Version markers written into record metadata.

/// Version of this library, recorded with every write.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Layout of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatVersion {
    /// Entries without layout information (in-memory store).
    Legacy,
    /// Whole record encrypted into a single file.
    SingleFile,
    /// Secure and plaintext fields in separate artifacts.
    Hybrid,
}

impl FormatVersion {
    pub const CURRENT: Self = Self::Hybrid;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "0.0",
            Self::SingleFile => "1.0",
            Self::Hybrid => "2.0",
        }
    }

    /// Parses a marker read back from metadata; unknown markers are `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0.0" => Some(Self::Legacy),
            "1.0" => Some(Self::SingleFile),
            "2.0" => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// `true` if data in this layout is older than [`FormatVersion::CURRENT`].
    #[must_use]
    pub fn is_outdated(self) -> bool {
        self < Self::CURRENT
    }
}
