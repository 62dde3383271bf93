use std::borrow::Cow;
use std::io;
use std::path::Path;

/// A specialized [`StorageError`] enum of this crate.
#[osprofiles_derive::osp_error]
pub enum StorageError {
    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The operating system refused access to the artifact or its directory.
    #[error("Permission denied{}: {message}", format_context(.context))]
    PermissionDenied { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The storage location is mounted or flagged read-only.
    #[error("Read-only location{}: {message}", format_context(.context))]
    ReadOnly { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: io::Error, context: Option<Cow<'static, str>> },
}

impl StorageError {
    /// Maps an I/O failure on `path` onto the most specific variant.
    pub(crate) fn from_io(err: io::Error, path: &Path, action: &'static str) -> Self {
        let target: Cow<'static, str> = path.display().to_string().into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { message: target, context: Some(action.into()) },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                message: format!("{target}: {err}").into(),
                context: Some(action.into()),
            },
            io::ErrorKind::ReadOnlyFilesystem => Self::ReadOnly {
                message: format!("{target}: {err}").into(),
                context: Some(action.into()),
            },
            _ => Self::Io { source: err, context: Some(format!("{action}: {target}").into()) },
        }
    }

    /// `true` for permission and read-only failures.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::ReadOnly { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}
