use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Resolves a flat artifact name inside `root`.
///
/// Artifact names are single path components: separators, `.`/`..` and absolute paths
/// are rejected before touching the filesystem. An existing entry is canonicalized so a
/// symlink pointing outside the root is refused as well.
pub(crate) fn resolve_artifact(root: &Path, name: &str) -> Result<PathBuf, StorageError> {
    let candidate = Path::new(name);
    let mut components = candidate.components();

    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if name.is_empty() || !single {
        return Err(StorageError::PathTraversalAttempt {
            message: name.to_owned().into(),
            context: Some("Artifact names must be a single file name".into()),
        });
    }

    let joined = root.join(candidate);
    match joined.symlink_metadata() {
        Ok(meta) if meta.file_type().is_symlink() => {
            let target = joined
                .canonicalize()
                .map_err(|e| StorageError::from_io(e, &joined, "Resolving symlinked artifact"))?;
            if target.starts_with(root) {
                Ok(joined)
            } else {
                Err(StorageError::PathTraversalAttempt {
                    message: target.display().to_string().into(),
                    context: Some("Artifact symlink points outside the storage root".into()),
                })
            }
        },
        _ => Ok(joined),
    }
}
