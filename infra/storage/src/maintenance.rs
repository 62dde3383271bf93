use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

pub(crate) const TMP_MARKER: &str = ".osptmp.";
const STALE_AFTER: Duration = Duration::from_secs(300);

/// Removes temp files abandoned by interrupted writes.
///
/// Only direct children of `root` are inspected; artifacts never live deeper.
pub(crate) fn purge_tmp(root: &Path) -> (usize, usize) {
    let now = SystemTime::now();
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| is_tmp(entry) && is_stale(entry, now))
        .for_each(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "Stale temp file removal failed");
                failed += 1;
            },
        });

    if removed > 0 || failed > 0 {
        info!(removed, failed, "Cleaned up temporary files");
    }
    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .map_or(true, |age| age > STALE_AFTER)
}
