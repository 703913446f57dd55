//! Manifest discovery.

use std::path::{Path, PathBuf};

use super::{ConfigError, MANIFEST_NAME};

/// Locate the manifest governing `path`.
///
/// Checks `path` itself (when it names a manifest), then `path` and each of its ancestors for a `package.yml`.
/// Relative paths are resolved against the current directory first so that ancestors can be walked.
pub fn find_manifest(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.file_name().is_some_and(|n| n == MANIFEST_NAME) && path.is_file() {
        return Ok(path.to_path_buf());
    }

    let start = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    let start = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or(start)
    } else {
        start
    };

    for dir in start.ancestors() {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.is_file() {
            tracing::debug!(manifest = %candidate.display(), "found suite manifest");
            return Ok(candidate);
        }
    }
    Err(ConfigError::NotFound(path.to_path_buf()))
}
