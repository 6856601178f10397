//! Path canonicalization and root-relative key conversion

use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Canonicalize a directory path (resolves symlinks, `..`, `.`).
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, StorageError> {
    // Use dunce for cross-platform canonicalization
    dunce::canonicalize(path)
        .map_err(|e| StorageError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e)))
}

/// Make a tracked path absolute without following the leaf.
///
/// The parent directory is canonicalized when it exists so keys agree with
/// the canonical root; the final component is kept as-is so a symlink is
/// identified by its own location, not its target.
pub fn absolutize(path: &Path) -> Result<PathBuf, StorageError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize_lexically(&absolute);

    match (normalized.parent(), normalized.file_name()) {
        (Some(parent), Some(name)) => match dunce::canonicalize(parent) {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(normalized),
        },
        _ => Ok(normalized),
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pops past the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Convert an absolute path under `root` into its stored key (`/`-separated).
pub fn to_relative_key(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::InvalidPath(format!("{:?} is not under root {:?}", path, root))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str().ok_or_else(|| {
                StorageError::InvalidPath(format!("Non-UTF-8 path component in {:?}", path))
            })?),
            _ => {
                return Err(StorageError::InvalidPath(format!(
                    "Unexpected component in {:?}",
                    path
                )))
            }
        }
    }

    if parts.is_empty() {
        return Err(StorageError::InvalidPath(format!(
            "{:?} is the root itself",
            path
        )));
    }
    Ok(parts.join("/"))
}

/// Convert a stored key back into an absolute path under `root`.
///
/// Returns `None` for keys that would escape the root.
pub fn from_relative_key(root: &Path, key: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    let mut pushed = false;
    for part in key.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            name => {
                path.push(name);
                pushed = true;
            }
        }
    }
    if Path::new(key).has_root() || !pushed {
        return None;
    }
    Some(path)
}
