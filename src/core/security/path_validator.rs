use std::io;
use std::path::{Path, PathBuf};

use crate::core::config::SecurityConfig;

/// Errors raised when a tool-supplied path fails the security policy.
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' points outside allowed root directory")]
    SymlinkOutsideRoot { path: PathBuf },

    #[error("Symlinks are not allowed: '{path}'")]
    SymlinkNotAllowed { path: PathBuf },

    #[error("Path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Resolve `input_path` to a canonical path that satisfies `policy`.
///
/// With no configured root, the path only has to exist. With a root, the
/// canonical path (after following `..` and symlinks) must start with the
/// canonical root.
pub fn validate_path(input_path: &str, policy: &SecurityConfig) -> Result<PathBuf, PathSecurityError> {
    let path = Path::new(input_path);

    if path.is_symlink() && !policy.allow_symlinks {
        return Err(PathSecurityError::SymlinkNotAllowed {
            path: path.to_path_buf(),
        });
    }

    let canonical = canonicalize(path)?;

    let Some(root) = policy.root_path.as_deref() else {
        return Ok(canonical);
    };
    let canonical_root = canonicalize(root)?;

    if canonical.starts_with(&canonical_root) {
        return Ok(canonical);
    }

    if path.is_symlink() {
        Err(PathSecurityError::SymlinkOutsideRoot {
            path: path.to_path_buf(),
        })
    } else {
        Err(PathSecurityError::OutsideRootDirectory {
            path: canonical,
            root: canonical_root,
        })
    }
}

/// Like [`validate_path`], but the target must also be a directory.
pub fn validate_directory(
    input_path: &str,
    policy: &SecurityConfig,
) -> Result<PathBuf, PathSecurityError> {
    let path = validate_path(input_path, policy)?;
    if !path.is_dir() {
        return Err(PathSecurityError::NotADirectory { path });
    }
    Ok(path)
}

fn canonicalize(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|error| {
        if error.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::IoError {
                path: path.to_path_buf(),
                error,
            }
        }
    })
}
