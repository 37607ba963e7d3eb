//! Symlink and hard link operations.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Symlink and hard link operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLink`.
pub trait FsLink: Send + Sync {
    /// Read the target of a symbolic link.
    ///
    /// Absolute targets pointing into the served tree are returned relative
    /// to it, so clients do not escape the mount.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `path` does not exist
    /// - [`FsError::Io`] if `path` is not a symlink
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// `target` is stored verbatim and does not need to exist.
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError>;

    /// Create a hard link at `link` to the existing `original`.
    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError>;
}
