//! Attribute and capacity queries.

use std::path::Path;

use crate::{AccessMode, FsError, Metadata, StatFs};

/// Read-only queries about entries of the served namespace.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` so a
/// bridge can dispatch operations from several threads at once.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Get attributes for a path, without following a final symlink.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::Io`] for failures of the underlying `lstat`
    fn get_attr(&self, path: &Path) -> Result<Metadata, FsError>;

    /// Check whether the caller may access `path` with `mode`.
    ///
    /// # Errors
    ///
    /// - [`FsError::PermissionDenied`] if access is refused
    fn access(&self, path: &Path, mode: AccessMode) -> Result<(), FsError>;

    /// Get statistics of the filesystem holding `path`.
    fn stat_fs(&self, path: &Path) -> Result<StatFs, FsError>;
}
