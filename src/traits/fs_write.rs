//! Mutating operations on paths.

use std::path::Path;
use std::time::SystemTime;

use crate::FsError;

/// Mutating operations addressed by path.
///
/// Cache-backed namespaces refuse the structural operations (`rename`,
/// `unlink`, `mknod`) with [`FsError::PermissionDenied`].
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Rename/move a file or directory.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Remove a file or symlink.
    fn unlink(&self, path: &Path) -> Result<(), FsError>;

    /// Change permission bits.
    fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError>;

    /// Change ownership; `None` leaves that id unchanged.
    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError>;

    /// Set access and modification times; `None` means "now".
    fn set_times(
        &self,
        path: &Path,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> Result<(), FsError>;

    /// Truncate or extend a file to `size` bytes.
    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError>;

    /// Create a filesystem node (regular file, FIFO, device).
    fn mknod(&self, path: &Path, mode: u32, dev: u64) -> Result<(), FsError>;
}
