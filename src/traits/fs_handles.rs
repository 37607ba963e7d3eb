//! Handle-based file operations.
//!
//! A kernel bridge opens a file once and then issues positioned reads and
//! writes against the returned [`Handle`]:
//!
//! 1. `open()` / `create()` - obtain a handle
//! 2. `read_at()` / `write_at()` - positioned I/O
//! 3. `release()` - close the handle
//!
//! # Example
//!
//! ```rust
//! use remapfs::{FsHandles, OpenFlags, FsError};
//! use std::path::Path;
//!
//! fn read_header<B: FsHandles>(backend: &B, path: &Path) -> Result<Vec<u8>, FsError> {
//!     let handle = backend.open(path, OpenFlags::READ)?;
//!     let mut header = vec![0u8; 16];
//!     let n = backend.read_at(handle, &mut header, 0);
//!     backend.release(handle)?;
//!     header.truncate(n?);
//!     Ok(header)
//! }
//! ```

use std::path::Path;

use crate::{FsError, Handle, OpenFlags};

/// Handle-based file operations.
///
/// Handles are owned by the façade between `open` and `release`; there is no
/// cross-request descriptor caching.
pub trait FsHandles: Send + Sync {
    /// Create a file with permission bits `mode` and open it for writing.
    ///
    /// # Errors
    ///
    /// - [`FsError::PermissionDenied`] if the namespace does not allow creation
    fn create(&self, path: &Path, mode: u32) -> Result<Handle, FsError>;

    /// Open a file and return a handle.
    ///
    /// # Errors
    ///
    /// - [`FsError::PermissionDenied`] if the path has no real counterpart
    /// - [`FsError::Io`] if the underlying `open` fails
    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Handle, FsError>;

    /// Read up to `buf.len()` bytes at `offset`; returns the byte count.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is not open
    fn read_at(&self, handle: Handle, buf: &mut [u8], offset: u64) -> Result<usize, FsError>;

    /// Write `data` at `offset`; returns the byte count.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is not open
    fn write_at(&self, handle: Handle, data: &[u8], offset: u64) -> Result<usize, FsError>;

    /// Flush buffered data of an open handle.
    fn flush(&self, handle: Handle) -> Result<(), FsError>;

    /// Sync an open handle's data (and metadata unless `data_only`).
    fn fsync(&self, handle: Handle, data_only: bool) -> Result<(), FsError>;

    /// Close the handle.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidHandle`] if the handle is not open
    fn release(&self, handle: Handle) -> Result<(), FsError>;
}
