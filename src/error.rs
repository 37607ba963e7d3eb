//! Error types for configuration and filesystem operations.

use std::path::{Path, PathBuf};

use rustix::io::Errno;

use crate::Handle;

/// Filesystem operation error, as seen at the kernel-bridge boundary.
///
/// Every variant maps to an errno through [`FsError::errno`], so a binding
/// can reply to the kernel without inspecting the variant itself.
///
/// # Examples
///
/// ```rust
/// use remapfs::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("/missing") };
/// assert_eq!(err.to_string(), "not found: /missing");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist in the served namespace.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Permission denied for operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    /// File handle is invalid or already released.
    #[error("invalid handle: {}", handle.0)]
    InvalidHandle {
        /// The invalid handle.
        handle: Handle,
    },

    /// Invalid data encountered.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: PathBuf,
        /// Details about the invalid data.
        details: String,
    },

    /// I/O error from the underlying filesystem, kept verbatim.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The real path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Build a closure wrapping an [`std::io::Error`] into [`FsError::Io`].
    ///
    /// Intended for `map_err` on `std::fs` and `rustix` calls:
    ///
    /// ```rust
    /// use remapfs::FsError;
    /// use std::path::Path;
    ///
    /// let path = Path::new("/definitely/not/here");
    /// let err = std::fs::metadata(path)
    ///     .map_err(FsError::io("get_attr", path))
    ///     .unwrap_err();
    /// assert!(matches!(err, FsError::Io { operation: "get_attr", .. }));
    /// ```
    pub fn io<'a, E>(operation: &'static str, path: &'a Path) -> impl FnOnce(E) -> FsError + 'a
    where
        E: Into<std::io::Error>,
    {
        move |source| FsError::Io {
            operation,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// Shorthand for [`FsError::PermissionDenied`].
    pub fn denied(operation: &'static str, path: &Path) -> FsError {
        FsError::PermissionDenied {
            path: path.to_path_buf(),
            operation,
        }
    }

    /// The errno a kernel bridge should reply with for this error.
    ///
    /// Pass-through I/O failures keep the raw OS error of the real call.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => Errno::NOENT.raw_os_error(),
            FsError::NotADirectory { .. } => Errno::NOTDIR.raw_os_error(),
            FsError::PermissionDenied { .. } => Errno::ACCESS.raw_os_error(),
            FsError::InvalidHandle { .. } => Errno::BADF.raw_os_error(),
            FsError::InvalidData { .. } => Errno::INVAL.raw_os_error(),
            FsError::Io { source, .. } => source
                .raw_os_error()
                .unwrap_or_else(|| Errno::IO.raw_os_error()),
        }
    }
}

/// Configuration error, raised before any mount starts serving.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A transformation pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as written in the configuration.
        pattern: String,
        /// The compilation error.
        #[source]
        source: regex::Error,
    },

    /// A mount point mixes a mirror volume with transformed volumes.
    #[error(
        "mount point {mount_point} mixes a volume without transformations with other volumes; \
         a mount point can only have one mirror volume or several transformed volumes"
    )]
    MixedMountPoint {
        /// The offending mount point.
        mount_point: PathBuf,
    },

    /// A mount point has more than one mirror volume.
    #[error("mount point {mount_point} has more than one volume without transformations")]
    DuplicateMirror {
        /// The offending mount point.
        mount_point: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("could not read configuration {path}: {source}")]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("could not write configuration {path}: {source}")]
    Write {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or misses a required key.
    #[error("could not parse configuration {path}: {source}")]
    Parse {
        /// The configuration file path.
        path: PathBuf,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The log file could not be opened.
    #[error("could not open log file {path}: {source}")]
    LogFile {
        /// The log file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
