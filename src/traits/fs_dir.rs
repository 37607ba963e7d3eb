//! Directory operations.

use std::path::Path;

use crate::{DirEntry, FsError};

/// Directory operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List directory contents, starting with `.` and `..`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError>;

    /// Create a directory with the given permission bits.
    fn create_dir(&self, path: &Path, mode: u32) -> Result<(), FsError>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;
}

/// Iterator over directory entries.
///
/// - Outer `Result` (from [`FsDir::read_dir`]) = "can I open this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
///
/// # Example
///
/// ```rust
/// use remapfs::{FsDir, FsError};
/// use std::path::Path;
///
/// fn names<B: FsDir>(backend: &B) -> Result<Vec<String>, FsError> {
///     let mut names = Vec::new();
///     for entry in backend.read_dir(Path::new("/"))? {
///         names.push(entry?.name);
///     }
///     Ok(names)
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<Result<DirEntry, FsError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }

    /// Collect entry names, short-circuiting on first error.
    pub fn names(self) -> Result<Vec<String>, FsError> {
        self.map(|entry| entry.map(|e| e.name)).collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl std::fmt::Debug for ReadDirIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReadDirIter")
    }
}
