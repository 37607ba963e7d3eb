//! Source enumeration: the real files under a volume's source root.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Produces the real file paths under a source root.
///
/// The sequence is lazy, finite and consumed once per volume. Any closure
/// `Fn(&Path) -> Vec<PathBuf>` is an enumerator, which keeps composition
/// testable without touching the disk:
///
/// ```rust
/// use remapfs::SourceEnumerator;
/// use std::path::{Path, PathBuf};
///
/// let fixed = |root: &Path| vec![root.join("a.txt"), root.join("b/c.txt")];
/// let paths: Vec<PathBuf> = fixed.enumerate(Path::new("/src")).collect();
/// assert_eq!(paths.len(), 2);
/// ```
pub trait SourceEnumerator {
    /// Iterate the absolute paths of all non-directory entries under `root`.
    fn enumerate(&self, root: &Path) -> Box<dyn Iterator<Item = PathBuf> + '_>;
}

impl<F> SourceEnumerator for F
where
    F: Fn(&Path) -> Vec<PathBuf>,
{
    fn enumerate(&self, root: &Path) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        Box::new(self(root).into_iter())
    }
}

/// Recursive directory walk backed by `walkdir`.
///
/// Entries are visited sorted by file name, so the same tree always yields
/// the same sequence. Directories, and symlinks pointing at directories, are
/// not reported. Unreadable entries are logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkEnumerator {
    follow_links: bool,
}

impl WalkEnumerator {
    /// Walker that does not descend into symlinked directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Descend into symlinked directories.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

impl SourceEnumerator for WalkEnumerator {
    fn enumerate(&self, root: &Path) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        let walk = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                !entry.file_type().is_dir() && !(entry.path_is_symlink() && entry.path().is_dir())
            })
            .map(walkdir::DirEntry::into_path);
        Box::new(walk)
    }
}
