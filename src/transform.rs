//! Cache-backed façade: a renamed, read-only view of one or more source trees.
//!
//! Paths are resolved through the [`VirtualTree`] built at startup. The
//! namespace itself cannot change: anything that would add, remove or move
//! an entry is refused with `EACCES`. Content and attributes of resolved
//! files are still served, and their mode, owner, times and length can be
//! changed through the virtual path.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::handles::HandleTable;
use crate::os;
use crate::{
    AccessMode, DirEntry, Entry, FileType, FsDir, FsError, FsHandles, FsLink, FsRead, FsWrite,
    Handle, Metadata, OpenFlags, ReadDirIter, StatFs, VirtualTree,
};

/// Serves a [`VirtualTree`].
///
/// ```rust
/// use remapfs::{FsDir, TransformFs, TreeBuilder};
/// use std::path::{Path, PathBuf};
///
/// let mut builder = TreeBuilder::new();
/// builder.insert("docs/readme.md", PathBuf::from("/srv/README.md"));
/// let fs = TransformFs::new(builder.build(), vec![PathBuf::from("/srv")]);
///
/// let names = fs.read_dir(Path::new("/docs")).unwrap().names().unwrap();
/// assert_eq!(names, vec![".", "..", "readme.md"]);
/// ```
#[derive(Debug)]
pub struct TransformFs {
    tree: VirtualTree,
    source_roots: Vec<PathBuf>,
    handles: HandleTable,
}

impl TransformFs {
    /// Serve `tree`, built from the volumes rooted at `source_roots`.
    pub fn new(tree: VirtualTree, source_roots: Vec<PathBuf>) -> Self {
        Self {
            tree,
            source_roots,
            handles: HandleTable::new(),
        }
    }

    /// The virtual namespace.
    pub fn tree(&self) -> &VirtualTree {
        &self.tree
    }

    /// Source roots of the merged volumes, in configured order.
    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    /// Number of currently open handles.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn lookup(&self, path: &Path) -> Option<Entry<'_>> {
        path.to_str().and_then(|p| self.tree.lookup(p))
    }

    /// Real path of a virtual file, walked the same way listings are.
    fn resolve(&self, path: &Path) -> Option<&Path> {
        match self.lookup(path)? {
            Entry::File(real) => Some(real),
            Entry::Directory => None,
        }
    }

    fn resolve_or_deny(&self, operation: &'static str, path: &Path) -> Result<&Path, FsError> {
        self.resolve(path)
            .ok_or_else(|| FsError::denied(operation, path))
    }
}

impl FsRead for TransformFs {
    fn get_attr(&self, path: &Path) -> Result<Metadata, FsError> {
        match self.lookup(path) {
            Some(Entry::File(real)) => os::get_attr(real),
            Some(Entry::Directory) => Ok(Metadata::synthetic_dir()),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<(), FsError> {
        match self.resolve(path) {
            Some(real) => os::access(real, mode),
            None if mode.wants_write() => Err(FsError::denied("access", path)),
            None => Ok(()),
        }
    }

    fn stat_fs(&self, path: &Path) -> Result<StatFs, FsError> {
        match self.resolve(path).or(self.source_roots.first().map(PathBuf::as_path)) {
            Some(real) => os::stat_fs(real),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl FsDir for TransformFs {
    /// `.` and `..`, then the children of the nearest existing directory.
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let virtual_path = path.to_str().ok_or_else(|| FsError::NotFound {
            path: path.to_path_buf(),
        })?;
        let mut children: Vec<DirEntry> = self
            .tree
            .list_entries(virtual_path)
            .into_iter()
            .map(|(name, entry)| {
                let file_type = match entry {
                    Entry::Directory => FileType::Directory,
                    Entry::File(_) => FileType::File,
                };
                DirEntry::new(name, file_type)
            })
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ReadDirIter::new(
            DirEntry::dots().into_iter().chain(children).map(Ok),
        ))
    }

    fn create_dir(&self, path: &Path, _mode: u32) -> Result<(), FsError> {
        Err(FsError::denied("create_dir", path))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        Err(FsError::denied("remove_dir", path))
    }
}

impl FsWrite for TransformFs {
    fn rename(&self, from: &Path, _to: &Path) -> Result<(), FsError> {
        Err(FsError::denied("rename", from))
    }

    fn unlink(&self, path: &Path) -> Result<(), FsError> {
        Err(FsError::denied("unlink", path))
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        os::chmod(self.resolve_or_deny("chmod", path)?, mode)
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError> {
        os::chown(self.resolve_or_deny("chown", path)?, uid, gid)
    }

    fn set_times(
        &self,
        path: &Path,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> Result<(), FsError> {
        os::set_times(self.resolve_or_deny("set_times", path)?, accessed, modified)
    }

    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        os::truncate(self.resolve_or_deny("truncate", path)?, size)
    }

    fn mknod(&self, path: &Path, _mode: u32, _dev: u64) -> Result<(), FsError> {
        Err(FsError::denied("mknod", path))
    }
}

impl FsLink for TransformFs {
    /// Absolute targets lose their leading `/`, so they resolve inside the mount.
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
        let real = self.resolve(path).ok_or_else(|| FsError::NotFound {
            path: path.to_path_buf(),
        })?;
        let target = os::read_link(real)?;
        let relative = target.strip_prefix("/").ok().map(Path::to_path_buf);
        Ok(relative.unwrap_or(target))
    }

    fn symlink(&self, _target: &Path, link: &Path) -> Result<(), FsError> {
        Err(FsError::denied("symlink", link))
    }

    fn hard_link(&self, _original: &Path, link: &Path) -> Result<(), FsError> {
        Err(FsError::denied("hard_link", link))
    }
}

impl FsHandles for TransformFs {
    fn create(&self, path: &Path, _mode: u32) -> Result<Handle, FsError> {
        Err(FsError::denied("create", path))
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Handle, FsError> {
        let real = self.resolve_or_deny("open", path)?;
        let file = os::open(real, &flags.to_open_options())?;
        Ok(self.handles.insert(real, file))
    }

    fn read_at(&self, handle: Handle, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
        self.handles.read_at(handle, buf, offset)
    }

    fn write_at(&self, handle: Handle, data: &[u8], offset: u64) -> Result<usize, FsError> {
        self.handles.write_at(handle, data, offset)
    }

    fn flush(&self, handle: Handle) -> Result<(), FsError> {
        self.handles.flush(handle)
    }

    fn fsync(&self, handle: Handle, data_only: bool) -> Result<(), FsError> {
        self.handles.fsync(handle, data_only)
    }

    fn release(&self, handle: Handle) -> Result<(), FsError> {
        self.handles.release(handle)
    }
}
