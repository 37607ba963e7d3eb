//! Pass-through façade: the source tree, served verbatim.
//!
//! Every operation forwards to the OS against `root + path`. Failures keep
//! the OS error, so the original errno reaches the kernel bridge.

use std::fs::{self, DirBuilder, OpenOptions};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustix::fs::{CWD, Mode};

use crate::handles::HandleTable;
use crate::os;
use crate::{
    AccessMode, DirEntry, FileType, FsDir, FsError, FsHandles, FsLink, FsRead, FsWrite, Handle,
    Metadata, OpenFlags, ReadDirIter, StatFs,
};

/// Serves a real directory unchanged.
///
/// ```rust
/// use remapfs::{FsDir, MirrorFs};
/// use std::path::Path;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
///
/// let fs = MirrorFs::new(dir.path());
/// let names = fs.read_dir(Path::new("/")).unwrap().names().unwrap();
/// assert_eq!(names, vec![".", "..", "a.txt"]);
/// ```
#[derive(Debug)]
pub struct MirrorFs {
    root: PathBuf,
    handles: HandleTable,
}

impl MirrorFs {
    /// Mirror the directory at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handles: HandleTable::new(),
        }
    }

    /// The source root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of currently open handles.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }
}

impl FsRead for MirrorFs {
    fn get_attr(&self, path: &Path) -> Result<Metadata, FsError> {
        os::get_attr(&self.full_path(path))
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<(), FsError> {
        os::access(&self.full_path(path), mode)
    }

    fn stat_fs(&self, path: &Path) -> Result<StatFs, FsError> {
        os::stat_fs(&self.full_path(path))
    }
}

impl FsDir for MirrorFs {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let full = self.full_path(path);
        let entries = fs::read_dir(&full).map_err(FsError::io("read_dir", &full))?;
        let mut listed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(FsError::io("read_dir", &full))?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 name");
                continue;
            };
            let file_type = entry.file_type().map_err(FsError::io("read_dir", &full))?;
            listed.push(DirEntry::new(name, FileType::from_std(file_type)));
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ReadDirIter::new(
            DirEntry::dots().into_iter().chain(listed).map(Ok),
        ))
    }

    fn create_dir(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        let full = self.full_path(path);
        DirBuilder::new()
            .mode(mode)
            .create(&full)
            .map_err(FsError::io("create_dir", &full))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let full = self.full_path(path);
        fs::remove_dir(&full).map_err(FsError::io("remove_dir", &full))
    }
}

impl FsWrite for MirrorFs {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let full = self.full_path(from);
        fs::rename(&full, self.full_path(to)).map_err(FsError::io("rename", &full))
    }

    fn unlink(&self, path: &Path) -> Result<(), FsError> {
        let full = self.full_path(path);
        fs::remove_file(&full).map_err(FsError::io("unlink", &full))
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        os::chmod(&self.full_path(path), mode)
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError> {
        os::chown(&self.full_path(path), uid, gid)
    }

    fn set_times(
        &self,
        path: &Path,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> Result<(), FsError> {
        os::set_times(&self.full_path(path), accessed, modified)
    }

    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        os::truncate(&self.full_path(path), size)
    }

    fn mknod(&self, path: &Path, mode: u32, dev: u64) -> Result<(), FsError> {
        let full = self.full_path(path);
        rustix::fs::mknodat(
            CWD,
            &full,
            rustix::fs::FileType::from_raw_mode(mode as _),
            Mode::from_raw_mode(mode as _),
            dev as _,
        )
        .map_err(FsError::io("mknod", &full))
    }
}

impl FsLink for MirrorFs {
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
        let target = os::read_link(&self.full_path(path))?;
        match target.strip_prefix(&self.root) {
            Ok(inside) if target.is_absolute() => Ok(inside.to_path_buf()),
            _ => Ok(target),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        let full = self.full_path(link);
        std::os::unix::fs::symlink(target, &full).map_err(FsError::io("symlink", &full))
    }

    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError> {
        let full = self.full_path(original);
        fs::hard_link(&full, self.full_path(link)).map_err(FsError::io("hard_link", &full))
    }
}

impl FsHandles for MirrorFs {
    fn create(&self, path: &Path, mode: u32) -> Result<Handle, FsError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).mode(mode);
        let full = self.full_path(path);
        let file = os::open(&full, &options)?;
        Ok(self.handles.insert(&full, file))
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Handle, FsError> {
        let full = self.full_path(path);
        let file = os::open(&full, &flags.to_open_options())?;
        Ok(self.handles.insert(&full, file))
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn mirror() -> (MirrorFs, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file.txt"), b"mirror me").unwrap();
        (MirrorFs::new(dir.path()), dir)
    }

    #[test]
    fn get_attr_of_file_and_dir() {
        let (fs, _dir) = mirror();
        let file = fs.get_attr(Path::new("/sub/file.txt")).unwrap();
        assert!(file.is_file());
        assert_eq!(file.size, 9);
        assert!(fs.get_attr(Path::new("/sub")).unwrap().is_dir());
        assert!(fs.get_attr(Path::new("/")).unwrap().is_dir());
    }

    #[test]
    fn missing_path_keeps_os_errno() {
        let (fs, _dir) = mirror();
        let err = fs.get_attr(Path::new("/absent")).unwrap_err();
        assert!(matches!(err, FsError::Io { operation: "get_attr", .. }));
        assert_eq!(err.errno(), rustix::io::Errno::NOENT.raw_os_error());
    }

    #[test]
    fn read_dir_lists_dots_first() {
        let (fs, _dir) = mirror();
        fs::write(fs.root().join("sub/another.txt"), b"").unwrap();
        let names = fs.read_dir(Path::new("/sub")).unwrap().names().unwrap();
        assert_eq!(names, vec![".", "..", "another.txt", "file.txt"]);
    }

    #[test]
    fn read_dir_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (fs, dir) = mirror();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff")), b"").unwrap();
        let names = fs.read_dir(Path::new("/")).unwrap().names().unwrap();
        assert!(names.iter().all(|name| !name.contains('\u{fffd}')));
        for name in names.iter().filter(|name| !name.starts_with('.')) {
            fs.get_attr(&Path::new("/").join(name)).unwrap();
        }
    }

    #[test]
    fn read_through_handle() {
        let (fs, _dir) = mirror();
        let handle = fs.open(Path::new("/sub/file.txt"), OpenFlags::READ).unwrap();
        let mut buf = [0u8; 6];
        assert_eq!(fs.read_at(handle, &mut buf, 0).unwrap(), 6);
        assert_eq!(&buf, b"mirror");
        fs.release(handle).unwrap();
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn create_write_and_truncate() {
        let (fs, dir) = mirror();
        let handle = fs.create(Path::new("/new.txt"), 0o644).unwrap();
        assert_eq!(fs.write_at(handle, b"written", 0).unwrap(), 7);
        fs.flush(handle).unwrap();
        fs.fsync(handle, false).unwrap();
        fs.release(handle).unwrap();
        assert_eq!(fs::read(dir.path().join("new.txt")).unwrap(), b"written");

        fs.truncate(Path::new("/new.txt"), 3).unwrap();
        assert_eq!(fs::read(dir.path().join("new.txt")).unwrap(), b"wri");
    }

    #[test]
    fn rename_and_unlink() {
        let (fs, dir) = mirror();
        fs.rename(Path::new("/sub/file.txt"), Path::new("/moved.txt"))
            .unwrap();
        assert!(dir.path().join("moved.txt").exists());
        fs.unlink(Path::new("/moved.txt")).unwrap();
        assert!(!dir.path().join("moved.txt").exists());
    }

    #[test]
    fn directories_are_created_and_removed() {
        let (fs, dir) = mirror();
        fs.create_dir(Path::new("/made"), 0o700).unwrap();
        assert_eq!(fs.get_attr(Path::new("/made")).unwrap().permissions.mode(), 0o700);
        fs.remove_dir(Path::new("/made")).unwrap();
        assert!(!dir.path().join("made").exists());
    }

    #[test]
    fn chmod_is_visible_in_attr() {
        let (fs, _dir) = mirror();
        fs.chmod(Path::new("/sub/file.txt"), 0o600).unwrap();
        let meta = fs.get_attr(Path::new("/sub/file.txt")).unwrap();
        assert_eq!(meta.permissions.mode(), 0o600);
    }

    #[test]
    fn chown_to_self_succeeds() {
        let (fs, _dir) = mirror();
        let uid = rustix::process::getuid().as_raw();
        fs.chown(Path::new("/sub/file.txt"), Some(uid), None).unwrap();
    }

    #[test]
    fn set_times_updates_modified() {
        let (fs, _dir) = mirror();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        fs.set_times(Path::new("/sub/file.txt"), Some(when), Some(when))
            .unwrap();
        let meta = fs.get_attr(Path::new("/sub/file.txt")).unwrap();
        assert_eq!(meta.modified, when);
        assert_eq!(meta.accessed, when);
    }

    #[test]
    fn absolute_link_inside_root_becomes_relative() {
        let (fs, dir) = mirror();
        std::os::unix::fs::symlink(dir.path().join("sub/file.txt"), dir.path().join("abs"))
            .unwrap();
        assert_eq!(
            fs.read_link(Path::new("/abs")).unwrap(),
            PathBuf::from("sub/file.txt")
        );
    }

    #[test]
    fn relative_and_foreign_links_are_kept() {
        let (fs, _dir) = mirror();
        fs.symlink(Path::new("sub/file.txt"), Path::new("/rel")).unwrap();
        fs.symlink(Path::new("/etc/hostname"), Path::new("/foreign"))
            .unwrap();
        assert_eq!(
            fs.read_link(Path::new("/rel")).unwrap(),
            PathBuf::from("sub/file.txt")
        );
        assert_eq!(
            fs.read_link(Path::new("/foreign")).unwrap(),
            PathBuf::from("/etc/hostname")
        );
    }

    #[test]
    fn hard_link_shares_inode() {
        let (fs, _dir) = mirror();
        fs.hard_link(Path::new("/sub/file.txt"), Path::new("/linked"))
            .unwrap();
        let a = fs.get_attr(Path::new("/sub/file.txt")).unwrap();
        let b = fs.get_attr(Path::new("/linked")).unwrap();
        assert_eq!(a.inode, b.inode);
        assert_eq!(b.nlink, 2);
    }

    #[test]
    fn mknod_creates_fifo() {
        let (fs, _dir) = mirror();
        fs.mknod(Path::new("/pipe"), 0o010644, 0).unwrap();
        let meta = fs.get_attr(Path::new("/pipe")).unwrap();
        assert_eq!(meta.file_type, FileType::Other(0o010000));
    }

    #[test]
    fn access_and_stat_fs() {
        let (fs, _dir) = mirror();
        fs.access(Path::new("/sub/file.txt"), AccessMode::READ)
            .unwrap();
        assert!(fs.access(Path::new("/absent"), AccessMode::EXISTS).is_err());
        let stat = fs.stat_fs(Path::new("/")).unwrap();
        assert!(stat.block_size > 0);
    }
}
