//! Core types shared by both façades.

use std::fs::OpenOptions;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rustix::fs::OFlags;

/// `S_IFMT` mask selecting the file-type bits of a Unix mode.
const TYPE_MASK: u32 = 0o170000;

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Device node, FIFO or socket; holds the raw `S_IFMT` bits.
    Other(u32),
}

impl FileType {
    /// The `S_IFMT` bits for this type.
    pub const fn mode_bits(self) -> u32 {
        match self {
            FileType::File => 0o100000,
            FileType::Directory => 0o040000,
            FileType::Symlink => 0o120000,
            FileType::Other(bits) => bits & TYPE_MASK,
        }
    }

    /// Classify a `std` file type.
    pub fn from_std(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            FileType::Symlink
        } else if file_type.is_dir() {
            FileType::Directory
        } else if file_type.is_file() {
            FileType::File
        } else if file_type.is_fifo() {
            FileType::Other(0o010000)
        } else if file_type.is_char_device() {
            FileType::Other(0o020000)
        } else if file_type.is_block_device() {
            FileType::Other(0o060000)
        } else {
            FileType::Other(0o140000)
        }
    }
}

/// Attributes of a filesystem entry, shaped after `struct stat`.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Permission bits.
    pub permissions: Permissions,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Number of hard links.
    pub nlink: u64,
    /// Inode number on the real filesystem (0 for synthesized entries).
    pub inode: u64,
    /// Last access time.
    pub accessed: SystemTime,
    /// Last modification time.
    pub modified: SystemTime,
    /// Last status change time.
    pub changed: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    /// The full `st_mode` value (type bits and permission bits).
    pub fn mode(&self) -> u32 {
        self.file_type.mode_bits() | self.permissions.mode()
    }

    /// Convert metadata returned by `std::fs` (usually from `lstat`).
    pub fn from_std(meta: &std::fs::Metadata) -> Self {
        Self {
            file_type: FileType::from_std(meta.file_type()),
            size: meta.size(),
            permissions: Permissions::from_mode(meta.mode()),
            uid: meta.uid(),
            gid: meta.gid(),
            nlink: meta.nlink(),
            inode: meta.ino(),
            accessed: unix_time(meta.atime(), meta.atime_nsec()),
            modified: unix_time(meta.mtime(), meta.mtime_nsec()),
            changed: unix_time(meta.ctime(), meta.ctime_nsec()),
        }
    }

    /// Attributes reported for a virtual directory with no real counterpart.
    ///
    /// Owned by the serving process, timestamped with the first time this
    /// record was requested, mode `0o755`, two links, nominal size 4096.
    pub fn synthetic_dir() -> Self {
        static STARTED: OnceLock<SystemTime> = OnceLock::new();
        let started = *STARTED.get_or_init(SystemTime::now);
        Self {
            file_type: FileType::Directory,
            size: 4096,
            permissions: Permissions::default_dir(),
            uid: rustix::process::getuid().as_raw(),
            gid: rustix::process::getgid().as_raw(),
            nlink: 2,
            inode: 0,
            accessed: started,
            modified: started,
            changed: started,
        }
    }
}

fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = u32::try_from(nsecs.clamp(0, 999_999_999)).unwrap_or(0);
    match u64::try_from(secs) {
        Ok(secs) => UNIX_EPOCH + Duration::new(secs, nanos),
        Err(_) => {
            UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
                + Duration::from_nanos(u64::from(nanos))
        }
    }
}

/// A directory entry returned from `read_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (final segment only).
    pub name: String,
    /// Type of the entry.
    pub file_type: FileType,
}

impl DirEntry {
    /// Entry of the given name and type.
    pub fn new(name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            file_type,
        }
    }

    /// The `.` and `..` entries every listing starts with.
    pub fn dots() -> [DirEntry; 2] {
        [
            DirEntry::new(".", FileType::Directory),
            DirEntry::new("..", FileType::Directory),
        ]
    }
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Access check mask, as passed to `access(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessMode(u32);

impl AccessMode {
    /// Existence check only (`F_OK`).
    pub const EXISTS: Self = Self(0);
    /// Execute/search permission (`X_OK`).
    pub const EXECUTE: Self = Self(1);
    /// Write permission (`W_OK`).
    pub const WRITE: Self = Self(2);
    /// Read permission (`R_OK`).
    pub const READ: Self = Self(4);

    /// Build from the raw mask, ignoring unknown bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0o7)
    }

    /// The raw mask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if the mask asks for write permission.
    pub const fn wants_write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }
}

impl std::ops::BitOr for AccessMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Filesystem statistics (like `statvfs`).
#[derive(Debug, Clone, Default)]
pub struct StatFs {
    /// Preferred block size.
    pub block_size: u64,
    /// Fundamental block size.
    pub fragment_size: u64,
    /// Total blocks, in fragment-size units.
    pub blocks: u64,
    /// Free blocks.
    pub blocks_free: u64,
    /// Free blocks available to unprivileged users.
    pub blocks_available: u64,
    /// Total inodes.
    pub files: u64,
    /// Free inodes.
    pub files_free: u64,
    /// Free inodes available to unprivileged users.
    pub files_available: u64,
    /// Mount flags.
    pub flags: u64,
    /// Maximum filename length.
    pub max_name_len: u64,
}

impl From<rustix::fs::StatVfs> for StatFs {
    fn from(st: rustix::fs::StatVfs) -> Self {
        Self {
            block_size: st.f_bsize,
            fragment_size: st.f_frsize,
            blocks: st.f_blocks,
            blocks_free: st.f_bfree,
            blocks_available: st.f_bavail,
            files: st.f_files,
            files_free: st.f_ffree,
            files_available: st.f_favail,
            flags: st.f_flag.bits() as u64,
            max_name_len: st.f_namemax,
        }
    }
}

/// Opaque file handle for open files.
///
/// Allocated by the façade on `open`/`create` and released on `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// Flags for opening a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
    /// Create file if it doesn't exist.
    pub create: bool,
    /// Truncate file to zero length.
    pub truncate: bool,
    /// Append to end of file.
    pub append: bool,
}

impl OpenFlags {
    /// Read-only access.
    pub const READ: Self = Self {
        read: true,
        write: false,
        create: false,
        truncate: false,
        append: false,
    };

    /// Write access with create and truncate.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: true,
        append: false,
    };

    /// Read and write access.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        create: false,
        truncate: false,
        append: false,
    };

    /// Append mode - writes go to end of file.
    pub const APPEND: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: false,
        append: true,
    };

    /// Decode the raw `open(2)` flags a kernel bridge hands over.
    pub fn from_raw(raw: i32) -> Self {
        let flags = OFlags::from_bits_retain(raw as _);
        let write_only = flags.contains(OFlags::WRONLY);
        let read_write = flags.contains(OFlags::RDWR);
        Self {
            read: !write_only,
            write: write_only || read_write,
            create: flags.contains(OFlags::CREATE),
            truncate: flags.contains(OFlags::TRUNC),
            append: flags.contains(OFlags::APPEND),
        }
    }

    /// Equivalent `std` open options.
    pub fn to_open_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.read)
            .write(self.write)
            .create(self.create)
            .truncate(self.truncate)
            .append(self.append);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_mode_bits() {
        assert_eq!(FileType::File.mode_bits(), 0o100000);
        assert_eq!(FileType::Directory.mode_bits(), 0o040000);
        assert_eq!(FileType::Other(0o010644).mode_bits(), 0o010000);
    }

    #[test]
    fn synthetic_dir_matches_stat_defaults() {
        let m = Metadata::synthetic_dir();
        assert!(m.is_dir());
        assert_eq!(m.mode(), 0o40755);
        assert_eq!(m.nlink, 2);
        assert_eq!(m.size, 4096);
        assert_eq!(m.uid, rustix::process::getuid().as_raw());
    }

    #[test]
    fn synthetic_dir_time_is_stable() {
        let a = Metadata::synthetic_dir();
        let b = Metadata::synthetic_dir();
        assert_eq!(a.modified, b.modified);
        assert_eq!(a.accessed, a.changed);
    }

    #[test]
    fn metadata_from_std_keeps_type_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, b"hello").unwrap();

        let m = Metadata::from_std(&std::fs::symlink_metadata(&file).unwrap());
        assert!(m.is_file());
        assert_eq!(m.size, 5);
        assert_eq!(m.mode() & 0o170000, 0o100000);

        let d = Metadata::from_std(&std::fs::symlink_metadata(dir.path()).unwrap());
        assert!(d.is_dir());
    }

    #[test]
    fn unix_time_handles_pre_epoch() {
        assert_eq!(unix_time(0, 0), UNIX_EPOCH);
        assert!(unix_time(-10, 0) < UNIX_EPOCH);
        assert_eq!(unix_time(1, 500), UNIX_EPOCH + Duration::new(1, 500));
    }

    #[test]
    fn permissions_from_mode_masks_extra_bits() {
        let p = Permissions::from_mode(0o100755);
        assert_eq!(p.mode(), 0o755);
        assert!(!p.readonly());
        assert!(Permissions::from_mode(0o444).readonly());
    }

    #[test]
    fn access_mode_write_detection() {
        assert!(!AccessMode::READ.wants_write());
        assert!((AccessMode::READ | AccessMode::WRITE).wants_write());
        assert_eq!(AccessMode::from_bits(0o17).bits(), 0o7);
    }

    #[test]
    fn open_flags_from_raw() {
        let read_only = OpenFlags::from_raw(OFlags::RDONLY.bits() as i32);
        assert_eq!(read_only, OpenFlags::READ);

        let raw = (OFlags::WRONLY | OFlags::CREATE | OFlags::TRUNC).bits() as i32;
        assert_eq!(OpenFlags::from_raw(raw), OpenFlags::WRITE);

        let raw = (OFlags::RDWR | OFlags::APPEND).bits() as i32;
        let flags = OpenFlags::from_raw(raw);
        assert!(flags.read && flags.write && flags.append);
        assert!(!flags.create);
    }

    #[test]
    fn dots_are_directories() {
        let [dot, dotdot] = DirEntry::dots();
        assert_eq!(dot.name, ".");
        assert_eq!(dotdot.name, "..");
        assert_eq!(dot.file_type, FileType::Directory);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileType>();
        assert_send_sync::<Metadata>();
        assert_send_sync::<DirEntry>();
        assert_send_sync::<Permissions>();
        assert_send_sync::<StatFs>();
        assert_send_sync::<Handle>();
        assert_send_sync::<OpenFlags>();
    }
}
