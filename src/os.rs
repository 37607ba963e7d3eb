//! Operations on real paths shared by both façades.

use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rustix::fs::{Access, AtFlags, CWD, Mode, OFlags, Timespec, Timestamps, UTIME_NOW};

use crate::{AccessMode, FsError, Metadata, StatFs};

pub(crate) fn get_attr(real: &Path) -> Result<Metadata, FsError> {
    let meta = fs::symlink_metadata(real).map_err(FsError::io("get_attr", real))?;
    Ok(Metadata::from_std(&meta))
}

pub(crate) fn access(real: &Path, mode: AccessMode) -> Result<(), FsError> {
    rustix::fs::access(real, Access::from_bits_truncate(mode.bits() as _))
        .map_err(FsError::io("access", real))
}

pub(crate) fn stat_fs(real: &Path) -> Result<StatFs, FsError> {
    let stat = rustix::fs::statvfs(real).map_err(FsError::io("stat_fs", real))?;
    Ok(StatFs::from(stat))
}

pub(crate) fn read_link(real: &Path) -> Result<PathBuf, FsError> {
    fs::read_link(real).map_err(FsError::io("read_link", real))
}

pub(crate) fn chmod(real: &Path, mode: u32) -> Result<(), FsError> {
    fs::set_permissions(real, fs::Permissions::from_mode(mode)).map_err(FsError::io("chmod", real))
}

pub(crate) fn chown(real: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError> {
    std::os::unix::fs::chown(real, uid, gid).map_err(FsError::io("chown", real))
}

/// `None` stands for the current time.
///
/// Goes through `utimensat` on the path, so nothing is opened: FIFOs do not
/// block and write-only files keep the kernel's own permission check.
pub(crate) fn set_times(
    real: &Path,
    accessed: Option<SystemTime>,
    modified: Option<SystemTime>,
) -> Result<(), FsError> {
    let times = Timestamps {
        last_access: timespec(accessed),
        last_modification: timespec(modified),
    };
    rustix::fs::utimensat(CWD, real, &times, AtFlags::empty())
        .map_err(FsError::io("set_times", real))
}

/// Opened write-only and non-blocking, so a FIFO without a reader fails
/// with `ENXIO` instead of waiting for one.
pub(crate) fn truncate(real: &Path, size: u64) -> Result<(), FsError> {
    rustix::fs::open(
        real,
        OFlags::WRONLY | OFlags::NONBLOCK | OFlags::CLOEXEC,
        Mode::empty(),
    )
    .and_then(|fd| rustix::fs::ftruncate(&fd, size))
    .map_err(FsError::io("truncate", real))
}

fn timespec(time: Option<SystemTime>) -> Timespec {
    let Some(time) = time else {
        return Timespec {
            tv_sec: 0,
            tv_nsec: UTIME_NOW as _,
        };
    };
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => Timespec {
            tv_sec: after.as_secs() as _,
            tv_nsec: after.subsec_nanos() as _,
        },
        Err(err) => {
            let before = err.duration();
            match before.subsec_nanos() {
                0 => Timespec {
                    tv_sec: -(before.as_secs() as i64) as _,
                    tv_nsec: 0,
                },
                nanos => Timespec {
                    tv_sec: (-(before.as_secs() as i64) - 1) as _,
                    tv_nsec: (1_000_000_000 - nanos) as _,
                },
            }
        }
    }
}

pub(crate) fn open(real: &Path, options: &OpenOptions) -> Result<File, FsError> {
    options.open(real).map_err(FsError::io("open", real))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn fifo(dir: &Path) -> PathBuf {
        let path = dir.join("pipe");
        rustix::fs::mknodat(
            CWD,
            &path,
            rustix::fs::FileType::Fifo,
            Mode::from_raw_mode(0o644),
            0,
        )
        .unwrap();
        path
    }

    /// Run `op` on a worker thread, failing instead of hanging the suite.
    fn within_seconds<T: Send + 'static>(op: impl FnOnce() -> T + Send + 'static) -> T {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(op());
        });
        rx.recv_timeout(Duration::from_secs(3))
            .expect("operation blocked")
    }

    #[test]
    fn set_times_on_fifo_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = fifo(dir.path());
        let modified = UNIX_EPOCH + Duration::from_secs(1_000_000);
        let target = pipe.clone();
        within_seconds(move || set_times(&target, None, Some(modified))).unwrap();
        assert_eq!(
            fs::symlink_metadata(&pipe).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn truncate_on_fifo_fails_fast_with_kernel_errno() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = fifo(dir.path());
        let err = within_seconds(move || truncate(&pipe, 0)).unwrap_err();
        assert_eq!(err.errno(), rustix::io::Errno::NXIO.raw_os_error());
    }

    #[test]
    fn write_only_file_accepts_times_and_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealed");
        fs::write(&path, b"contents").unwrap();
        chmod(&path, 0o200).unwrap();

        let modified = UNIX_EPOCH + Duration::from_secs(42);
        set_times(&path, None, Some(modified)).unwrap();
        truncate(&path, 3).unwrap();

        let meta = fs::symlink_metadata(&path).unwrap();
        assert_eq!(meta.modified().unwrap(), modified);
        assert_eq!(meta.len(), 3);
    }

    #[test]
    fn times_before_the_epoch_are_normalized() {
        let ts = timespec(Some(UNIX_EPOCH - Duration::from_millis(1500)));
        assert_eq!(ts.tv_sec as i64, -2);
        assert_eq!(ts.tv_nsec as i64, 500_000_000);
        assert_eq!(timespec(None).tv_nsec as i64, UTIME_NOW as i64);
    }
}
