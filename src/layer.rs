//! # Layers
//!
//! Tower-style middleware for served backends.
//!
//! ## How It Works
//!
//! ```text
//! MirrorFs / TransformFs ──▶ Layer::layer() ──▶ Wrapped backend (still Fs)
//! ```
//!
//! A middleware is a wrapper struct implementing the operation traits plus
//! a [`Layer`] that builds it. [`TracingLayer`] is the one every mount gets:
//! it logs each operation with its outcome.
//!
//! ```rust
//! use remapfs::{FsRead, LayerExt, MirrorFs, TracingLayer};
//! use std::path::Path;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let fs = MirrorFs::new(dir.path()).layer(TracingLayer::new("/mnt/docs"));
//! assert!(fs.get_attr(Path::new("/")).unwrap().is_dir());
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{
    AccessMode, Fs, FsDir, FsError, FsHandles, FsLink, FsRead, FsWrite, Handle, Metadata,
    OpenFlags, ReadDirIter, StatFs,
};

/// A layer that wraps a backend to add functionality.
///
/// `layer(self, backend)` consumes both the layer and the backend. The
/// resulting backend should implement the same traits as `B`.
pub trait Layer<B> {
    /// The wrapped backend type.
    type Backend;

    /// Wrap `backend`.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Fluent `.layer()` on any [`Fs`] backend.
pub trait LayerExt: Fs + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

impl<B: Fs> LayerExt for B {}

/// Logs every operation through `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLayer {
    mount: String,
}

impl TracingLayer {
    /// Layer labelling its events with `mount`.
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: mount.into(),
        }
    }
}

impl<B: Fs> Layer<B> for TracingLayer {
    type Backend = Traced<B>;

    fn layer(self, backend: B) -> Traced<B> {
        Traced {
            inner: backend,
            mount: self.mount,
        }
    }
}

/// A backend wrapped by [`TracingLayer`].
///
/// Each call emits one `info` event carrying the mount, the operation, its
/// target and either `ok` or the error with its errno.
#[derive(Debug)]
pub struct Traced<B> {
    inner: B,
    mount: String,
}

impl<B> Traced<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwrap the backend.
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        subject: impl Display,
        call: impl FnOnce(&B) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let result = call(&self.inner);
        match &result {
            Ok(_) => tracing::info!(mount = %self.mount, operation, %subject, "ok"),
            Err(err) => tracing::info!(
                mount = %self.mount,
                operation,
                %subject,
                errno = err.errno(),
                error = %err,
                "failed"
            ),
        }
        result
    }
}

impl<B: FsRead> FsRead for Traced<B> {
    fn get_attr(&self, path: &Path) -> Result<Metadata, FsError> {
        self.observe("get_attr", path.display(), |fs| fs.get_attr(path))
    }

    fn access(&self, path: &Path, mode: AccessMode) -> Result<(), FsError> {
        self.observe("access", path.display(), |fs| fs.access(path, mode))
    }

    fn stat_fs(&self, path: &Path) -> Result<StatFs, FsError> {
        self.observe("stat_fs", path.display(), |fs| fs.stat_fs(path))
    }
}

impl<B: FsDir> FsDir for Traced<B> {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        self.observe("read_dir", path.display(), |fs| fs.read_dir(path))
    }

    fn create_dir(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        self.observe("create_dir", path.display(), |fs| fs.create_dir(path, mode))
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        self.observe("remove_dir", path.display(), |fs| fs.remove_dir(path))
    }
}

impl<B: FsWrite> FsWrite for Traced<B> {
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let target = format!("{} -> {}", from.display(), to.display());
        self.observe("rename", target, |fs| fs.rename(from, to))
    }

    fn unlink(&self, path: &Path) -> Result<(), FsError> {
        self.observe("unlink", path.display(), |fs| fs.unlink(path))
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        self.observe("chmod", path.display(), |fs| fs.chmod(path, mode))
    }

    fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> Result<(), FsError> {
        self.observe("chown", path.display(), |fs| fs.chown(path, uid, gid))
    }

    fn set_times(
        &self,
        path: &Path,
        accessed: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> Result<(), FsError> {
        self.observe("set_times", path.display(), |fs| {
            fs.set_times(path, accessed, modified)
        })
    }

    fn truncate(&self, path: &Path, size: u64) -> Result<(), FsError> {
        self.observe("truncate", path.display(), |fs| fs.truncate(path, size))
    }

    fn mknod(&self, path: &Path, mode: u32, dev: u64) -> Result<(), FsError> {
        self.observe("mknod", path.display(), |fs| fs.mknod(path, mode, dev))
    }
}

impl<B: FsLink> FsLink for Traced<B> {
    fn read_link(&self, path: &Path) -> Result<PathBuf, FsError> {
        self.observe("read_link", path.display(), |fs| fs.read_link(path))
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<(), FsError> {
        self.observe("symlink", link.display(), |fs| fs.symlink(target, link))
    }

    fn hard_link(&self, original: &Path, link: &Path) -> Result<(), FsError> {
        self.observe("hard_link", link.display(), |fs| fs.hard_link(original, link))
    }
}

impl<B: FsHandles> FsHandles for Traced<B> {
    fn create(&self, path: &Path, mode: u32) -> Result<Handle, FsError> {
        self.observe("create", path.display(), |fs| fs.create(path, mode))
    }

    fn open(&self, path: &Path, flags: OpenFlags) -> Result<Handle, FsError> {
        self.observe("open", path.display(), |fs| fs.open(path, flags))
    }

    fn read_at(&self, handle: Handle, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
        self.observe("read", handle.0, |fs| fs.read_at(handle, buf, offset))
    }

    fn write_at(&self, handle: Handle, data: &[u8], offset: u64) -> Result<usize, FsError> {
        self.observe("write", handle.0, |fs| fs.write_at(handle, data, offset))
    }

    fn flush(&self, handle: Handle) -> Result<(), FsError> {
        self.observe("flush", handle.0, |fs| fs.flush(handle))
    }

    fn fsync(&self, handle: Handle, data_only: bool) -> Result<(), FsError> {
        self.observe("fsync", handle.0, |fs| fs.fsync(handle, data_only))
    }

    fn release(&self, handle: Handle) -> Result<(), FsError> {
        self.observe("release", handle.0, |fs| fs.release(handle))
    }
}
