//! Open-file table shared by both façades.

use std::collections::HashMap;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::{FsError, Handle};

/// Maps handles to open real files.
///
/// Positioned I/O takes the read lock, so concurrent reads on different
/// handles never block each other. `insert` and `release` take the write
/// lock. A file is closed when its handle is released or the table dropped.
/// Each file keeps the real path it was opened from, for error reports.
#[derive(Debug, Default)]
pub(crate) struct HandleTable {
    files: RwLock<HashMap<u64, OpenFile>>,
    next: AtomicU64,
}

#[derive(Debug)]
struct OpenFile {
    real: PathBuf,
    file: File,
}

impl HandleTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `file`, opened from `real`, and return its handle.
    pub(crate) fn insert(&self, real: &Path, file: File) -> Handle {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let real = real.to_path_buf();
        self.files.write().insert(id, OpenFile { real, file });
        Handle(id)
    }

    pub(crate) fn read_at(&self, handle: Handle, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
        self.with_file("read", handle, |file| file.read_at(buf, offset))
    }

    pub(crate) fn write_at(&self, handle: Handle, data: &[u8], offset: u64) -> Result<usize, FsError> {
        self.with_file("write", handle, |file| file.write_at(data, offset))
    }

    /// Nothing is buffered in user space, so flushing only validates the handle.
    pub(crate) fn flush(&self, handle: Handle) -> Result<(), FsError> {
        self.with_file("flush", handle, |_| Ok(()))
    }

    pub(crate) fn fsync(&self, handle: Handle, data_only: bool) -> Result<(), FsError> {
        self.with_file("fsync", handle, |file| {
            if data_only {
                file.sync_data()
            } else {
                file.sync_all()
            }
        })
    }

    /// Close the file behind `handle`.
    pub(crate) fn release(&self, handle: Handle) -> Result<(), FsError> {
        self.files
            .write()
            .remove(&handle.0)
            .map(drop)
            .ok_or(FsError::InvalidHandle { handle })
    }

    /// Number of open handles.
    pub(crate) fn len(&self) -> usize {
        self.files.read().len()
    }

    fn with_file<T>(
        &self,
        operation: &'static str,
        handle: Handle,
        f: impl FnOnce(&File) -> std::io::Result<T>,
    ) -> Result<T, FsError> {
        let files = self.files.read();
        let open = files
            .get(&handle.0)
            .ok_or(FsError::InvalidHandle { handle })?;
        f(&open.file).map_err(FsError::io(operation, &open.real))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table_with(contents: &[u8]) -> (HandleTable, Handle, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents)
            .unwrap();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let table = HandleTable::new();
        let handle = table.insert(&path, file);
        (table, handle, dir)
    }

    #[test]
    fn positioned_read() {
        let (table, handle, _dir) = table_with(b"hello world");
        let mut buf = [0u8; 5];
        assert_eq!(table.read_at(handle, &mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn positioned_write_then_read() {
        let (table, handle, _dir) = table_with(b"hello world");
        assert_eq!(table.write_at(handle, b"HELLO", 0).unwrap(), 5);
        table.fsync(handle, true).unwrap();
        let mut buf = [0u8; 11];
        table.read_at(handle, &mut buf, 0).unwrap();
        assert_eq!(&buf, b"HELLO world");
    }

    #[test]
    fn handles_are_distinct() {
        let (table, first, dir) = table_with(b"x");
        let path = dir.path().join("f");
        let second = table.insert(&path, std::fs::File::open(&path).unwrap());
        assert_ne!(first, second);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn released_handle_is_invalid() {
        let (table, handle, _dir) = table_with(b"x");
        table.release(handle).unwrap();
        assert_eq!(table.len(), 0);
        let mut buf = [0u8; 1];
        assert!(matches!(
            table.read_at(handle, &mut buf, 0),
            Err(FsError::InvalidHandle { .. })
        ));
        assert!(matches!(
            table.release(handle),
            Err(FsError::InvalidHandle { .. })
        ));
        assert!(table.flush(handle).is_err());
    }

    #[test]
    fn io_errors_name_the_real_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("read-only");
        std::fs::write(&path, b"x").unwrap();
        let table = HandleTable::new();
        let handle = table.insert(&path, std::fs::File::open(&path).unwrap());

        let err = table.write_at(handle, b"y", 0).unwrap_err();
        match err {
            FsError::Io {
                operation, path: reported, ..
            } => {
                assert_eq!(operation, "write");
                assert_eq!(reported, path);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
