//! # Filesystem Traits
//!
//! The operation surface a kernel bridge calls into.
//!
//! ## Quick Reference
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsRead`] | `get_attr`, `access`, `stat_fs` |
//! | [`FsDir`] | `read_dir`, `create_dir`, `remove_dir` |
//! | [`FsWrite`] | `rename`, `unlink`, `chmod`, `chown`, `set_times`, `truncate`, `mknod` |
//! | [`FsLink`] | `read_link`, `symlink`, `hard_link` |
//! | [`FsHandles`] | `create`, `open`, `read_at`, `write_at`, `flush`, `fsync`, `release` |
//! | [`Fs`] | all of the above |
//!
//! ## Blanket Implementation
//!
//! [`Fs`] is implemented for every type implementing the five component
//! traits. Both served variants, `MirrorFs` and `TransformFs`, implement the
//! components directly; a binding written against `B: Fs` is monomorphized
//! for each of them.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self`; the only mutable
//! state behind them is the open-handle table.
//!
//! ## Object Safety
//!
//! All traits are object-safe:
//!
//! ```rust
//! use remapfs::Fs;
//!
//! fn root_attr(fs: &dyn Fs) -> bool {
//!     fs.get_attr(std::path::Path::new("/")).is_ok()
//! }
//! ```

mod fs_dir;
mod fs_handles;
mod fs_link;
mod fs_read;
mod fs_write;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_handles::FsHandles;
pub use fs_link::FsLink;
pub use fs_read::FsRead;
pub use fs_write::FsWrite;

/// The complete kernel-bridge operation surface.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type implementing all component traits.
/// You never need to implement `Fs` directly.
///
/// # Example
///
/// ```rust
/// use remapfs::{Fs, FsError, OpenFlags};
/// use std::path::Path;
///
/// fn cat<B: Fs>(fs: &B, path: &Path) -> Result<Vec<u8>, FsError> {
///     let size = fs.get_attr(path)?.size as usize;
///     let handle = fs.open(path, OpenFlags::READ)?;
///     let mut buf = vec![0u8; size];
///     let read = fs.read_at(handle, &mut buf, 0);
///     fs.release(handle)?;
///     buf.truncate(read?);
///     Ok(buf)
/// }
/// ```
pub trait Fs: FsRead + FsDir + FsWrite + FsLink + FsHandles {}

impl<T: FsRead + FsDir + FsWrite + FsLink + FsHandles> Fs for T {}
