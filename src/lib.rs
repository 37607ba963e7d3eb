//! # remapfs
//!
//! Serve real directory trees under **virtual namespaces**: either verbatim
//! (a mirror) or renamed through ordered regular-expression rules.
//!
//! This crate builds the namespaces and implements the filesystem
//! operations a kernel bridge (such as a FUSE binding) calls into. The
//! bridge itself plugs in through [`MountDriver`].
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use remapfs::{Backend, Composer, FsDir, TransformationConfig, VolumeConfig};
//! use std::path::{Path, PathBuf};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let content = dir.path().join("food/fruits/content");
//! std::fs::create_dir_all(&content).unwrap();
//! std::fs::write(content.join("apple.md"), b"# Apple").unwrap();
//!
//! let volume = VolumeConfig {
//!     source_path: dir.path().to_path_buf(),
//!     mount_point: PathBuf::from("/mnt/cyclopaedia"),
//!     allow_other: false,
//!     transformations: vec![TransformationConfig {
//!         from: r".*/(?P<title>[^/]+)/(?P<category>[^/]+)/content/(?P<file>.+)$".into(),
//!         to: r"\g<title> [\g<category>]/\g<file>".into(),
//!     }],
//! };
//!
//! let mounts = Composer::new().compose(&[volume]).unwrap();
//! let Backend::Transformed(fs) = &mounts[0].backend else { unreachable!() };
//! let names = fs.read_dir(Path::new("/food [fruits]")).unwrap().names().unwrap();
//! assert_eq!(names, vec![".", "..", "apple.md"]);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Config`] | JSON configuration: logging and volumes |
//! | [`RuleSet`] | Ordered rename rules, first match wins |
//! | [`VirtualTree`] | Immutable namespace of a transformed mount |
//! | [`Composer`] | Groups volumes by mount point and builds [`Mount`]s |
//! | [`MirrorFs`] | Pass-through backend |
//! | [`TransformFs`] | Rule-renamed, namespace-read-only backend |
//! | [`Fs`] | The operation surface both backends implement |
//! | [`FsError`] | Operation error, with its errno |
//! | [`ConfigError`] | Raised before anything is served |
//!
//! ---
//!
//! ## Pipeline
//!
//! ```text
//! Config ──▶ Composer ──┬─▶ Mirror group      ──▶ MirrorFs
//!                       └─▶ Transformed group ──▶ TreeBuilder ──▶ VirtualTree ──▶ TransformFs
//!
//! Mount::drive(driver) ──▶ Traced<backend> ──▶ MountDriver::mount
//! ```
//!
//! Everything that can be wrong with a configuration is detected before the
//! first source tree is walked. Trees are immutable once built, so serving
//! needs no locking beyond the open-handle table.
//!
//! ---
//!
//! ## Thread Safety
//!
//! All operation traits require `Send + Sync` and take `&self`.

// Private modules
mod compose;
mod config;
mod error;
mod handles;
mod layer;
mod mirror;
mod mount;
mod os;
mod rules;
mod traits;
mod transform;
mod tree;
mod types;
mod walker;

pub mod logging;

// Public re-exports - errors
pub use error::{ConfigError, FsError};

// Public re-exports - core types
pub use types::{
    AccessMode, DirEntry, FileType, Handle, Metadata, OpenFlags, Permissions, StatFs,
};

// Public re-exports - operation traits
pub use traits::{Fs, FsDir, FsHandles, FsLink, FsRead, FsWrite, ReadDirIter};

// Public re-exports - configuration and rules
pub use config::{Config, LoggingConfig, TransformationConfig, VolumeConfig};
pub use rules::{Rule, RuleSet};

// Public re-exports - namespace construction
pub use tree::{Entry, Node, NodeId, TreeBuilder, VirtualTree};
pub use walker::{SourceEnumerator, WalkEnumerator};

// Public re-exports - backends and mounts
pub use compose::{Composer, MountGroup, MountKind};
pub use layer::{Layer, LayerExt, Traced, TracingLayer};
pub use mirror::MirrorFs;
pub use mount::{Backend, Mount, MountDriver, MountTarget};
pub use transform::TransformFs;
