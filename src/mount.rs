//! Composed mounts and the seam to whatever serves them.

use std::path::PathBuf;

use crate::{Fs, LayerExt, MirrorFs, TracingLayer, TransformFs};

/// Where and how a backend is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    /// Directory the namespace appears at.
    pub mount_point: PathBuf,
    /// Whether users other than the mounting one may access it.
    pub allow_other: bool,
}

/// The two kinds of served namespace.
#[derive(Debug)]
pub enum Backend {
    /// One source tree, verbatim.
    Mirror(MirrorFs),
    /// One or more source trees, renamed through rules.
    Transformed(TransformFs),
}

/// A backend ready to be mounted.
#[derive(Debug)]
pub struct Mount {
    /// Mount point and options.
    pub target: MountTarget,
    /// What is served there.
    pub backend: Backend,
}

impl Mount {
    /// Hand the backend, wrapped in a [`TracingLayer`], to `driver`.
    ///
    /// Dispatch is static: the driver is monomorphized for each backend type.
    pub fn drive<D: MountDriver>(self, driver: &D) -> D::Output {
        let layer = TracingLayer::new(self.target.mount_point.display().to_string());
        match self.backend {
            Backend::Mirror(fs) => driver.mount(&self.target, fs.layer(layer)),
            Backend::Transformed(fs) => driver.mount(&self.target, fs.layer(layer)),
        }
    }
}

/// Binds a backend to a mount point.
///
/// A kernel binding implements this: `mount` typically blocks serving the
/// backend until it is unmounted. Drivers that only inspect the plan return
/// immediately.
///
/// ```rust
/// use remapfs::{Fs, MountDriver, MountTarget};
///
/// struct Probe;
///
/// impl MountDriver for Probe {
///     type Output = bool;
///
///     fn mount<B: Fs + 'static>(&self, _target: &MountTarget, backend: B) -> bool {
///         backend.get_attr(std::path::Path::new("/")).is_ok()
///     }
/// }
/// ```
pub trait MountDriver {
    /// What mounting yields.
    type Output;

    /// Serve `backend` at `target`.
    fn mount<B: Fs + 'static>(&self, target: &MountTarget, backend: B) -> Self::Output;
}
