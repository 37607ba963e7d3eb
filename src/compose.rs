//! # Volume Composer
//!
//! Turns configured volumes into mounts.
//!
//! Volumes are grouped by mount point. A group is either one mirror volume
//! or any number of transformed volumes whose trees are merged, in configured
//! order, into one namespace. Every group is validated and every rule set
//! compiled before the first source tree is walked: a configuration error
//! aborts the whole composition and no mount is produced.
//!
//! ```rust
//! use remapfs::{Backend, Composer, VolumeConfig, TransformationConfig};
//! use std::path::{Path, PathBuf};
//!
//! let volume = VolumeConfig {
//!     source_path: PathBuf::from("/src"),
//!     mount_point: PathBuf::from("/mnt"),
//!     allow_other: false,
//!     transformations: vec![TransformationConfig { from: "/src/(.+)".into(), to: "all/$1".into() }],
//! };
//! let composer = Composer::with_enumerator(|root: &Path| vec![root.join("a.txt")]);
//! let mounts = composer.compose(&[volume]).unwrap();
//!
//! let Backend::Transformed(fs) = &mounts[0].backend else { panic!("expected transformed") };
//! assert_eq!(fs.tree().resolve("/all/a.txt"), Some(Path::new("/src/a.txt")));
//! ```

use std::path::Path;

use indexmap::IndexMap;

use crate::{
    Backend, ConfigError, MirrorFs, Mount, MountTarget, RuleSet, SourceEnumerator, TransformFs,
    TreeBuilder, VolumeConfig, WalkEnumerator,
};

/// Kind of a valid mount group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    /// A single volume without transformations.
    Mirror,
    /// One or more volumes with transformations.
    Transformed,
}

/// The volumes sharing one mount point, in configured order.
#[derive(Debug, Clone)]
pub struct MountGroup<'a> {
    mount_point: &'a Path,
    volumes: Vec<&'a VolumeConfig>,
}

impl<'a> MountGroup<'a> {
    /// Group `volumes` by mount point.
    ///
    /// Groups come out in order of first appearance; volumes keep their
    /// configured order inside a group.
    pub fn group(volumes: &'a [VolumeConfig]) -> Vec<MountGroup<'a>> {
        let mut groups: IndexMap<&Path, Vec<&VolumeConfig>> = IndexMap::new();
        for volume in volumes {
            groups
                .entry(volume.mount_point.as_path())
                .or_default()
                .push(volume);
        }
        groups
            .into_iter()
            .map(|(mount_point, volumes)| MountGroup {
                mount_point,
                volumes,
            })
            .collect()
    }

    /// The shared mount point.
    pub fn mount_point(&self) -> &'a Path {
        self.mount_point
    }

    /// The grouped volumes.
    pub fn volumes(&self) -> &[&'a VolumeConfig] {
        &self.volumes
    }

    /// Validate the group.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateMirror`] for more than one mirror volume
    /// - [`ConfigError::MixedMountPoint`] for a mirror volume next to transformed ones
    pub fn kind(&self) -> Result<MountKind, ConfigError> {
        let mirrors = self.volumes.iter().filter(|v| v.is_mirror()).count();
        match (mirrors, self.volumes.len()) {
            (0, _) => Ok(MountKind::Transformed),
            (1, 1) => Ok(MountKind::Mirror),
            (m, n) if m == n => Err(ConfigError::DuplicateMirror {
                mount_point: self.mount_point.to_path_buf(),
            }),
            _ => Err(ConfigError::MixedMountPoint {
                mount_point: self.mount_point.to_path_buf(),
            }),
        }
    }

    /// Other users get access only if every volume grants it.
    pub fn allow_other(&self) -> bool {
        self.volumes.iter().all(|v| v.allow_other)
    }

    fn target(&self) -> MountTarget {
        MountTarget {
            mount_point: self.mount_point.to_path_buf(),
            allow_other: self.allow_other(),
        }
    }
}

/// A validated group, ready to build.
enum Plan<'a> {
    Mirror(&'a Path),
    Transformed(Vec<(&'a Path, RuleSet)>),
}

/// Builds mounts from volume configurations.
///
/// Source trees are enumerated through `E`, a recursive directory walk by
/// default.
#[derive(Debug, Clone, Default)]
pub struct Composer<E = WalkEnumerator> {
    enumerator: E,
}

impl Composer<WalkEnumerator> {
    /// Composer walking the real source directories.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: SourceEnumerator> Composer<E> {
    /// Composer enumerating sources through `enumerator`.
    pub fn with_enumerator(enumerator: E) -> Self {
        Self { enumerator }
    }

    /// Validate every volume, then build one mount per mount point.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from grouping or rule compilation. Nothing is
    /// enumerated or built in that case.
    pub fn compose(&self, volumes: &[VolumeConfig]) -> Result<Vec<Mount>, ConfigError> {
        let groups = MountGroup::group(volumes);
        let plans = groups
            .iter()
            .map(|group| -> Result<_, ConfigError> { Ok((group, plan(group)?)) })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let mounts = plans
            .into_iter()
            .map(|(group, plan)| self.build(group, plan))
            .collect();
        Ok(mounts)
    }

    fn build(&self, group: &MountGroup<'_>, plan: Plan<'_>) -> Mount {
        let target = group.target();
        let backend = match plan {
            Plan::Mirror(source) => {
                tracing::info!(
                    mount_point = %target.mount_point.display(),
                    source = %source.display(),
                    "mirror mount"
                );
                Backend::Mirror(MirrorFs::new(source))
            }
            Plan::Transformed(volumes) => {
                let mut builder = TreeBuilder::new();
                let mut roots = Vec::with_capacity(volumes.len());
                for (source, rules) in volumes {
                    tracing::info!(
                        mount_point = %target.mount_point.display(),
                        source = %source.display(),
                        rules = rules.len(),
                        "adding volume"
                    );
                    builder.add_volume(&rules, self.enumerator.enumerate(source));
                    roots.push(source.to_path_buf());
                }
                let tree = builder.build();
                tracing::info!(
                    mount_point = %target.mount_point.display(),
                    files = tree.len(),
                    "transformed mount"
                );
                Backend::Transformed(TransformFs::new(tree, roots))
            }
        };
        Mount { target, backend }
    }
}

fn plan<'a>(group: &MountGroup<'a>) -> Result<Plan<'a>, ConfigError> {
    match group.kind()? {
        MountKind::Mirror => {
            let volume: &'a VolumeConfig = group.volumes[0];
            Ok(Plan::Mirror(volume.source_path.as_path()))
        }
        MountKind::Transformed => group
            .volumes
            .iter()
            .map(|&volume: &&'a VolumeConfig| -> Result<_, ConfigError> {
                let rules = RuleSet::new(&volume.transformations)?;
                Ok((volume.source_path.as_path(), rules))
            })
            .collect::<Result<Vec<_>, ConfigError>>()
            .map(Plan::Transformed),
    }
}
