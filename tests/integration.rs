//! Integration tests driving configurations end to end against real
//! temporary directories.
//!
//! These tests verify that:
//! 1. A saved configuration loads, composes and serves the expected namespace
//! 2. Content is read through virtual paths, while the namespace stays read-only
//! 3. Mirror mounts pass operations through unchanged
//! 4. Invalid configurations are rejected before any tree is built

use remapfs::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

const CYCLOPAEDIA_FROM: &str = r".*/(?P<title>[^/]+)/(?P<category>[^/]+)/content/(?P<filename>.+)\.(?P<extension>md|odt|txt)$";
const CYCLOPAEDIA_TO: &str = r"cyclopaedia/\g<title> [\g<category>]/\g<filename>.\g<extension>";

/// A source tree holding the `food` cyclopaedia.
fn food_source() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, contents) in [
        ("food/vegetables/content/aubergine.txt", "Solanum melongena"),
        ("food/fruits/content/apple.md", "# Apple"),
        ("food/fruits/content/banana.odt", "banana"),
        ("food/fruits/draft/cherry.md", "unfinished"),
    ] {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }
    dir
}

fn transformed_volume(source: &Path, mount_point: &str) -> VolumeConfig {
    VolumeConfig {
        source_path: source.to_path_buf(),
        mount_point: PathBuf::from(mount_point),
        allow_other: false,
        transformations: vec![TransformationConfig {
            from: CYCLOPAEDIA_FROM.into(),
            to: CYCLOPAEDIA_TO.into(),
        }],
    }
}

fn mirror_volume(source: &Path, mount_point: &str) -> VolumeConfig {
    VolumeConfig {
        source_path: source.to_path_buf(),
        mount_point: PathBuf::from(mount_point),
        allow_other: false,
        transformations: Vec::new(),
    }
}

fn compose_one(volume: VolumeConfig) -> Mount {
    let mut mounts = Composer::new().compose(&[volume]).unwrap();
    assert_eq!(mounts.len(), 1);
    mounts.remove(0)
}

/// Read a whole file through any backend.
fn cat<B: Fs>(fs: &B, path: &str) -> Result<Vec<u8>, FsError> {
    let path = Path::new(path);
    let size = fs.get_attr(path)?.size as usize;
    let handle = fs.open(path, OpenFlags::READ)?;
    let mut buf = vec![0u8; size];
    let read = fs.read_at(handle, &mut buf, 0);
    fs.release(handle)?;
    buf.truncate(read?);
    Ok(buf)
}

fn names<B: Fs>(fs: &B, path: &str) -> Vec<String> {
    fs.read_dir(Path::new(path)).unwrap().names().unwrap()
}

// =============================================================================
// Transformed mounts
// =============================================================================

#[test]
fn cyclopaedia_namespace_from_saved_config() {
    let source = food_source();
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("config.json");
    Config {
        logging: LoggingConfig::default(),
        volumes: vec![transformed_volume(source.path(), "/mnt/cyclopaedia")],
    }
    .save(&config_path)
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    let mut mounts = Composer::new().compose(&config.volumes).unwrap();
    let Backend::Transformed(fs) = mounts.remove(0).backend else {
        panic!("expected a transformed mount");
    };

    assert_eq!(names(&fs, "/"), vec![".", "..", "cyclopaedia"]);
    assert_eq!(
        names(&fs, "/cyclopaedia"),
        vec![".", "..", "food [fruits]", "food [vegetables]"]
    );
    assert_eq!(
        names(&fs, "/cyclopaedia/food [fruits]"),
        vec![".", "..", "apple.md", "banana.odt"]
    );
    assert_eq!(
        fs.tree().resolve("cyclopaedia/food [vegetables]/aubergine.txt"),
        Some(
            source
                .path()
                .join("food/vegetables/content/aubergine.txt")
                .as_path()
        )
    );
    assert_eq!(
        fs.tree().resolve("cyclopaedia/food [vegetables]/courgette.txt"),
        None
    );
    assert!(fs.tree().files().all(|(_, real)| !real.ends_with("cherry.md")));
}

#[test]
fn content_is_read_through_virtual_paths() {
    let source = food_source();
    let Backend::Transformed(fs) = compose_one(transformed_volume(source.path(), "/mnt/c")).backend
    else {
        panic!("expected a transformed mount");
    };
    assert_eq!(
        cat(&fs, "/cyclopaedia/food [vegetables]/aubergine.txt").unwrap(),
        b"Solanum melongena"
    );
    assert_eq!(cat(&fs, "/cyclopaedia/food [fruits]/apple.md").unwrap(), b"# Apple");
}

#[test]
fn transformed_namespace_is_read_only() {
    let source = food_source();
    let Backend::Transformed(fs) = compose_one(transformed_volume(source.path(), "/mnt/c")).backend
    else {
        panic!("expected a transformed mount");
    };
    let apple = Path::new("/cyclopaedia/food [fruits]/apple.md");
    let eacces = rustix::io::Errno::ACCESS.raw_os_error();

    for err in [
        fs.unlink(apple).unwrap_err(),
        fs.rename(apple, Path::new("/cyclopaedia/pear.md")).unwrap_err(),
        fs.create_dir(Path::new("/cyclopaedia/meat"), 0o755).unwrap_err(),
        fs.create(Path::new("/cyclopaedia/new.md"), 0o644).unwrap_err(),
        fs.open(Path::new("/cyclopaedia/food [fruits]/cherry.md"), OpenFlags::READ)
            .unwrap_err(),
    ] {
        assert!(matches!(err, FsError::PermissionDenied { .. }));
        assert_eq!(err.errno(), eacces);
    }
    assert!(source.path().join("food/fruits/content/apple.md").exists());
}

#[test]
fn missing_paths_and_virtual_directories() {
    let source = food_source();
    let Backend::Transformed(fs) = compose_one(transformed_volume(source.path(), "/mnt/c")).backend
    else {
        panic!("expected a transformed mount");
    };

    let dir = fs.get_attr(Path::new("/cyclopaedia/food [fruits]")).unwrap();
    assert!(dir.is_dir());
    assert_eq!(dir.mode(), 0o40755);

    let err = fs
        .get_attr(Path::new("/cyclopaedia/food [vegetables]/courgette.txt"))
        .unwrap_err();
    assert!(matches!(err, FsError::NotFound { .. }));

    assert_eq!(
        names(&fs, "/cyclopaedia/food [meat]/ham.txt"),
        vec![".", "..", "food [fruits]", "food [vegetables]"]
    );
}

#[test]
fn two_transformed_volumes_share_a_mount() {
    let first = food_source();
    let second = tempfile::tempdir().unwrap();
    let notes = second.path().join("travel/places/content");
    fs::create_dir_all(&notes).unwrap();
    fs::write(notes.join("lisbon.md"), "tiles").unwrap();

    let mounts = Composer::new()
        .compose(&[
            transformed_volume(first.path(), "/mnt/c"),
            transformed_volume(second.path(), "/mnt/c"),
        ])
        .unwrap();
    assert_eq!(mounts.len(), 1);
    let Backend::Transformed(fs) = &mounts[0].backend else {
        panic!("expected a transformed mount");
    };
    assert_eq!(
        names(fs, "/cyclopaedia"),
        vec![".", "..", "food [fruits]", "food [vegetables]", "travel [places]"]
    );
    assert_eq!(cat(fs, "/cyclopaedia/travel [places]/lisbon.md").unwrap(), b"tiles");
}

// =============================================================================
// Mirror mounts
// =============================================================================

#[test]
fn mirror_passes_operations_through() {
    let source = food_source();
    let Backend::Mirror(fs) = compose_one(mirror_volume(source.path(), "/mnt/m")).backend else {
        panic!("expected a mirror mount");
    };

    assert_eq!(names(&fs, "/"), vec![".", "..", "food"]);
    assert_eq!(cat(&fs, "/food/fruits/draft/cherry.md").unwrap(), b"unfinished");

    let handle = fs.create(Path::new("/food/new.txt"), 0o644).unwrap();
    fs.write_at(handle, b"fresh", 0).unwrap();
    fs.release(handle).unwrap();
    assert_eq!(fs::read(source.path().join("food/new.txt")).unwrap(), b"fresh");

    fs.unlink(Path::new("/food/new.txt")).unwrap();
    let err = fs.get_attr(Path::new("/food/new.txt")).unwrap_err();
    assert_eq!(err.errno(), rustix::io::Errno::NOENT.raw_os_error());
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn mixed_mount_point_is_rejected() {
    let source = food_source();
    let err = Composer::new()
        .compose(&[
            transformed_volume(source.path(), "/mnt/x"),
            mirror_volume(source.path(), "/mnt/x"),
        ])
        .unwrap_err();
    assert!(matches!(err, ConfigError::MixedMountPoint { .. }));
}

#[test]
fn invalid_rule_rejects_whole_configuration() {
    let source = food_source();
    let mut broken = transformed_volume(source.path(), "/mnt/b");
    broken.transformations[0].from = "(unclosed".into();
    let err = Composer::new()
        .compose(&[mirror_volume(source.path(), "/mnt/a"), broken])
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { .. }));
}

#[test]
fn config_missing_mount_point_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "volumes": [ { "source_path": "/x" } ] }"#).unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(ConfigError::Parse { .. })
    ));
}

// =============================================================================
// Drivers
// =============================================================================

struct Snapshot;

impl MountDriver for Snapshot {
    type Output = (MountTarget, Vec<String>);

    fn mount<B: Fs + 'static>(&self, target: &MountTarget, backend: B) -> Self::Output {
        (target.clone(), names(&backend, "/"))
    }
}

#[test]
fn every_mount_reaches_the_driver() {
    let source = food_source();
    let mut allowed = mirror_volume(source.path(), "/mnt/m");
    allowed.allow_other = true;
    let mounts = Composer::new()
        .compose(&[transformed_volume(source.path(), "/mnt/c"), allowed])
        .unwrap();

    let driven: Vec<_> = mounts.into_iter().map(|m| m.drive(&Snapshot)).collect();
    assert_eq!(driven[0].0.mount_point, PathBuf::from("/mnt/c"));
    assert!(!driven[0].0.allow_other);
    assert_eq!(driven[0].1, vec![".", "..", "cyclopaedia"]);
    assert!(driven[1].0.allow_other);
    assert_eq!(driven[1].1, vec![".", "..", "food"]);
}
