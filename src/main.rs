//! remapfs binary
//!
//! Loads a configuration, composes its volumes into mounts and hands each
//! mount to a driver.
//!
//! ## Usage
//!
//! ```bash
//! # Write a sample configuration and exit
//! remapfs --install --config config.json
//!
//! # Compose and show the mount plan, with every virtual file
//! remapfs --config config.json --tree
//! ```
//!
//! The built-in driver only reports the plan; a kernel binding serves the
//! same mounts by implementing `MountDriver`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use remapfs::{
    Backend, Composer, Config, ConfigError, Fs, FsError, Mount, MountDriver, MountTarget, logging,
};

const DEFAULT_CONFIG: &str = "config.json";

#[derive(Parser, Debug)]
#[command(name = "remapfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of the configuration file
    #[arg(short, long, required_unless_present = "install")]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long)]
    debug: bool,

    /// Generate a sample configuration file and exit
    #[arg(short, long)]
    install: bool,

    /// The path of the log file, overriding the configuration
    #[arg(short, long)]
    log_path: Option<PathBuf>,

    /// Print the virtual files of every transformed mount
    #[arg(short, long)]
    tree: bool,
}

/// Reports each mount instead of serving it.
struct PlanDriver;

impl MountDriver for PlanDriver {
    type Output = Result<(), FsError>;

    fn mount<B: Fs + 'static>(&self, target: &MountTarget, backend: B) -> Self::Output {
        let root = backend.get_attr(Path::new("/"))?;
        let entries = backend
            .read_dir(Path::new("/"))?
            .collect_all()?
            .into_iter()
            .filter(|entry| entry.name != "." && entry.name != "..")
            .count();
        println!(
            "{} (mode {:o}, allow_other: {}): {} top-level entries",
            target.mount_point.display(),
            root.mode(),
            target.allow_other,
            entries
        );
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    if args.install {
        return match Config::sample().save(&config_path) {
            Ok(()) => {
                println!(
                    "Configuration file successfully generated to {}.",
                    config_path.display()
                );
                ExitCode::SUCCESS
            }
            Err(err) => config_failure(&err),
        };
    }

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => return config_failure(&err),
    };

    let _guard = match logging::init(&config.logging, args.debug, args.log_path.as_deref()) {
        Ok(guard) => guard,
        Err(err) => return config_failure(&err),
    };

    let mounts = match Composer::new().compose(&config.volumes) {
        Ok(mounts) => mounts,
        Err(err) => {
            tracing::error!(error = %err, "configuration is invalid");
            eprintln!("Configuration is invalid. {err}");
            return ExitCode::from(2);
        }
    };

    let mut status = ExitCode::SUCCESS;
    for mount in mounts {
        if args.tree {
            print_tree(&mount);
        }
        let mount_point = mount.target.mount_point.clone();
        if let Err(err) = mount.drive(&PlanDriver) {
            tracing::error!(mount_point = %mount_point.display(), error = %err, "mount failed");
            eprintln!("{}: {err}", mount_point.display());
            status = ExitCode::FAILURE;
        }
    }
    status
}

fn config_failure(err: &ConfigError) -> ExitCode {
    eprintln!("{err}");
    ExitCode::from(2)
}

fn print_tree(mount: &Mount) {
    let Backend::Transformed(fs) = &mount.backend else {
        return;
    };
    let mut files: Vec<_> = fs.tree().files().collect();
    files.sort_unstable();
    for (virtual_path, source) in files {
        println!(
            "{}/{virtual_path} <- {}",
            mount.target.mount_point.display(),
            source.display()
        );
    }
}
