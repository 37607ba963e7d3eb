//! Log output: a level filter, optional stderr output and an optional
//! size-rotated log file written off-thread.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{ConfigError, LoggingConfig};

/// Rotated files kept next to the active log.
pub const LOG_BACKUPS: usize = 3;

/// Level filter for a configured level name.
///
/// Unknown names fall back to `error`.
pub fn level_filter(name: &str) -> LevelFilter {
    match name.to_ascii_lowercase().as_str() {
        "critical" | "error" => LevelFilter::ERROR,
        "warning" | "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        _ => LevelFilter::ERROR,
    }
}

/// Log file path and rotation size, if file logging is active.
///
/// `override_path` replaces the configured path. File logging needs it to be
/// enabled, a path, and a positive rotation size.
pub fn log_file(config: &LoggingConfig, override_path: Option<&Path>) -> Option<(PathBuf, u64)> {
    let path = override_path.or(config.path.as_deref())?;
    (config.enabled && config.max_size_bytes > 0).then(|| (path.to_path_buf(), config.max_size_bytes))
}

/// Install the global subscriber.
///
/// `debug` forces the `debug` level and adds stderr output. `RUST_LOG`, when
/// set, overrides the level. Keep the returned guard alive for as long as
/// the file should receive events.
///
/// # Errors
///
/// - [`ConfigError::LogFile`] if the log file cannot be opened
pub fn init(
    config: &LoggingConfig,
    debug: bool,
    override_path: Option<&Path>,
) -> Result<Option<WorkerGuard>, ConfigError> {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        level_filter(&config.level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let (file_layer, guard) = match log_file(config, override_path) {
        Some((path, max_size)) => {
            let writer = SizeRotatingWriter::open(&path, max_size)
                .map_err(|source| ConfigError::LogFile { path, source })?;
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let stderr_layer = debug.then(|| fmt::layer().with_writer(io::stderr));

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::warn!("a global subscriber is already installed");
    }
    Ok(guard)
}

/// Appends to a file, rotating it before a write would exceed `max_size`.
///
/// On rotation `log` becomes `log.1`, `log.1` becomes `log.2` and so on up
/// to [`LOG_BACKUPS`]; the oldest backup is dropped.
#[derive(Debug)]
pub struct SizeRotatingWriter {
    path: PathBuf,
    max_size: u64,
    file: File,
    written: u64,
}

impl SizeRotatingWriter {
    /// Open `path` for appending.
    pub fn open(path: &Path, max_size: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_size,
            file,
            written,
        })
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for n in (1..LOG_BACKUPS).rev() {
            let from = backup_path(&self.path, n);
            if from.exists() {
                fs::rename(&from, backup_path(&self.path, n + 1))?;
            }
        }
        fs::rename(&self.path, backup_path(&self.path, 1))?;
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for SizeRotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// `log.txt` with `n = 2` is `log.txt.2`.
fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{n}"));
    PathBuf::from(name)
}
