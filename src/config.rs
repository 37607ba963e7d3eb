//! JSON configuration model.
//!
//! ```json
//! {
//!   "logging": { "enabled": true, "level": "info", "max_size_bytes": 524288, "path": "log.txt" },
//!   "volumes": [
//!     {
//!       "source_path": "/srv/docs",
//!       "mount_point": "/mnt/docs",
//!       "allow_other": false,
//!       "transformations": [ { "from": "/srv/docs/(.+)\\.md", "to": "markdown/$1.md" } ]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Volumes to serve, in configuration order.
    pub volumes: Vec<VolumeConfig>,
}

impl Config {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] if it is not valid JSON or a required key is missing
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Write`] if the configuration cannot be serialized or written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(std::io::Error::from)
            .and_then(|text| std::fs::write(path, text))
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// A starting configuration with one transformed volume.
    pub fn sample() -> Self {
        Self {
            logging: LoggingConfig {
                enabled: true,
                path: Some(PathBuf::from("../data/log.txt")),
                ..LoggingConfig::default()
            },
            volumes: vec![VolumeConfig {
                source_path: PathBuf::from("../data/source"),
                mount_point: PathBuf::from("../data/target"),
                allow_other: false,
                transformations: vec![TransformationConfig {
                    from: r".*/(?P<title>[^/]+)/(?P<category>[^/]+)/content/(?P<filename>.+)\.(?P<extension>md|odt|txt)$".into(),
                    to: "cyclopaedia/${title} [${category}]/${filename}.${extension}".into(),
                }],
            }],
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether file logging is on.
    pub enabled: bool,
    /// One of `critical`, `error`, `warning`, `info`, `debug`.
    pub level: String,
    /// Size at which the log file rotates; 0 disables file logging.
    pub max_size_bytes: u64,
    /// Log file path.
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "error".into(),
            max_size_bytes: 524_288,
            path: None,
        }
    }
}

/// One source tree to serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Real directory to expose.
    pub source_path: PathBuf,
    /// Where the virtual namespace is mounted.
    pub mount_point: PathBuf,
    /// Let users other than the mounting one access the mount.
    #[serde(default)]
    pub allow_other: bool,
    /// Ordered rename rules; empty means a verbatim mirror.
    #[serde(default)]
    pub transformations: Vec<TransformationConfig>,
}

impl VolumeConfig {
    /// Returns `true` if the volume has no rules.
    pub fn is_mirror(&self) -> bool {
        self.transformations.is_empty()
    }
}

/// A rename rule as written in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationConfig {
    /// Regular expression matched against the real path.
    pub from: String,
    /// Replacement template producing the virtual path.
    pub to: String,
}
