//! Configuration handling for NCFS.
//!
//! Read from `config.toml` in the NCFS config directory
//! (`~/.config/ncfs/` on Linux, overridable with `NCFS_CONFIG_DIR`). Every
//! section and key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ncfs_core::DataRepresentation;
use ncfs_repr::{DEFAULT_FLOAT_FORMAT, DataReprKind};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Mount configuration
    #[serde(default)]
    pub mount: MountConfig,

    /// Representation configuration
    #[serde(default)]
    pub representation: ReprConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Mount-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountConfig {
    /// Allow other users to access the mount
    #[serde(default)]
    pub allow_other: bool,

    /// Filesystem name shown in the mount table
    #[serde(default = "default_fs_name")]
    pub fs_name: String,
}

fn default_fs_name() -> String {
    "ncfs".to_string()
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            allow_other: false,
            fs_name: default_fs_name(),
        }
    }
}

/// How variable payloads are rendered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReprConfig {
    /// `text` or `binary`
    #[serde(default = "default_data_repr")]
    pub data: String,

    /// printf-style format for text payloads
    #[serde(default = "default_float_format")]
    pub float_format: String,
}

fn default_data_repr() -> String {
    DataReprKind::default().to_string()
}

fn default_float_format() -> String {
    DEFAULT_FLOAT_FORMAT.to_string()
}

impl Default for ReprConfig {
    fn default() -> Self {
        Self {
            data: default_data_repr(),
            float_format: default_float_format(),
        }
    }
}

impl ReprConfig {
    /// The configured representation kind.
    pub fn kind(&self) -> Result<DataReprKind> {
        self.data
            .parse()
            .with_context(|| format!("Invalid representation.data {:?}", self.data))
    }

    /// Build the payload representation, validating the float format.
    pub fn build(&self) -> Result<Box<dyn DataRepresentation>> {
        self.kind()?
            .build(&self.float_format)
            .with_context(|| format!("Invalid representation.float_format {:?}", self.float_format))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level used when no `-v` is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::read(&path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Path of the default config file.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// A commented sample configuration.
    pub fn sample_toml() -> &'static str {
        r#"# NCFS configuration

[mount]
# Allow other users to access the mount
allow_other = false
# Filesystem name shown in the mount table
fs_name = "ncfs"

[representation]
# "text" (one formatted value per line) or "binary" (raw native-order bytes)
data = "text"
# printf-style format for text payloads
float_format = "%f"

[logging]
# Level used when no -v flag is given
level = "warn"
"#
    }
}

/// Get the XDG config directory for NCFS.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("NCFS_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "ncfs").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the XDG cache directory for NCFS.
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ncfs").map(|dirs| dirs.cache_dir().to_path_buf())
}
