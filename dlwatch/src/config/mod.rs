//! User configuration loaded from `~/.dlwatch/config.ini`.
//!
//! Every key is optional; missing keys keep their defaults and a missing
//! file yields [`ConfigFile::default`].
//!
//! ```ini
//! [monitor]
//! render_interval_ms = 1000
//!
//! [download]
//! parallel = 4
//! part_size = 4194304
//!
//! [logging]
//! file = ~/.dlwatch/dlwatch.log
//! level = info
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::engine::{TransferSettings, DEFAULT_PARALLEL, DEFAULT_PART_SIZE};
use crate::monitor::DEFAULT_RENDER_INTERVAL;

/// Directory name under the user's home directory.
const CONFIG_DIR_NAME: &str = ".dlwatch";
const CONFIG_FILE_NAME: &str = "config.ini";
const LOG_FILE_NAME: &str = "dlwatch.log";

/// Accepted values for `[logging] level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Configuration directory (`~/.dlwatch`).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Minimum time between two DOWNLOADING renders.
    pub render_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            render_interval: DEFAULT_RENDER_INTERVAL,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    pub parallel: usize,
    pub part_size: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl DownloadConfig {
    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings::new(self.parallel, self.part_size)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: config_dir().join(LOG_FILE_NAME),
            level: "info".to_string(),
        }
    }
}

/// Complete configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub monitor: MonitorConfig,
    pub download: DownloadConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ini(&ini)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(config)
    }

    /// Build from parsed INI contents.
    pub fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("monitor")) {
            if let Some(ms) = parse_key::<u64>(section, "monitor", "render_interval_ms")? {
                config.monitor.render_interval = Duration::from_millis(ms);
            }
        }

        if let Some(section) = ini.section(Some("download")) {
            if let Some(parallel) = parse_key::<usize>(section, "download", "parallel")? {
                config.download.parallel = at_least_one(parallel, "download", "parallel")?;
            }
            if let Some(size) = parse_key::<u64>(section, "download", "part_size")? {
                config.download.part_size = at_least_one(size, "download", "part_size")?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(file) = section.get("file") {
                config.logging.file = expand_tilde(file);
            }
            if let Some(level) = section.get("level") {
                let level = level.trim().to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("logging", "level", &level, "unknown log level"));
                }
                config.logging.level = level;
            }
        }

        Ok(config)
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_key<T>(props: &Properties, section: &str, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match props.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(section, key, raw, e.to_string())),
    }
}

fn at_least_one<T>(value: T, section: &str, key: &str) -> ConfigResult<T>
where
    T: PartialOrd + From<u8> + ToString,
{
    if value < T::from(1u8) {
        return Err(invalid(section, key, &value.to_string(), "must be at least 1"));
    }
    Ok(value)
}

fn expand_tilde(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}
