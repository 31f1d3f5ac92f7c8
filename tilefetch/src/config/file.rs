//! Configuration file handling for ~/.tilefetch/config.ini.
//!
//! ```ini
//! [server]
//! url = https://maps.six.nsw.gov.au/arcgis/rest/services/public/NSW_Imagery/MapServer
//! metadata = ~/maps/NSW_Imagery.json
//! path_order = zoom/row/col
//!
//! [download]
//! parallel = 4
//! timeout = 30
//! max_retries = 3
//! backoff_ms = 500
//!
//! [output]
//! directory = ~/tiles
//! extension = png
//!
//! [logging]
//! file = ~/.tilefetch/tilefetch.log
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::defaults::{
    clamp_parallel, config_file_path, default_log_path, DEFAULT_BACKOFF_MS, DEFAULT_OUTPUT_DIR,
    DEFAULT_PARALLEL_DOWNLOADS, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS,
};
use super::download::DownloadConfig;
use crate::download::DEFAULT_EXTENSION;
use crate::provider::PathOrder;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    /// MapServer service URL
    pub url: Option<String>,
    /// Local copy of the capability document
    pub metadata: Option<PathBuf>,
    pub path_order: PathOrder,
}

/// `[download]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSettings {
    pub parallel: usize,
    /// Seconds
    pub timeout: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL_DOWNLOADS,
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub extension: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_path(),
        }
    }
}

/// Parsed user configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub download: DownloadSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilefetch/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parses configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        parse_ini(&ini)
    }

    /// Download settings as a [`DownloadConfig`].
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::new()
            .with_parallel_downloads(self.download.parallel)
            .with_timeout_secs(self.download.timeout)
            .with_max_retries(self.download.max_retries)
            .with_backoff_ms(self.download.backoff_ms)
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a request timeout in whole seconds. Zero is rejected.
///
/// Shared with command-line overrides so both sources accept the same values.
pub fn parse_timeout_secs(value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err("must be a positive integer (seconds)".to_string()),
    }
}

/// Normalizes a tile file extension: optional leading dot removed,
/// lowercased, ASCII alphanumeric only.
pub fn parse_extension(value: &str) -> Result<String, String> {
    let ext = value.trim().trim_start_matches('.');
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must be alphanumeric, e.g. png".to_string());
    }
    Ok(ext.to_lowercase())
}

/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                if !(v.starts_with("http://") || v.starts_with("https://")) {
                    return Err(invalid(
                        "server",
                        "url",
                        v,
                        "must start with http:// or https://",
                    ));
                }
                config.server.url = Some(v.trim_end_matches('/').to_string());
            }
        }
        if let Some(v) = section.get("metadata") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.metadata = Some(expand_tilde(v));
            }
        }
        if let Some(v) = section.get("path_order") {
            config.server.path_order = v.parse().map_err(|_| {
                invalid(
                    "server",
                    "path_order",
                    v,
                    "must be zoom/row/col or zoom/col/row",
                )
            })?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("parallel") {
            let parallel: usize = v
                .trim()
                .parse()
                .map_err(|_| invalid("download", "parallel", v, "must be a positive integer"))?;
            config.download.parallel = clamp_parallel(parallel);
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout =
                parse_timeout_secs(v).map_err(|reason| invalid("download", "timeout", v, &reason))?;
        }
        if let Some(v) = section.get("max_retries") {
            config.download.max_retries = v.trim().parse().map_err(|_| {
                invalid("download", "max_retries", v, "must be a non-negative integer")
            })?;
        }
        if let Some(v) = section.get("backoff_ms") {
            config.download.backoff_ms = v.trim().parse().map_err(|_| {
                invalid(
                    "download",
                    "backoff_ms",
                    v,
                    "must be a non-negative integer (milliseconds)",
                )
            })?;
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.output.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("extension") {
            config.output.extension =
                parse_extension(v).map_err(|reason| invalid("output", "extension", v, &reason))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
