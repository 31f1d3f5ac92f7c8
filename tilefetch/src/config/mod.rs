//! Configuration for download sessions.
//!
//! [`DownloadConfig`] carries the tunables a session needs. [`ConfigFile`]
//! reads user defaults from `~/.tilefetch/config.ini`; command-line flags are
//! layered on top by the CLI.
//!
//! ```
//! use tilefetch::config::{ConfigFile, DownloadConfig};
//!
//! let file = ConfigFile::from_ini_str("[download]\nparallel = 2\n").unwrap();
//! let config: DownloadConfig = file.download_config().with_max_retries(0);
//! assert_eq!(config.parallel_downloads(), 2);
//! ```

mod defaults;
mod download;
mod file;

pub use defaults::{
    clamp_parallel, config_directory, config_file_path, default_log_path,
    DEFAULT_PARALLEL_DOWNLOADS, DEFAULT_TIMEOUT_SECS, MAX_PARALLEL_DOWNLOADS,
};
pub use download::DownloadConfig;
pub use file::{
    parse_extension, parse_timeout_secs, ConfigFile, ConfigFileError, DownloadSettings,
    LoggingSettings, OutputSettings, ServerSettings,
};
