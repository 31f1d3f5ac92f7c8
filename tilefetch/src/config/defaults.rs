//! Built-in configuration defaults.

use std::path::PathBuf;

use crate::download::{DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES};

/// Tiles in flight at once. Kept small to go easy on public servers.
pub const DEFAULT_PARALLEL_DOWNLOADS: usize = 4;

/// Upper bound for `parallel`; anything larger is clamped.
pub const MAX_PARALLEL_DOWNLOADS: usize = 64;

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_RETRIES: u32 = DEFAULT_MAX_RETRIES;

pub const DEFAULT_BACKOFF_MS: u64 = DEFAULT_INITIAL_DELAY_MS;

pub const DEFAULT_MAX_BACKOFF_SECS: u64 = DEFAULT_MAX_DELAY_SECS;

/// Directory tiles are written to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "tiles";

pub const DEFAULT_LOG_FILE: &str = "tilefetch.log";

/// Clamps a requested concurrency into `1..=MAX_PARALLEL_DOWNLOADS`.
pub fn clamp_parallel(requested: usize) -> usize {
    requested.clamp(1, MAX_PARALLEL_DOWNLOADS)
}

/// Path to the config directory (~/.tilefetch).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilefetch")
}

/// Path to the config file (~/.tilefetch/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default log file (~/.tilefetch/tilefetch.log).
pub fn default_log_path() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_parallel() {
        assert_eq!(clamp_parallel(0), 1);
        assert_eq!(clamp_parallel(8), 8);
        assert_eq!(clamp_parallel(1000), MAX_PARALLEL_DOWNLOADS);
    }

    #[test]
    fn test_paths_live_under_config_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(default_log_path().ends_with(DEFAULT_LOG_FILE));
    }
}
