//! Download session configuration.

use std::time::Duration;

use super::defaults::{
    clamp_parallel, DEFAULT_BACKOFF_MS, DEFAULT_MAX_BACKOFF_SECS, DEFAULT_PARALLEL_DOWNLOADS,
    DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS,
};
use crate::download::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER};

/// Tunables for a download session.
///
/// # Example
///
/// ```
/// use tilefetch::config::DownloadConfig;
///
/// let config = DownloadConfig::default();
/// assert_eq!(config.parallel_downloads(), 4);
/// assert_eq!(config.max_retries(), 3);
///
/// let config = DownloadConfig::new()
///     .with_parallel_downloads(8)
///     .with_timeout_secs(10)
///     .with_max_retries(5);
/// assert_eq!(config.retry_policy().max_attempts(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadConfig {
    /// Tiles in flight at once
    parallel_downloads: usize,
    /// Per-request timeout (in seconds)
    timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    max_retries: u32,
    /// Delay before the first retry (in milliseconds)
    backoff_ms: u64,
    /// Growth factor applied to the delay after each retry
    backoff_factor: f64,
    /// Delay cap (in seconds)
    max_backoff_secs: u64,
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concurrent downloads, clamped to at least 1.
    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.parallel_downloads = clamp_parallel(parallel);
        self
    }

    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_max_backoff_secs(mut self, secs: u64) -> Self {
        self.max_backoff_secs = secs;
        self
    }

    pub fn parallel_downloads(&self) -> usize {
        self.parallel_downloads
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Exponential backoff policy built from these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::ExponentialBackoff {
            max_attempts: self.max_retries.saturating_add(1),
            initial_delay: Duration::from_millis(self.backoff_ms),
            max_delay: Duration::from_secs(self.max_backoff_secs),
            multiplier: self.backoff_factor,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            parallel_downloads: DEFAULT_PARALLEL_DOWNLOADS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
            backoff_factor: DEFAULT_BACKOFF_MULTIPLIER,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
        }
    }
}
