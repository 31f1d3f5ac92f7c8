//! Progress reporting for download sessions.

use super::state::SessionStats;

/// Snapshot handed to the progress callback after each finished tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Tiles with a terminal result so far.
    pub completed: u64,
    /// Tiles in the enumerated range.
    pub total: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

impl DownloadProgress {
    pub(crate) fn snapshot(stats: &SessionStats, completed: u64, total: u64) -> Self {
        Self {
            completed,
            total,
            succeeded: stats.succeeded(),
            skipped: stats.skipped(),
            failed: stats.failed(),
            bytes_written: stats.bytes_written(),
        }
    }

    /// Progress as a ratio (0.0 to 1.0). An empty session counts as done.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Progress callback, invoked once per terminal tile result.
///
/// Called from the coordinator's collecting task, never concurrently with
/// itself.
pub type ProgressCallback = Box<dyn Fn(DownloadProgress) + Send + Sync>;
