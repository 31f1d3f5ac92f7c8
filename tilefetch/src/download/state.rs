//! Download session counters and final summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::types::{DownloadOutcome, DownloadResult, FailureReason};
use crate::coord::TileId;

/// Live counters for one session, shared by every worker.
///
/// Counters only grow. A new session starts from a fresh instance.
#[derive(Debug, Default)]
pub struct SessionStats {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    bytes_written: AtomicU64,
    failures: Mutex<Vec<(TileId, FailureReason)>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a terminal result and returns the number of tiles finished so far.
    pub fn record(&self, result: &DownloadResult) -> u64 {
        match &result.outcome {
            DownloadOutcome::Success => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                self.bytes_written
                    .fetch_add(result.bytes_written, Ordering::Relaxed);
            }
            DownloadOutcome::Skipped => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            DownloadOutcome::Failed(reason) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.failures.lock().push((result.tile, reason.clone()));
            }
        }
        self.attempted.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Acquire)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary.
    ///
    /// `total` is the size of the enumerated range; tiles never handed to a
    /// worker are reported as not dispatched.
    pub fn summary(&self, total: u64, cancelled: bool, elapsed: Duration) -> SessionSummary {
        let mut failures = self.failures.lock().clone();
        failures.sort_by_key(|(tile, _)| (tile.row, tile.col));

        let attempted = self.attempted();
        SessionSummary {
            total,
            attempted,
            succeeded: self.succeeded(),
            skipped: self.skipped(),
            failed: self.failed(),
            bytes_written: self.bytes_written(),
            not_dispatched: total.saturating_sub(attempted),
            cancelled,
            elapsed,
            failures,
        }
    }
}

/// Final report for a download session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Tiles in the enumerated range.
    pub total: u64,
    /// Tiles that reached a terminal result.
    pub attempted: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes_written: u64,
    /// Tiles left untouched because the session was cancelled.
    pub not_dispatched: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
    /// Failed tiles with their reasons, ordered by row then column.
    pub failures: Vec<(TileId, FailureReason)>,
}

impl SessionSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Whether every enumerated tile is now on disk.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.attempted == self.total
    }

    /// One line per failed tile: `zoom/col/row: reason`.
    pub fn failure_report(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(tile, reason)| format!("{}: {}", tile, reason))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_counts_by_outcome() {
        let stats = SessionStats::new();
        stats.record(&DownloadResult::success(TileId::new(1, 0, 0), 100));
        stats.record(&DownloadResult::success(TileId::new(1, 1, 0), 50));
        stats.record(&DownloadResult::skipped(TileId::new(1, 0, 1)));
        let done = stats.record(&DownloadResult::failed(
            TileId::new(1, 1, 1),
            FailureReason::HttpStatus(404),
        ));

        assert_eq!(done, 4);
        assert_eq!(stats.succeeded(), 2);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.bytes_written(), 150);
    }

    #[test]
    fn test_summary_sorts_failures_by_row_then_col() {
        let stats = SessionStats::new();
        for (col, row) in [(5, 2), (3, 1), (1, 2), (4, 1)] {
            stats.record(&DownloadResult::failed(
                TileId::new(7, col, row),
                FailureReason::Timeout,
            ));
        }

        let summary = stats.summary(4, false, Duration::ZERO);
        let order: Vec<(u32, u32)> = summary.failures.iter().map(|(t, _)| (t.col, t.row)).collect();
        assert_eq!(order, vec![(3, 1), (4, 1), (1, 2), (5, 2)]);
    }

    #[test]
    fn test_failure_report_lines() {
        let stats = SessionStats::new();
        stats.record(&DownloadResult::failed(
            TileId::new(14, 6785, 1716),
            FailureReason::HttpStatus(404),
        ));

        let summary = stats.summary(1, false, Duration::ZERO);
        assert_eq!(summary.failure_report(), vec!["14/6785/1716: HTTP 404"]);
        assert!(summary.has_failures());
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_not_dispatched_after_cancel() {
        let stats = SessionStats::new();
        stats.record(&DownloadResult::success(TileId::new(1, 0, 0), 1));

        let summary = stats.summary(10, true, Duration::ZERO);
        assert_eq!(summary.not_dispatched, 9);
        assert!(summary.cancelled);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let stats = Arc::new(SessionStats::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        stats.record(&DownloadResult::success(TileId::new(10, worker, i), 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.attempted(), 8000);
        assert_eq!(stats.succeeded(), 8000);
        assert_eq!(stats.bytes_written(), 8000);
    }
}
