//! Per-tile download results.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::coord::TileId;

/// Default output file extension.
pub const DEFAULT_EXTENSION: &str = "png";

/// Why a tile ended without a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Server answered with a non-success status.
    HttpStatus(u16),
    /// The last attempt exceeded the per-request timeout.
    Timeout,
    /// Response body was empty or not a recognizable image.
    InvalidContent,
    /// Local filesystem error while writing the tile.
    Io(String),
    /// Connection-level failure that exhausted the retry budget.
    Network(String),
    /// Cancellation interrupted the tile between attempts.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::HttpStatus(status) => write!(f, "HTTP {}", status),
            FailureReason::Timeout => write!(f, "timed out"),
            FailureReason::InvalidContent => write!(f, "invalid content"),
            FailureReason::Io(msg) => write!(f, "I/O error: {}", msg),
            FailureReason::Network(msg) => write!(f, "network error: {}", msg),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Tile was fetched and written.
    Success,
    /// A non-empty file already existed; no request was made.
    Skipped,
    Failed(FailureReason),
}

/// Result for one tile, produced exactly once per tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub tile: TileId,
    pub outcome: DownloadOutcome,
    /// Bytes written by this run (0 unless `Success`).
    pub bytes_written: u64,
}

impl DownloadResult {
    pub fn success(tile: TileId, bytes_written: u64) -> Self {
        Self {
            tile,
            outcome: DownloadOutcome::Success,
            bytes_written,
        }
    }

    pub fn skipped(tile: TileId) -> Self {
        Self {
            tile,
            outcome: DownloadOutcome::Skipped,
            bytes_written: 0,
        }
    }

    pub fn failed(tile: TileId, reason: FailureReason) -> Self {
        Self {
            tile,
            outcome: DownloadOutcome::Failed(reason),
            bytes_written: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == DownloadOutcome::Success
    }

    pub fn is_skipped(&self) -> bool {
        self.outcome == DownloadOutcome::Skipped
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.outcome {
            DownloadOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// File name for a tile: `{zoom}_{col}_{row}.{extension}`.
pub fn tile_file_name(tile: &TileId, extension: &str) -> String {
    format!("{}_{}_{}.{}", tile.zoom, tile.col, tile.row, extension)
}

/// Full output path for a tile inside `output_dir`.
pub fn tile_path(output_dir: &Path, tile: &TileId, extension: &str) -> PathBuf {
    output_dir.join(tile_file_name(tile, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_file_name() {
        let tile = TileId::new(14, 6785, 1716);
        assert_eq!(tile_file_name(&tile, "png"), "14_6785_1716.png");
        assert_eq!(tile_file_name(&tile, "jpg"), "14_6785_1716.jpg");
    }

    #[test]
    fn test_tile_path() {
        let path = tile_path(Path::new("/tmp/out"), &TileId::new(3, 1, 2), DEFAULT_EXTENSION);
        assert_eq!(path, PathBuf::from("/tmp/out/3_1_2.png"));
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(FailureReason::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(FailureReason::InvalidContent.to_string(), "invalid content");
        assert_eq!(
            FailureReason::Io("disk full".into()).to_string(),
            "I/O error: disk full"
        );
    }

    #[test]
    fn test_result_accessors() {
        let tile = TileId::new(1, 0, 0);
        assert!(DownloadResult::success(tile, 10).is_success());
        assert!(DownloadResult::skipped(tile).is_skipped());

        let failed = DownloadResult::failed(tile, FailureReason::Timeout);
        assert_eq!(failed.failure(), Some(&FailureReason::Timeout));
        assert_eq!(failed.bytes_written, 0);
    }
}
