//! Tile downloading.
//!
//! [`TileFetcher`] turns one tile into one file, retrying transient failures
//! with backoff. [`DownloadCoordinator`] drives a fetcher across a whole tile
//! range with bounded concurrency and reports a [`SessionSummary`].
//!
//! Files are named `{zoom}_{col}_{row}.{ext}` and written atomically: bytes
//! stream into a `.part` sibling that is renamed into place only after the
//! content has been checked. A non-empty existing file counts as done, so an
//! interrupted session can simply be run again.

mod coordinator;
mod fetcher;
mod policy;
mod progress;
mod state;
mod types;

pub use coordinator::DownloadCoordinator;
pub use fetcher::{part_path, TileFetcher, DEFAULT_TIMEOUT};
pub use policy::{
    classify_status, classify_transport, FailureClass, RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES,
};
pub use progress::{DownloadProgress, ProgressCallback};
pub use state::{SessionStats, SessionSummary};
pub use types::{
    tile_file_name, tile_path, DownloadOutcome, DownloadResult, FailureReason, DEFAULT_EXTENSION,
};
