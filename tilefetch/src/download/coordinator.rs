//! Download session driver.
//!
//! The coordinator walks a [`TileRange`] in row-major order from a single
//! producer loop and keeps at most `concurrency` fetches in flight on a
//! `JoinSet`. Every enumerated tile ends with exactly one
//! [`DownloadResult`]; a failed tile is recorded and the session moves on.
//!
//! Cancellation stops new dispatches. Fetches already running finish (or
//! time out) and are counted before the summary is returned.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::fetcher::TileFetcher;
use super::progress::{DownloadProgress, ProgressCallback};
use super::state::{SessionStats, SessionSummary};
use super::types::{tile_path, DownloadResult, FailureReason, DEFAULT_EXTENSION};
use crate::config::{clamp_parallel, DownloadConfig};
use crate::coord::{enumerate, GeoBoundingBox, TileId, TileRange};
use crate::error::SessionError;
use crate::log::{Logger, NoOpLogger};
use crate::metadata::ServerMetadata;
use crate::provider::{HttpClient, TileEndpoint};
use crate::{log_error, log_info};

/// Downloads every tile of a bounding box into an output directory.
pub struct DownloadCoordinator<C: HttpClient + 'static> {
    client: Arc<C>,
    endpoint: TileEndpoint,
    output_dir: PathBuf,
    extension: String,
    config: DownloadConfig,
    logger: Arc<dyn Logger>,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
}

impl<C: HttpClient + 'static> DownloadCoordinator<C> {
    pub fn new(client: Arc<C>, endpoint: TileEndpoint, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            endpoint,
            output_dir: output_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            config: DownloadConfig::default(),
            logger: Arc::new(NoOpLogger),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Timeout and retry settings applied to every fetch.
    pub fn with_config(mut self, config: DownloadConfig) -> Self {
        self.config = config;
        self
    }

    /// Output file extension, without the dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token that cancels this coordinator's sessions.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where a tile is written.
    pub fn tile_path(&self, tile: &TileId) -> PathBuf {
        tile_path(&self.output_dir, tile, &self.extension)
    }

    /// Downloads every tile covering `bbox` at `zoom`.
    ///
    /// Fails before any request if the zoom level is not published, the box
    /// lies outside the projection, or the output directory cannot be
    /// created.
    pub async fn run(
        &self,
        bbox: &GeoBoundingBox,
        zoom: u8,
        metadata: &ServerMetadata,
        concurrency: usize,
    ) -> Result<SessionSummary, SessionError> {
        metadata.resolution_for_zoom(zoom)?;
        let range = enumerate(bbox, zoom, metadata)?;

        log_info!(
            self.logger,
            "Region {} at zoom {} covers tiles {}..{} ({} tiles)",
            bbox,
            zoom,
            range.upper_left(),
            range.lower_right(),
            range.tile_count()
        );

        self.run_range(range, concurrency).await
    }

    /// Downloads every tile of an already computed range.
    pub async fn run_range(
        &self,
        range: TileRange,
        concurrency: usize,
    ) -> Result<SessionSummary, SessionError> {
        self.prepare_output_dir().await?;
        Ok(self
            .drive(range.iter(), range.tile_count(), clamp_parallel(concurrency))
            .await)
    }

    /// Downloads an explicit list of tiles, e.g. the failures of an earlier
    /// session. Repeated tiles are fetched once; the summary total is the
    /// number of distinct tiles.
    pub async fn run_tiles<I>(
        &self,
        tiles: I,
        concurrency: usize,
    ) -> Result<SessionSummary, SessionError>
    where
        I: IntoIterator<Item = TileId>,
    {
        let tiles = distinct(tiles);
        let total = tiles.len() as u64;
        self.prepare_output_dir().await?;
        Ok(self
            .drive(tiles.into_iter(), total, clamp_parallel(concurrency))
            .await)
    }

    async fn prepare_output_dir(&self) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SessionError::OutputDir {
                path: self.output_dir.clone(),
                source: e,
            })
    }

    async fn drive<I>(&self, mut tiles: I, total: u64, concurrency: usize) -> SessionSummary
    where
        I: Iterator<Item = TileId>,
    {
        let started = Instant::now();
        let stats = SessionStats::new();
        let fetcher = Arc::new(
            TileFetcher::new(Arc::clone(&self.client), self.endpoint.clone())
                .with_retry_policy(self.config.retry_policy())
                .with_timeout(self.config.timeout())
                .with_logger(Arc::clone(&self.logger))
                .with_cancellation(self.cancel.clone()),
        );

        log_info!(
            self.logger,
            "Downloading {} tiles into {} with {} workers",
            total,
            self.output_dir.display(),
            concurrency
        );

        let mut tasks = JoinSet::new();
        let mut exhausted = false;

        loop {
            while !exhausted && tasks.len() < concurrency && !self.cancel.is_cancelled() {
                let Some(tile) = tiles.next() else {
                    exhausted = true;
                    break;
                };

                let fetcher = Arc::clone(&fetcher);
                let dest = self.tile_path(&tile);
                tasks.spawn(async move {
                    AssertUnwindSafe(fetcher.fetch(tile, &dest))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            DownloadResult::failed(
                                tile,
                                FailureReason::Io("download task panicked".to_string()),
                            )
                        })
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok(result) => {
                    let completed = stats.record(&result);
                    if let Some(progress) = &self.progress {
                        progress(DownloadProgress::snapshot(&stats, completed, total));
                    }
                }
                Err(e) => log_error!(self.logger, "Download task failed: {}", e),
            }
        }

        let cancelled = self.cancel.is_cancelled();
        let summary = stats.summary(total, cancelled, started.elapsed());

        log_info!(
            self.logger,
            "Session finished in {:.1}s: {} succeeded, {} skipped, {} failed, {} not dispatched, {} bytes",
            summary.elapsed.as_secs_f64(),
            summary.succeeded,
            summary.skipped,
            summary.failed,
            summary.not_dispatched,
            summary.bytes_written
        );

        summary
    }
}

/// Drops repeated tiles, keeping first-seen order.
fn distinct<I: IntoIterator<Item = TileId>>(tiles: I) -> Vec<TileId> {
    let mut seen = HashSet::new();
    tiles.into_iter().filter(|tile| seen.insert(*tile)).collect()
}
