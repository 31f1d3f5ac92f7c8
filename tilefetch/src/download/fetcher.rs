//! Single-tile retrieval with retry and atomic file writes.
//!
//! A fetch runs these steps:
//!
//! 1. If the destination already holds a non-empty file, report `Skipped`
//!    without touching the network.
//! 2. GET the tile URL. The whole attempt (headers and body) is bounded by
//!    the per-request timeout.
//! 3. Stream the body into `{dest}.part`, then check it looks like an image.
//! 4. Rename the part file onto the destination.
//!
//! Transient failures go back to step 2 after a backoff delay until the
//! retry policy is exhausted. The part file is removed on every path that
//! does not end in a rename, including timeouts and dropped futures.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;

use super::policy::{classify_status, classify_transport, FailureClass, RetryPolicy};
use super::types::{DownloadResult, FailureReason};
use crate::coord::TileId;
use crate::log::{Logger, NoOpLogger};
use crate::provider::{HttpClient, TileEndpoint, TransportError};
use crate::{log_debug, log_trace, log_warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for writing tile bodies to disk (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Leading body bytes kept for the image format check.
const HEADER_LEN: usize = 32;

/// Downloads individual tiles to disk.
pub struct TileFetcher<C: HttpClient> {
    client: Arc<C>,
    endpoint: TileEndpoint,
    policy: RetryPolicy,
    timeout: Duration,
    logger: Arc<dyn Logger>,
    cancel: CancellationToken,
}

impl<C: HttpClient> TileFetcher<C> {
    /// Creates a fetcher with the default retry policy and timeout.
    pub fn new(client: Arc<C>, endpoint: TileEndpoint) -> Self {
        Self {
            client,
            endpoint,
            policy: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            logger: Arc::new(NoOpLogger),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Token that interrupts backoff waits. An attempt already in flight is
    /// allowed to finish.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn endpoint(&self) -> &TileEndpoint {
        &self.endpoint
    }

    /// Fetches `tile` into `dest`. Never returns an error: every failure is
    /// reported in the result.
    pub async fn fetch(&self, tile: TileId, dest: &Path) -> DownloadResult {
        if is_present(dest).await {
            log_debug!(self.logger, "Tile {} already present, skipping", tile);
            return DownloadResult::skipped(tile);
        }

        let url = self.endpoint.tile_url(&tile);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            log_trace!(self.logger, "GET {} (attempt {})", url, attempt);

            let error = match tokio::time::timeout(self.timeout, self.attempt(&url, dest)).await {
                Ok(Ok(bytes)) => {
                    log_debug!(self.logger, "Tile {} downloaded ({} bytes)", tile, bytes);
                    return DownloadResult::success(tile, bytes);
                }
                Ok(Err(e)) => e,
                Err(_) => AttemptError::Timeout,
            };

            if error.class() == FailureClass::Permanent {
                log_warn!(self.logger, "Tile {} failed: {}", tile, error);
                return DownloadResult::failed(tile, error.into_reason());
            }

            let Some(delay) = self.policy.delay_for_attempt(attempt) else {
                log_warn!(
                    self.logger,
                    "Tile {} failed after {} attempts: {}",
                    tile,
                    attempt,
                    error
                );
                return DownloadResult::failed(tile, error.into_reason());
            };

            log_warn!(
                self.logger,
                "Tile {} attempt {} failed ({}), retrying in {:?}",
                tile,
                attempt,
                error,
                delay
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return DownloadResult::failed(tile, FailureReason::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One request, streamed to the part file and moved into place.
    async fn attempt(&self, url: &str, dest: &Path) -> Result<u64, AttemptError> {
        let response = self.client.get(url).await.map_err(AttemptError::Transport)?;
        if !response.is_success() {
            return Err(AttemptError::Status(response.status()));
        }

        let part = PartialFile::new(part_path(dest));
        let file = File::create(part.path()).await.map_err(AttemptError::Io)?;
        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);

        let mut body = response.into_body();
        let mut header = Vec::with_capacity(HEADER_LEN);
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(AttemptError::Transport)?;
            if header.len() < HEADER_LEN {
                let take = (HEADER_LEN - header.len()).min(chunk.len());
                header.extend_from_slice(&chunk[..take]);
            }
            writer.write_all(&chunk).await.map_err(AttemptError::Io)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(AttemptError::Io)?;
        drop(writer);

        if written == 0 || image::guess_format(&header).is_err() {
            return Err(AttemptError::InvalidContent);
        }

        tokio::fs::rename(part.path(), dest)
            .await
            .map_err(AttemptError::Io)?;
        part.keep();

        Ok(written)
    }
}

/// Whether a non-empty file already sits at `path`.
async fn is_present(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(m) if m.is_file() && m.len() > 0)
}

/// Temporary path a tile body is streamed into: `{dest}.part`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Removes the part file when dropped unless [`keep`](Self::keep) was called.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptError {
    Status(u16),
    Transport(TransportError),
    Timeout,
    InvalidContent,
    Io(io::Error),
}

impl AttemptError {
    fn class(&self) -> FailureClass {
        match self {
            AttemptError::Status(status) => classify_status(*status),
            AttemptError::Transport(e) => classify_transport(e),
            AttemptError::Timeout => FailureClass::Transient,
            AttemptError::InvalidContent | AttemptError::Io(_) => FailureClass::Permanent,
        }
    }

    fn into_reason(self) -> FailureReason {
        match self {
            AttemptError::Status(status) => FailureReason::HttpStatus(status),
            AttemptError::Transport(TransportError::Timeout) | AttemptError::Timeout => {
                FailureReason::Timeout
            }
            AttemptError::Transport(e) => FailureReason::Network(e.to_string()),
            AttemptError::InvalidContent => FailureReason::InvalidContent,
            AttemptError::Io(e) => FailureReason::Io(e.to_string()),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Status(status) => write!(f, "HTTP {}", status),
            AttemptError::Transport(e) => write!(f, "{}", e),
            AttemptError::Timeout => write!(f, "request timed out"),
            AttemptError::InvalidContent => write!(f, "response is not an image"),
            AttemptError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}
