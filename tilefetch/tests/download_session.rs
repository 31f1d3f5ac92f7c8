//! Integration tests for a full download session.
//!
//! These tests drive the public API end to end against an in-process tile
//! server:
//! - capability document → metadata → tile range
//! - concurrent download with retries, failures and skips
//! - resuming an interrupted session
//!
//! Run with: `cargo test --test download_session`

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use tilefetch::config::DownloadConfig;
use tilefetch::coord::{enumerate, GeoBoundingBox, TileId};
use tilefetch::download::{tile_file_name, DownloadCoordinator, FailureReason};
use tilefetch::metadata::{capabilities_url, ServerMetadata};
use tilefetch::provider::{HttpClient, HttpResponse, PathOrder, TileEndpoint, TransportError};
use tilefetch::SessionError;

// ============================================================================
// Test Server
// ============================================================================

const SERVICE: &str = "https://maps.test/arcgis/rest/services/Canberra/MapServer";
const CAPABILITIES: &str = include_str!("fixtures/canberra_mapserver.json");
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

/// Serves the capability document and a JPEG for every tile URL, except for
/// the overrides registered on it.
#[derive(Default)]
struct TileServer {
    /// URL → statuses returned for successive requests, then 200.
    overrides: Mutex<HashMap<String, Vec<u16>>>,
    requests: AtomicUsize,
}

impl TileServer {
    fn new() -> Self {
        Self::default()
    }

    fn respond_with(self, url: String, statuses: Vec<u16>) -> Self {
        self.overrides.lock().insert(url, statuses);
        self
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl HttpClient for TileServer {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        if url == capabilities_url(SERVICE) {
            return Ok(HttpResponse::from_bytes(200, CAPABILITIES.as_bytes().to_vec()));
        }

        self.requests.fetch_add(1, Ordering::SeqCst);
        let scripted = self.overrides.lock().get_mut(url).and_then(|statuses| {
            if statuses.is_empty() {
                None
            } else {
                Some(statuses.remove(0))
            }
        });

        match scripted {
            Some(status) => Ok(HttpResponse::from_bytes(status, Vec::new())),
            None => Ok(HttpResponse::from_bytes(200, JPEG.to_vec())),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn canberra() -> GeoBoundingBox {
    GeoBoundingBox::new((-35.258028, -35.333125), (149.085308, 149.175259))
}

fn tile_url(col: u32, row: u32) -> String {
    format!("{}/tile/14/{}/{}", SERVICE, row, col)
}

fn config() -> DownloadConfig {
    DownloadConfig::new().with_backoff_ms(1).with_max_retries(2)
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_capabilities_to_tiles_on_disk() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("canberra");
    let server = Arc::new(TileServer::new());

    let metadata = ServerMetadata::fetch(server.as_ref(), SERVICE).await.unwrap();
    assert_eq!(metadata.map_name(), "Canberra");

    let range = enumerate(&canberra(), 14, &metadata).unwrap();
    assert_eq!(range.upper_left(), TileId::new(14, 6785, 1716));
    assert_eq!(range.lower_right(), TileId::new(14, 6789, 1720));

    let summary = DownloadCoordinator::new(
        Arc::clone(&server),
        TileEndpoint::from_service_url(SERVICE, PathOrder::ZoomRowCol),
        &out,
    )
    .with_config(config())
    .with_extension("jpg")
    .run(&canberra(), 14, &metadata, 4)
    .await
    .unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.succeeded, 25);
    assert_eq!(server.requests(), 25);
    assert_eq!(files_in(&out), 25);

    for tile in range.iter() {
        let path = out.join(tile_file_name(&tile, "jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), JPEG, "{}", path.display());
    }
}

#[tokio::test]
async fn test_transient_errors_retry_and_permanent_errors_are_reported() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(
        TileServer::new()
            .respond_with(tile_url(6786, 1717), vec![503, 502])
            .respond_with(tile_url(6788, 1719), vec![404]),
    );
    let metadata = ServerMetadata::from_json_str(CAPABILITIES).unwrap();

    let summary = DownloadCoordinator::new(
        Arc::clone(&server),
        TileEndpoint::from_service_url(SERVICE, PathOrder::ZoomRowCol),
        temp.path(),
    )
    .with_config(config())
    .run(&canberra(), 14, &metadata, 3)
    .await
    .unwrap();

    assert_eq!(summary.succeeded, 24);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.failures,
        vec![(TileId::new(14, 6788, 1719), FailureReason::HttpStatus(404))]
    );
    assert_eq!(summary.failure_report(), vec!["14/6788/1719: HTTP 404"]);
    // 25 first attempts plus two retries for the flaky tile.
    assert_eq!(server.requests(), 27);
    assert!(!temp.path().join("14_6788_1719.png").exists());
    assert!(!temp.path().join("14_6788_1719.png.part").exists());
}

#[tokio::test]
async fn test_resume_only_fetches_missing_tiles() {
    let temp = TempDir::new().unwrap();
    let metadata = ServerMetadata::from_json_str(CAPABILITIES).unwrap();
    let endpoint = TileEndpoint::from_service_url(SERVICE, PathOrder::ZoomRowCol);

    let first = Arc::new(TileServer::new().respond_with(tile_url(6785, 1716), vec![404]));
    let summary = DownloadCoordinator::new(first, endpoint.clone(), temp.path())
        .with_config(config())
        .run(&canberra(), 14, &metadata, 4)
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);

    let second = Arc::new(TileServer::new());
    let summary = DownloadCoordinator::new(Arc::clone(&second), endpoint, temp.path())
        .with_config(config())
        .run(&canberra(), 14, &metadata, 4)
        .await
        .unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.skipped, 24);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(second.requests(), 1);
}

#[tokio::test]
async fn test_zoom_outside_capabilities_fails_fast() {
    let temp = TempDir::new().unwrap();
    let server = Arc::new(TileServer::new());
    let metadata = ServerMetadata::from_json_str(CAPABILITIES).unwrap();

    let result = DownloadCoordinator::new(
        Arc::clone(&server),
        TileEndpoint::from_service_url(SERVICE, PathOrder::ZoomRowCol),
        temp.path().join("never"),
    )
    .run(&canberra(), 18, &metadata, 4)
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, SessionError::Metadata(_)));
    assert!(err.to_string().contains("18"));
    assert_eq!(server.requests(), 0);
    assert!(!temp.path().join("never").exists());
}
