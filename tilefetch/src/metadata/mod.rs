//! Tile server capability metadata.
//!
//! Parses the ArcGIS MapServer capability document (`?f=json`) into a
//! validated [`ServerMetadata`]. Every field the tile math depends on is
//! checked at load time, so a malformed document fails before any download
//! starts rather than on first use.
//!
//! # Example
//!
//! ```
//! use tilefetch::metadata::ServerMetadata;
//!
//! let json = r#"{
//!     "mapName": "Layers",
//!     "tileInfo": {
//!         "rows": 256, "cols": 256,
//!         "lods": [{"level": 0, "resolution": 156543.03392800014, "scale": 591657527.591555}]
//!     },
//!     "fullExtent": {"xmin": -20037508.34, "ymin": -20037508.34, "xmax": 20037508.34, "ymax": 20037508.34}
//! }"#;
//!
//! let metadata = ServerMetadata::from_json_str(json).unwrap();
//! assert_eq!(metadata.map_name(), "Layers");
//! assert!(metadata.resolution_for_zoom(0).is_ok());
//! assert!(metadata.resolution_for_zoom(1).is_err());
//! ```

mod types;

pub use types::{MapExtent, TileGridInfo, ZoomLevelInfo};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::provider::HttpClient;
use types::RawDocument;

/// Errors raised while loading or querying server metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Required fields are missing, of the wrong type, or hold invalid values.
    #[error("Failed to parse server metadata: {0}")]
    Parse(String),

    /// The metadata file could not be read.
    #[error("Failed to read metadata file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The capability endpoint could not be reached or returned an error.
    #[error("Failed to fetch server metadata from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The requested zoom level is not among the published levels.
    #[error("Zoom level {zoom} not supported (server publishes {min}..={max})")]
    UnsupportedZoom { zoom: u8, min: u8, max: u8 },
}

/// Validated, immutable description of a tile server.
///
/// Safe to share between any number of readers; nothing mutates after load.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerMetadata {
    map_name: String,
    zoom_levels: Vec<ZoomLevelInfo>,
    tile_grid: TileGridInfo,
    extent: MapExtent,
    origin: Option<(f64, f64)>,
}

impl ServerMetadata {
    /// Builds metadata from already-parsed parts, applying the same checks as
    /// the document loaders.
    pub fn new(
        map_name: impl Into<String>,
        zoom_levels: Vec<ZoomLevelInfo>,
        tile_grid: TileGridInfo,
        extent: MapExtent,
    ) -> Result<Self, MetadataError> {
        let mut zoom_levels = zoom_levels;
        zoom_levels.sort_by_key(|lod| lod.zoom);

        if zoom_levels.is_empty() {
            return Err(MetadataError::Parse(
                "tileInfo.lods must list at least one level".to_string(),
            ));
        }
        if zoom_levels.windows(2).any(|w| w[0].zoom == w[1].zoom) {
            return Err(MetadataError::Parse(
                "tileInfo.lods contains duplicate levels".to_string(),
            ));
        }
        if let Some(lod) = zoom_levels
            .iter()
            .find(|lod| !(lod.resolution.is_finite() && lod.resolution > 0.0))
        {
            return Err(MetadataError::Parse(format!(
                "tileInfo.lods level {} has invalid resolution {}",
                lod.zoom, lod.resolution
            )));
        }
        if tile_grid.cols == 0 || tile_grid.rows == 0 {
            return Err(MetadataError::Parse(format!(
                "tileInfo cols/rows must be positive, got {}x{}",
                tile_grid.cols, tile_grid.rows
            )));
        }
        let finite = [extent.xmin, extent.xmax, extent.ymin, extent.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite || extent.xmin >= extent.xmax || extent.ymin >= extent.ymax {
            return Err(MetadataError::Parse(format!(
                "fullExtent is degenerate: {:?}",
                extent
            )));
        }

        Ok(Self {
            map_name: map_name.into(),
            zoom_levels,
            tile_grid,
            extent,
            origin: None,
        })
    }

    /// Sets an explicit tile grid origin (top-left corner in projected units).
    ///
    /// ArcGIS servers anchor their tile grid at `tileInfo.origin`, which is
    /// usually outside `fullExtent`. Without an origin the top-left corner of
    /// the full extent is used.
    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = Some((x, y));
        self
    }

    /// Parses a capability document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, MetadataError> {
        let raw: RawDocument =
            serde_json::from_str(json).map_err(|e| MetadataError::Parse(e.to_string()))?;

        let metadata = Self::new(
            raw.map_name,
            raw.tile_info.lods,
            TileGridInfo::new(raw.tile_info.cols, raw.tile_info.rows),
            raw.full_extent,
        )?;

        Ok(match raw.tile_info.origin {
            Some(origin) if origin.x.is_finite() && origin.y.is_finite() => {
                metadata.with_origin(origin.x, origin.y)
            }
            _ => metadata,
        })
    }

    /// Loads a capability document saved on disk.
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let json = std::fs::read_to_string(path).map_err(|e| MetadataError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    /// Fetches the capability document from a MapServer service URL.
    ///
    /// Requests `{service_url}?f=json`.
    pub async fn fetch<C: HttpClient>(client: &C, service_url: &str) -> Result<Self, MetadataError> {
        let url = capabilities_url(service_url);
        let fetch_error = |reason: String| MetadataError::Fetch {
            url: url.clone(),
            reason,
        };

        let response = client
            .get(&url)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status())));
        }

        let body = response
            .into_bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let json = String::from_utf8(body)
            .map_err(|e| MetadataError::Parse(format!("document is not UTF-8: {}", e)))?;

        Self::from_json_str(&json)
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Published levels, ordered by zoom.
    pub fn zoom_levels(&self) -> &[ZoomLevelInfo] {
        &self.zoom_levels
    }

    pub fn zoom_level(&self, zoom: u8) -> Option<&ZoomLevelInfo> {
        self.zoom_levels
            .binary_search_by_key(&zoom, |lod| lod.zoom)
            .ok()
            .map(|index| &self.zoom_levels[index])
    }

    pub fn min_zoom(&self) -> u8 {
        self.zoom_levels[0].zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.zoom_levels[self.zoom_levels.len() - 1].zoom
    }

    /// Map units per pixel at `zoom`.
    pub fn resolution_for_zoom(&self, zoom: u8) -> Result<f64, MetadataError> {
        self.zoom_level(zoom)
            .map(|lod| lod.resolution)
            .ok_or(MetadataError::UnsupportedZoom {
                zoom,
                min: self.min_zoom(),
                max: self.max_zoom(),
            })
    }

    pub fn tile_grid(&self) -> TileGridInfo {
        self.tile_grid
    }

    /// The server's full extent as published.
    pub fn extent(&self) -> MapExtent {
        self.extent
    }

    pub fn origin(&self) -> Option<(f64, f64)> {
        self.origin
    }

    /// Extent used for tile addressing.
    ///
    /// Its top-left corner is the grid origin and its bottom-right corner is
    /// the bottom-right of the full extent.
    pub fn grid_extent(&self) -> MapExtent {
        match self.origin {
            Some((x, y)) => MapExtent::new(x, self.extent.xmax, self.extent.ymin, y),
            None => self.extent,
        }
    }
}

/// Capability document URL for a MapServer service.
pub fn capabilities_url(service_url: &str) -> String {
    format!("{}?f=json", service_url.trim_end_matches('/'))
}
