//! Strongly typed pieces of a tile server's capability document.

use serde::Deserialize;

/// Resolution and scale published for one level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ZoomLevelInfo {
    /// Zoom level as used in tile URLs
    #[serde(rename = "level")]
    pub zoom: u8,
    /// Map units per pixel
    pub resolution: f64,
    /// Nominal map scale denominator
    pub scale: f64,
}

/// Rectangle in the server's projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MapExtent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl MapExtent {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Whether `(x, y)` lies inside the rectangle, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.xmin..=self.xmax).contains(&x) && (self.ymin..=self.ymax).contains(&y)
    }
}

/// Pixel dimensions of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGridInfo {
    pub cols: u32,
    pub rows: u32,
}

impl TileGridInfo {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }
}

impl Default for TileGridInfo {
    fn default() -> Self {
        Self::new(256, 256)
    }
}

// Wire shapes. Only the fields the downloader relies on are declared; serde
// ignores the rest of the (large) MapServer document.

#[derive(Debug, Deserialize)]
pub(super) struct RawDocument {
    #[serde(rename = "mapName")]
    pub map_name: String,
    #[serde(rename = "tileInfo")]
    pub tile_info: RawTileInfo,
    #[serde(rename = "fullExtent")]
    pub full_extent: MapExtent,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawTileInfo {
    pub rows: u32,
    pub cols: u32,
    pub lods: Vec<ZoomLevelInfo>,
    #[serde(default)]
    pub origin: Option<RawPoint>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct RawPoint {
    pub x: f64,
    pub y: f64,
}
