//! ArcGIS MapServer tile endpoint.
//!
//! # URL Pattern
//!
//! `{service}/tile/{zoom}/{row}/{col}`
//!
//! ArcGIS cached map services address tiles by level, then row, then column.
//! Some proxies and mirrors swap the last two segments, so the order is
//! configurable through [`PathOrder`].

use std::fmt;
use std::str::FromStr;

use crate::coord::TileId;

/// Order of the row and column segments in a tile URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathOrder {
    /// `{zoom}/{row}/{col}`, the ArcGIS REST convention
    #[default]
    ZoomRowCol,
    /// `{zoom}/{col}/{row}`, the slippy-map convention
    ZoomColRow,
}

impl FromStr for PathOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zoom/row/col" | "zrc" | "arcgis" => Ok(PathOrder::ZoomRowCol),
            "zoom/col/row" | "zcr" | "xyz" => Ok(PathOrder::ZoomColRow),
            other => Err(format!(
                "unknown path order '{}' (expected zoom/row/col or zoom/col/row)",
                other
            )),
        }
    }
}

impl fmt::Display for PathOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrder::ZoomRowCol => write!(f, "zoom/row/col"),
            PathOrder::ZoomColRow => write!(f, "zoom/col/row"),
        }
    }
}

/// Builds tile URLs for one MapServer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEndpoint {
    base_url: String,
    path_order: PathOrder,
}

impl TileEndpoint {
    /// Creates an endpoint from the tile base URL (the `.../tile` prefix).
    pub fn new(base_url: impl Into<String>, path_order: PathOrder) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            path_order,
        }
    }

    /// Creates an endpoint from a MapServer service URL, appending `/tile`.
    pub fn from_service_url(service_url: &str, path_order: PathOrder) -> Self {
        Self::new(
            format!("{}/tile", service_url.trim_end_matches('/')),
            path_order,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path_order(&self) -> PathOrder {
        self.path_order
    }

    /// Builds the URL for a single tile.
    pub fn tile_url(&self, tile: &TileId) -> String {
        match self.path_order {
            PathOrder::ZoomRowCol => {
                format!("{}/{}/{}/{}", self.base_url, tile.zoom, tile.row, tile.col)
            }
            PathOrder::ZoomColRow => {
                format!("{}/{}/{}/{}", self.base_url, tile.zoom, tile.col, tile.row)
            }
        }
    }
}
