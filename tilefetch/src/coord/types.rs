//! Coordinate type definitions

use std::fmt;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius by the
/// Web Mercator (EPSG:3857) projection.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Address of one downloadable tile.
///
/// `col` grows west to east and `row` grows north to south, both counted from
/// the top-left corner of the server's tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Zoom level (level of detail)
    pub zoom: u8,
    /// X coordinate (east-west), 0 at the grid's west edge
    pub col: u32,
    /// Y coordinate (north-south), 0 at the grid's north edge
    pub row: u32,
}

impl TileId {
    pub fn new(zoom: u8, col: u32, row: u32) -> Self {
        Self { zoom, col, row }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// A latitude/longitude rectangle in degrees.
///
/// Corners may be supplied in any order; they are normalized on construction
/// so that `lat_min <= lat_max` and `lon_min <= lon_max` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
}

impl GeoBoundingBox {
    /// Creates a box from two latitude bounds and two longitude bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use tilefetch::coord::GeoBoundingBox;
    ///
    /// // Canberra CBD, north bound given first
    /// let bbox = GeoBoundingBox::new((-35.258028, -35.333125), (149.085308, 149.175259));
    /// assert_eq!(bbox.lat_min(), -35.333125);
    /// assert_eq!(bbox.lat_max(), -35.258028);
    /// ```
    pub fn new(lat_bounds: (f64, f64), lon_bounds: (f64, f64)) -> Self {
        let (lat_a, lat_b) = lat_bounds;
        let (lon_a, lon_b) = lon_bounds;
        Self {
            lat_min: lat_a.min(lat_b),
            lat_max: lat_a.max(lat_b),
            lon_min: lon_a.min(lon_b),
            lon_max: lon_a.max(lon_b),
        }
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }

    /// North-west corner as `(lat, lon)`.
    pub fn upper_left(&self) -> (f64, f64) {
        (self.lat_max, self.lon_min)
    }

    /// South-east corner as `(lat, lon)`.
    pub fn lower_right(&self) -> (f64, f64) {
        (self.lat_min, self.lon_max)
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{}, {}], lon [{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Errors that can occur during coordinate conversion and range enumeration.
#[derive(Debug, Error)]
pub enum CoordError {
    /// Point lies outside the projection's valid domain.
    #[error(
        "Coordinates ({lat}, {lon}) outside projection range \
         (latitude must be within ±85.05112878, longitude within ±180)"
    )]
    OutOfProjectionRange { lat: f64, lon: f64 },

    /// The server metadata cannot serve this request, e.g. the zoom level
    /// is not published.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Corner tiles are inverted, so no tile lies between them.
    #[error("Empty tile range: upper-left {upper_left} lies after lower-right {lower_right}")]
    EmptyRange {
        upper_left: TileId,
        lower_right: TileId,
    },
}
