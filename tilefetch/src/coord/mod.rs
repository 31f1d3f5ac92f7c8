//! Coordinate conversion module
//!
//! Converts geographic coordinates (latitude/longitude, degrees) to the
//! server's projected coordinate system and from there to tile column/row
//! indices, plus the reverse direction.
//!
//! # Projection
//!
//! Tile servers publishing a Web Mercator cache (EPSG:3857 / wkid 102100)
//! use the spherical Mercator formula on the WGS84 semi-major axis `R`:
//!
//! ```text
//! x = R * lon_rad
//! y = R * ln(tan(π/4 + lat_rad/2))
//! ```
//!
//! # Tile addressing
//!
//! Columns count west to east from the grid's left edge and rows count north
//! to south from its top edge:
//!
//! ```text
//! col = floor((x - xmin) / (resolution * tile_cols))
//! row = floor((ymax - y) / (resolution * tile_rows))
//! ```
//!
//! Indices outside the grid are clamped rather than rejected, so a box that
//! pokes past the published extent still yields its edge tiles.

mod range;
mod types;

pub use range::{enumerate, TileRange};
pub use types::{
    CoordError, GeoBoundingBox, TileId, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

use std::f64::consts::FRAC_PI_4;

use crate::metadata::{MapExtent, ServerMetadata, TileGridInfo};

/// Converts geographic coordinates to Web Mercator metres.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
///
/// # Returns
///
/// `(x, y)` in projected units, or `OutOfProjectionRange` for points the
/// projection cannot represent (including NaN).
#[inline]
pub fn geo_to_projected(lat: f64, lon: f64) -> Result<(f64, f64), CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::OutOfProjectionRange { lat, lon });
    }

    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();

    Ok((x, y))
}

/// Converts Web Mercator metres back to `(lat, lon)` in degrees.
#[inline]
pub fn projected_to_geo(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
    (lat, lon)
}

/// Number of tiles needed to cover `extent_span` map units, at least one.
#[inline]
pub fn tiles_across(extent_span: f64, tile_span: f64) -> u32 {
    let count = (extent_span / tile_span).ceil();
    if count >= 1.0 {
        count.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Converts a projected point to the tile containing it.
///
/// Never fails: negative indices clamp to 0 and indices past the grid clamp
/// to the last tile of the extent at this resolution.
pub fn projected_to_tile(
    x: f64,
    y: f64,
    zoom: u8,
    extent: &MapExtent,
    grid: &TileGridInfo,
    resolution: f64,
) -> TileId {
    let span_x = resolution * grid.cols as f64;
    let span_y = resolution * grid.rows as f64;

    let max_col = tiles_across(extent.width(), span_x) - 1;
    let max_row = tiles_across(extent.height(), span_y) - 1;

    let col = clamp_index(((x - extent.xmin) / span_x).floor(), max_col);
    let row = clamp_index(((extent.ymax - y) / span_y).floor(), max_row);

    TileId::new(zoom, col, row)
}

// NaN and negatives land on 0.
fn clamp_index(value: f64, max: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= max as f64 {
        max
    } else {
        value as u32
    }
}

/// Converts geographic coordinates to the tile containing them on `metadata`'s
/// grid at `zoom`.
pub fn geo_to_tile(
    lat: f64,
    lon: f64,
    zoom: u8,
    metadata: &ServerMetadata,
) -> Result<TileId, CoordError> {
    let resolution = resolution(zoom, metadata)?;
    let (x, y) = geo_to_projected(lat, lon)?;

    Ok(projected_to_tile(
        x,
        y,
        zoom,
        &metadata.grid_extent(),
        &metadata.tile_grid(),
        resolution,
    ))
}

/// Projected rectangle covered by a tile.
pub fn tile_bounds(tile: &TileId, metadata: &ServerMetadata) -> Result<MapExtent, CoordError> {
    let resolution = resolution(tile.zoom, metadata)?;
    let grid = metadata.tile_grid();
    let extent = metadata.grid_extent();

    let span_x = resolution * grid.cols as f64;
    let span_y = resolution * grid.rows as f64;

    let xmin = extent.xmin + tile.col as f64 * span_x;
    let ymax = extent.ymax - tile.row as f64 * span_y;

    Ok(MapExtent::new(xmin, xmin + span_x, ymax - span_y, ymax))
}

/// Geographic `(lat, lon)` of a tile's north-west corner.
pub fn tile_origin_geo(tile: &TileId, metadata: &ServerMetadata) -> Result<(f64, f64), CoordError> {
    let bounds = tile_bounds(tile, metadata)?;
    Ok(projected_to_geo(bounds.xmin, bounds.ymax))
}

fn resolution(zoom: u8, metadata: &ServerMetadata) -> Result<f64, CoordError> {
    metadata.resolution_for_zoom(zoom).map_err(CoordError::from)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::metadata::{MapExtent, ServerMetadata, TileGridInfo, ZoomLevelInfo};

    /// Half the width of the Web Mercator square, in metres.
    pub const WEB_MERCATOR_HALF: f64 = 20037508.342789244;

    /// Standard Web Mercator tiling scheme with levels 0..=20.
    pub fn web_mercator() -> ServerMetadata {
        let lods = (0..=20u8)
            .map(|zoom| ZoomLevelInfo {
                zoom,
                resolution: 156543.03392804097 / 2f64.powi(zoom as i32),
                scale: 591657527.591555 / 2f64.powi(zoom as i32),
            })
            .collect();
        ServerMetadata::new(
            "WebMercator",
            lods,
            TileGridInfo::default(),
            MapExtent::new(
                -WEB_MERCATOR_HALF,
                WEB_MERCATOR_HALF,
                -WEB_MERCATOR_HALF,
                WEB_MERCATOR_HALF,
            ),
        )
        .unwrap()
    }

    /// The Canberra fixture: a single zoom-14 level whose grid starts at
    /// (140.999, -28.001) and runs to the far corner of the Mercator square.
    pub fn canberra_fixture() -> ServerMetadata {
        ServerMetadata::new(
            "Canberra",
            vec![ZoomLevelInfo {
                zoom: 14,
                resolution: 9.5546,
                scale: 36111.909643,
            }],
            TileGridInfo::new(256, 256),
            MapExtent::new(140.999, WEB_MERCATOR_HALF, -WEB_MERCATOR_HALF, -28.001),
        )
        .unwrap()
    }
}
