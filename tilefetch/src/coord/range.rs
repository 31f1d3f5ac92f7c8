//! Tile range enumeration over a bounding box.

use super::{geo_to_tile, CoordError, GeoBoundingBox, TileId};
use crate::metadata::ServerMetadata;

/// Rectangular block of tiles at one zoom level, corners inclusive.
///
/// A `TileRange` is a plain value: iterating it never consumes it, so the same
/// range can be walked any number of times with identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    upper_left: TileId,
    lower_right: TileId,
}

impl TileRange {
    /// Creates a range from its north-west and south-east corner tiles.
    ///
    /// Fails with `EmptyRange` when the corners are inverted on either axis
    /// or lie on different zoom levels. Equal corners are a one-tile range.
    pub fn new(upper_left: TileId, lower_right: TileId) -> Result<Self, CoordError> {
        if upper_left.zoom != lower_right.zoom
            || upper_left.col > lower_right.col
            || upper_left.row > lower_right.row
        {
            return Err(CoordError::EmptyRange {
                upper_left,
                lower_right,
            });
        }

        Ok(Self {
            upper_left,
            lower_right,
        })
    }

    pub fn upper_left(&self) -> TileId {
        self.upper_left
    }

    pub fn lower_right(&self) -> TileId {
        self.lower_right
    }

    pub fn zoom(&self) -> u8 {
        self.upper_left.zoom
    }

    /// Number of columns in the range. A range spanning every `u32`
    /// column has width 2^32, so this is counted in `u64`.
    pub fn width(&self) -> u64 {
        u64::from(self.lower_right.col - self.upper_left.col) + 1
    }

    /// Number of rows in the range.
    pub fn height(&self) -> u64 {
        u64::from(self.lower_right.row - self.upper_left.row) + 1
    }

    /// Total number of tiles, `width * height`, saturating at `u64::MAX`.
    pub fn tile_count(&self) -> u64 {
        self.width().saturating_mul(self.height())
    }

    pub fn contains(&self, tile: &TileId) -> bool {
        tile.zoom == self.zoom()
            && (self.upper_left.col..=self.lower_right.col).contains(&tile.col)
            && (self.upper_left.row..=self.lower_right.row).contains(&tile.row)
    }

    /// Iterates the tiles in row-major order: every column of the top row,
    /// then the next row down.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            current: 0,
            total: self.tile_count(),
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileId;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &TileRange {
    type Item = TileId;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy row-major iterator over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    current: u64,
    total: u64,
}

impl Iterator for TileRangeIter {
    type Item = TileId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }

        let width = self.range.width();
        let col = self.range.upper_left.col + (self.current % width) as u32;
        let row = self.range.upper_left.row + (self.current / width) as u32;

        self.current += 1;

        Some(TileId::new(self.range.zoom(), col, row))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.current = self.current.saturating_add(n as u64).min(self.total);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total - self.current).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRangeIter {}

/// Computes the tiles covering `bbox` at `zoom`.
///
/// The upper-left tile comes from the box's `(lat_max, lon_min)` corner and
/// the lower-right tile from `(lat_min, lon_max)`. A box smaller than one
/// tile yields exactly one tile.
pub fn enumerate(
    bbox: &GeoBoundingBox,
    zoom: u8,
    metadata: &ServerMetadata,
) -> Result<TileRange, CoordError> {
    let (ul_lat, ul_lon) = bbox.upper_left();
    let (lr_lat, lr_lon) = bbox.lower_right();

    let upper_left = geo_to_tile(ul_lat, ul_lon, zoom, metadata)?;
    let lower_right = geo_to_tile(lr_lat, lr_lon, zoom, metadata)?;

    TileRange::new(upper_left, lower_right)
}
