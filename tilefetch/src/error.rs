//! Errors that abort a whole download session.
//!
//! Per-tile problems never show up here; they are recorded as
//! [`FailureReason`](crate::download::FailureReason)s in the summary.

use std::path::PathBuf;

use thiserror::Error;

use crate::coord::CoordError;
use crate::metadata::MetadataError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Metadata could not be loaded or does not publish the zoom level.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// The bounding box cannot be turned into a tile range.
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
