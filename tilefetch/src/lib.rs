//! tilefetch - raster tile downloads from ArcGIS MapServer caches
//!
//! Given a geographic bounding box and a zoom level, tilefetch works out
//! which tiles of a MapServer tile cache cover the box and downloads each of
//! them to its own file.
//!
//! The pieces, bottom-up:
//!
//! - [`metadata`]: parses the service's capability document into
//!   [`ServerMetadata`](metadata::ServerMetadata)
//! - [`coord`]: Web Mercator projection, tile indexing and range enumeration
//! - [`provider`]: HTTP transport and tile URL construction
//! - [`download`]: per-tile fetch with retries and the concurrent session
//!   coordinator
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilefetch::coord::GeoBoundingBox;
//! use tilefetch::download::DownloadCoordinator;
//! use tilefetch::metadata::ServerMetadata;
//! use tilefetch::provider::{ReqwestClient, TileEndpoint};
//!
//! let client = Arc::new(ReqwestClient::new()?);
//! let metadata = ServerMetadata::fetch(client.as_ref(), service_url).await?;
//! let endpoint = TileEndpoint::from_service_url(service_url, Default::default());
//!
//! let summary = DownloadCoordinator::new(client, endpoint, "tiles")
//!     .run(&GeoBoundingBox::new((-35.25, -35.33), (149.08, 149.17)), 14, &metadata, 4)
//!     .await?;
//! println!("{} downloaded, {} failed", summary.succeeded, summary.failed);
//! ```

pub mod config;
pub mod coord;
pub mod download;
pub mod error;
pub mod log;
pub mod logging;
pub mod metadata;
pub mod provider;

pub use error::SessionError;

/// Crate version, as published in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
