//! Tile server access.
//!
//! [`HttpClient`] is the seam between the downloader and the network; the
//! production implementation is [`ReqwestClient`]. [`TileEndpoint`] turns a
//! [`TileId`](crate::coord::TileId) into the URL an ArcGIS MapServer expects.

mod arcgis;
mod http;

pub use arcgis::{PathOrder, TileEndpoint};
pub use http::{HttpClient, HttpResponse, ReqwestClient, TransportError, USER_AGENT};

#[cfg(test)]
pub use http::tests::{MockHttpClient, MockReply};
