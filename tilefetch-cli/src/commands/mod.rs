//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`download`] - Download every tile covering a bounding box
//! - [`tiles`] - Show the tile range for a bounding box (dry run)
//! - [`metadata`] - Show what a MapServer publishes

pub mod common;
pub mod download;
pub mod metadata;
pub mod tiles;
