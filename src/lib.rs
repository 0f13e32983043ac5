// src/lib.rs
//! OSM Viewer Library
//!
//! OpenStreetMap tile projection, on-disk tile caching, marker overlays and
//! HTTP GPS polling for a small map viewer.

pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod map;
pub mod marker;
pub mod viewer;

// Re-export main types for convenience
pub use error::{MapError, Result};
pub use gps::{GpsData, GpsPoller};
pub use map::{GeoCoord, TileCache, TileIndex, Tileset};
pub use marker::{Marker, MarkerLayer, ShapeKind};
pub use viewer::Viewer;
