// src/error.rs
//! Error types for the map viewer

use std::fmt;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Tile or GPS request failed (connect, timeout, non-2xx status)
    Network(String),
    /// Tile bytes could not be decoded as an image
    Decode(String),
    /// Reading or writing the on-disk tile cache failed
    CacheIo(String),
    Parse(String),
    Config(String),
    #[cfg(all(unix, not(target_os = "macos"), feature = "gui"))]
    Gui(String),
    Other(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::Json(e) => write!(f, "JSON error: {}", e),
            MapError::Network(msg) => write!(f, "Network error: {}", msg),
            MapError::Decode(msg) => write!(f, "Decode error: {}", msg),
            MapError::CacheIo(msg) => write!(f, "Cache IO error: {}", msg),
            MapError::Parse(msg) => write!(f, "Parse error: {}", msg),
            MapError::Config(msg) => write!(f, "Config error: {}", msg),
            #[cfg(all(unix, not(target_os = "macos"), feature = "gui"))]
            MapError::Gui(msg) => write!(f, "GUI error: {}", msg),
            MapError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {}

impl From<std::io::Error> for MapError {
    fn from(error: std::io::Error) -> Self {
        MapError::Io(error)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(error: serde_json::Error) -> Self {
        MapError::Json(error)
    }
}

impl From<reqwest::Error> for MapError {
    fn from(error: reqwest::Error) -> Self {
        MapError::Network(error.to_string())
    }
}

impl From<image::ImageError> for MapError {
    fn from(error: image::ImageError) -> Self {
        MapError::Decode(error.to_string())
    }
}

#[cfg(all(unix, not(target_os = "macos"), feature = "gui"))]
impl From<eframe::Error> for MapError {
    fn from(error: eframe::Error) -> Self {
        MapError::Gui(error.to_string())
    }
}

impl From<anyhow::Error> for MapError {
    fn from(error: anyhow::Error) -> Self {
        MapError::Other(error.to_string())
    }
}
