// src/config.rs
//! Configuration management with file-based storage

use crate::error::{MapError, Result};
use crate::map::{GeoCoord, DEFAULT_TILE_URL, DEFAULT_USER_AGENT, MAX_ZOOM};
use crate::marker::{Color, Marker, Route, ShapeKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overlay marker declared in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub lat: f64,
    pub lng: f64,
    pub shape: ShapeKind,
    pub size: f32,
    pub color: Color,
    /// When set the marker moves back and forth towards this coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_to: Option<GeoCoord>,
    #[serde(default = "default_route_period")]
    pub route_period_secs: f64,
}

fn default_route_period() -> f64 {
    20.0
}

impl MarkerConfig {
    pub fn to_marker(&self) -> Marker {
        let coord = GeoCoord::new(self.lat, self.lng);
        let marker = Marker::shape(coord, self.shape, self.size, self.color)
            .with_outline([0.0, 0.0, 0.0, 1.0], 1.5);
        match self.route_to {
            Some(to) => marker.with_route(Route::new(coord, to, self.route_period_secs)),
            None => marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub cache_dir: PathBuf,
    pub gps_url: Option<String>,
    pub zoom: u8,
    /// Corners of the area to load, in any order
    pub bbox: [GeoCoord; 2],
    pub tile_url: String,
    pub user_agent: String,
    pub tile_timeout_secs: u64,
    pub download_delay_ms: u64,
    pub gps_poll_interval_secs: u64,
    pub gps_timeout_secs: u64,
    pub gps_point_radius: f32,
    pub gps_presence_radius: f32,
    pub markers: Vec<MarkerConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tile_cache"),
            gps_url: Some("http://192.168.4.1/gps".to_string()),
            zoom: 17,
            bbox: [
                GeoCoord::new(-24.87034, -65.46616),
                GeoCoord::new(-24.87910, -65.45532),
            ],
            tile_url: DEFAULT_TILE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tile_timeout_secs: 10,
            download_delay_ms: 100,
            gps_poll_interval_secs: 5,
            gps_timeout_secs: 1,
            gps_point_radius: 6.0,
            gps_presence_radius: 24.0,
            markers: vec![
                MarkerConfig {
                    lat: -24.872878,
                    lng: -65.462669,
                    shape: ShapeKind::Triangle,
                    size: 8.0,
                    color: [0.95, 0.3, 0.2, 1.0],
                    route_to: Some(GeoCoord::new(-24.875672, -65.456650)),
                    route_period_secs: default_route_period(),
                },
                MarkerConfig {
                    lat: -24.875672,
                    lng: -65.456650,
                    shape: ShapeKind::Square,
                    size: 8.0,
                    color: [0.2, 0.75, 0.3, 1.0],
                    route_to: None,
                    route_period_secs: default_route_period(),
                },
                MarkerConfig {
                    lat: -24.873745,
                    lng: -65.457208,
                    shape: ShapeKind::Diamond,
                    size: 8.0,
                    color: [0.95, 0.8, 0.2, 1.0],
                    route_to: None,
                    route_period_secs: default_route_period(),
                },
            ],
        }
    }
}

impl ViewerConfig {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| MapError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| MapError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the loader or the GPS poller cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "Zoom {} is above the maximum of {}",
                self.zoom, MAX_ZOOM
            )));
        }
        if self.gps_poll_interval_secs == 0 {
            return Err(MapError::Config(
                "gps_poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MapError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| MapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, contents)
            .map_err(|e| MapError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `$HOME/.config/osm-viewer/config.json`
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| MapError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("osm-viewer").join("config.json"))
    }

    pub fn tile_timeout(&self) -> Duration {
        Duration::from_secs(self.tile_timeout_secs)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }

    pub fn gps_poll_interval(&self) -> Duration {
        Duration::from_secs(self.gps_poll_interval_secs)
    }

    pub fn gps_timeout(&self) -> Duration {
        Duration::from_secs(self.gps_timeout_secs)
    }

    /// Parse `LAT1,LNG1,LAT2,LNG2`
    pub fn update_bbox(&mut self, spec: &str) -> Result<()> {
        let values = spec
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MapError::Parse(format!("Invalid bounding box {:?}: {}", spec, e)))?;

        match values.as_slice() {
            [lat1, lng1, lat2, lng2] => {
                self.bbox = [GeoCoord::new(*lat1, *lng1), GeoCoord::new(*lat2, *lng2)];
                Ok(())
            }
            _ => Err(MapError::Parse(format!(
                "Bounding box needs 4 values (LAT1,LNG1,LAT2,LNG2), got {}",
                values.len()
            ))),
        }
    }
}
