// src/gps/data.rs
//! GPS fix as reported by the device and as published to the viewer

use crate::error::{MapError, Result};
use crate::map::GeoCoord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON payload served by the GPS device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsReading {
    pub available: i32,
    pub rssi: i32,
    pub time: u32,
    pub sat_count: u32,
    pub lat: f32,
    pub lng: f32,
}

/// Parse one device response body
pub fn parse_gps_payload(body: &str) -> Result<GpsReading> {
    serde_json::from_str(body).map_err(|e| MapError::Parse(format!("Failed to parse GPS JSON: {}", e)))
}

#[derive(Debug, Clone, Default)]
pub struct GpsData {
    pub available: bool,
    pub rssi: i32,
    pub time: u32,
    pub sat_count: u32,
    pub lat: f32,
    pub lng: f32,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl GpsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fix with a fresh reading
    pub fn apply(&mut self, reading: &GpsReading) {
        self.available = reading.available != 0;
        self.rssi = reading.rssi;
        self.time = reading.time;
        self.sat_count = reading.sat_count;
        self.lat = reading.lat;
        self.lng = reading.lng;
        self.last_update = Some(Utc::now());
        self.last_error = None;
    }

    /// Keep the last position but flag the data as stale
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.available = false;
        self.last_error = Some(reason.into());
    }

    /// Position, if the device reports a usable fix
    pub fn coord(&self) -> Option<GeoCoord> {
        self.available.then(|| GeoCoord::new(self.lat as f64, self.lng as f64))
    }

    /// Get the age of the GPS data in seconds
    pub fn age_seconds(&self) -> Option<i64> {
        self.last_update.map(|ts| Utc::now().signed_duration_since(ts).num_seconds())
    }

    /// Check if the GPS data is recent (within 10 seconds)
    pub fn is_recent(&self) -> bool {
        self.age_seconds().map_or(false, |age| age < 10)
    }

    /// Multi-line status text
    pub fn info(&self) -> String {
        let last_update = match self.last_update {
            Some(ts) => ts.format("%H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        };
        let mut info = format!(
            "conn: {}\npos: ({:.6}, {:.6})\nsat: {}\nrssi: {}\nlast update: {}",
            self.available, self.lat, self.lng, self.sat_count, self.rssi, last_update
        );
        if let Some(ref err) = self.last_error {
            info.push_str(&format!("\nerror: {}", err));
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_parsing() {
        let json = r#"{"available":1,"rssi":-71,"time":123456,"sat_count":7,"lat":-24.87291,"lng":-65.46102}"#;
        let reading = parse_gps_payload(json).unwrap();

        assert_eq!(reading.available, 1);
        assert_eq!(reading.rssi, -71);
        assert_eq!(reading.time, 123456);
        assert_eq!(reading.sat_count, 7);
        assert!((reading.lat - (-24.87291)).abs() < 1e-5);
        assert!((reading.lng - (-65.46102)).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_payload() {
        assert!(matches!(parse_gps_payload(r#"{"available": 1"#), Err(MapError::Parse(_))));
        assert!(parse_gps_payload(r#"{"available":1,"rssi":0}"#).is_err());
    }

    #[test]
    fn test_apply_and_mark_unavailable() {
        let mut data = GpsData::new();
        assert!(data.coord().is_none());
        assert!(!data.is_recent());

        let reading = GpsReading {
            available: 1,
            rssi: -60,
            time: 10,
            sat_count: 5,
            lat: -24.8729,
            lng: -65.4610,
        };
        data.apply(&reading);
        assert!(data.is_recent());
        let coord = data.coord().unwrap();
        assert!((coord.lat - (-24.8729)).abs() < 1e-4);

        data.mark_unavailable("connection refused");
        assert!(data.coord().is_none());
        assert_eq!(data.sat_count, 5);
        assert!(data.info().contains("error: connection refused"));
    }

    #[test]
    fn test_no_fix_reading() {
        let mut data = GpsData::new();
        let reading = parse_gps_payload(
            r#"{"available":0,"rssi":-90,"time":0,"sat_count":0,"lat":0.0,"lng":0.0}"#,
        )
        .unwrap();
        data.apply(&reading);
        assert!(data.coord().is_none());
        assert!(data.last_update.is_some());
        assert!(data.info().starts_with("conn: false"));
    }
}
