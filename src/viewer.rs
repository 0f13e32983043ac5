// src/viewer.rs
//! Viewer context shared by the displays

use crate::{
    config::ViewerConfig,
    gps::{GpsData, GpsPoller},
    map::{PixelPos, Tileset},
    marker::{Marker, MarkerLayer},
};
use log::{debug, info};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// Owns everything the update and render steps touch. Built once at
/// startup and torn down with [`Viewer::shutdown`].
pub struct Viewer {
    tileset: Tileset,
    markers: MarkerLayer,
    gps_marker: Marker,
    gps: Option<GpsPoller>,
    gps_data: GpsData,
    running: Arc<AtomicBool>,
    elapsed: f64,
}

impl Viewer {
    pub fn new(tileset: Tileset, mut markers: MarkerLayer, mut gps_marker: Marker) -> Self {
        markers.place_all(&tileset);
        gps_marker.place(&tileset);
        gps_marker.hidden = true;

        Self {
            tileset,
            markers,
            gps_marker,
            gps: None,
            gps_data: GpsData::new(),
            running: Arc::new(AtomicBool::new(true)),
            elapsed: 0.0,
        }
    }

    /// Build markers from the configuration
    pub fn from_config(config: &ViewerConfig, tileset: Tileset) -> Self {
        let mut markers = MarkerLayer::new();
        for marker in &config.markers {
            markers.push(marker.to_marker());
        }
        let center = tileset.coord_from_pos(PixelPos::new(tileset.size().x * 0.5, tileset.size().y * 0.5));
        let gps_marker = Marker::gps(center, config.gps_point_radius, config.gps_presence_radius);
        Self::new(tileset, markers, gps_marker)
    }

    /// Attach a GPS poller whose updates move the GPS marker
    pub fn with_gps(mut self, poller: GpsPoller) -> Self {
        self.gps = Some(poller);
        self
    }

    /// One fixed simulation step
    pub fn update(&mut self, dt: f64) {
        self.elapsed += dt;

        if let Some(data) = self.gps.as_ref().and_then(|gps| gps.take_update()) {
            self.apply_gps(data);
        }

        self.markers.advance(dt, &self.tileset);
    }

    fn apply_gps(&mut self, data: GpsData) {
        match data.coord() {
            Some(coord) => {
                self.gps_marker.move_to(coord, &self.tileset);
                self.gps_marker.hidden = false;
                debug!("GPS marker at {:?}", self.gps_marker.pos);
            }
            None => self.gps_marker.hidden = true,
        }
        self.gps_data = data;
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn gps_marker(&self) -> &Marker {
        &self.gps_marker
    }

    pub fn gps_data(&self) -> &GpsData {
        &self.gps_data
    }

    pub fn has_gps(&self) -> bool {
        self.gps.is_some()
    }

    /// Seconds of simulated time
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Flag shared with the display loops and signal handlers
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Stop the loop and the GPS poller
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(gps) = self.gps.take() {
            gps.stop();
        }
        info!("Viewer shut down after {:.1}s", self.elapsed);
    }
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FixedTicker {
    step: Duration,
    accumulator: Duration,
    max_steps: u32,
}

impl FixedTicker {
    pub fn new(ticks_per_second: u32) -> Self {
        Self {
            step: Duration::from_secs(1) / ticks_per_second.max(1),
            accumulator: Duration::ZERO,
            max_steps: 8,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Feed wall-clock time and get the number of update steps to run.
    /// Backlog beyond `max_steps` is dropped.
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
            if steps == self.max_steps {
                self.accumulator = Duration::ZERO;
                break;
            }
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::GpsReading;
    use crate::map::{GeoCoord, TileIndex, TileRange};

    fn tileset() -> Tileset {
        Tileset::new(
            Vec::new(),
            TileRange {
                zoom: 17,
                min: TileIndex::new(41700, 74889),
                max: TileIndex::new(41704, 74893),
            },
        )
    }

    #[test]
    fn test_fixed_ticker() {
        let mut ticker = FixedTicker::new(60);
        assert_eq!(ticker.advance(Duration::from_millis(10)), 0);
        assert_eq!(ticker.advance(Duration::from_millis(10)), 1);
        assert_eq!(ticker.advance(Duration::from_millis(50)), 3);
        assert_eq!(ticker.advance(Duration::from_secs(10)), 8);
        assert_eq!(ticker.advance(Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_from_config_places_markers() {
        let config = ViewerConfig::default();
        let viewer = Viewer::from_config(&config, tileset());

        assert_eq!(viewer.markers().len(), 3);
        let first = viewer.markers().get(0).unwrap();
        assert_eq!(first.pos, viewer.tileset().pos_from_coord(first.coord));
        assert!(viewer.gps_marker().hidden);
        assert!(!viewer.has_gps());
    }

    #[test]
    fn test_update_moves_routed_markers() {
        let config = ViewerConfig::default();
        let mut viewer = Viewer::from_config(&config, tileset());
        let before = viewer.markers().get(0).unwrap().pos;
        let fixed_before = viewer.markers().get(1).unwrap().pos;

        viewer.update(5.0);

        assert_ne!(viewer.markers().get(0).unwrap().pos, before);
        assert_eq!(viewer.markers().get(1).unwrap().pos, fixed_before);
        assert_eq!(viewer.elapsed(), 5.0);
    }

    #[test]
    fn test_gps_update_shows_marker() {
        let poller = GpsPoller::new();
        let mut viewer = Viewer::from_config(&ViewerConfig::default(), tileset()).with_gps(poller.clone());

        let data = {
            let mut data = GpsData::new();
            data.apply(&GpsReading {
                available: 1,
                rssi: -60,
                time: 5,
                sat_count: 6,
                lat: -24.8740,
                lng: -65.4600,
            });
            data
        };
        viewer.apply_gps(data);
        assert!(!viewer.gps_marker().hidden);
        let expected = viewer
            .tileset()
            .pos_from_coord(GeoCoord::new(-24.8740_f32 as f64, -65.4600_f32 as f64));
        assert_eq!(viewer.gps_marker().pos, expected);

        let mut lost = viewer.gps_data().clone();
        lost.mark_unavailable("timeout");
        viewer.apply_gps(lost);
        assert!(viewer.gps_marker().hidden);
        assert_eq!(viewer.gps_data().sat_count, 6);

        viewer.shutdown();
        assert!(!poller.is_running());
    }
}
