// src/map/tile.rs
//! Slippy-map tile indices and Web Mercator coordinate conversion
//!
//! See <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Size in pixels of one OSM tile
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level served by tile.openstreetmap.org
pub const MAX_ZOOM: u8 = 19;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoord {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`
    pub fn lerp(&self, other: &GeoCoord, t: f64) -> GeoCoord {
        GeoCoord {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

/// Tile index at some zoom level. Signed so that out-of-range input does not wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileIndex {
    pub x: i32,
    pub y: i32,
}

impl TileIndex {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

fn tiles_per_axis(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32)
}

/// Calculate the tile containing `coord` at `zoom`. No clamping is applied.
pub fn coord_to_tile(coord: GeoCoord, zoom: u8) -> TileIndex {
    let n = tiles_per_axis(zoom);
    let lat_rad = coord.lat.to_radians();
    let x = (n * (coord.lng + 180.0) / 360.0).floor() as i32;
    let y = (n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0).floor() as i32;
    TileIndex { x, y }
}

/// Calculate the north-west corner of a tile
pub fn tile_to_coord(tile: TileIndex, zoom: u8) -> GeoCoord {
    let n = tiles_per_axis(zoom);
    let lng = tile.x as f64 / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * tile.y as f64 / n)).sinh().atan().to_degrees();
    GeoCoord { lat, lng }
}

/// Inclusive rectangle of tiles at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min: TileIndex,
    pub max: TileIndex,
}

impl TileRange {
    /// Range covering the box spanned by two corners, given in any order
    pub fn covering(a: GeoCoord, b: GeoCoord, zoom: u8) -> Self {
        let ta = coord_to_tile(a, zoom);
        let tb = coord_to_tile(b, zoom);
        Self {
            zoom,
            min: TileIndex::new(ta.x.min(tb.x), ta.y.min(tb.y)),
            max: TileIndex::new(ta.x.max(tb.x), ta.y.max(tb.y)),
        }
    }

    pub fn width(&self) -> u64 {
        (self.max.x as i64 - self.min.x as i64 + 1) as u64
    }

    pub fn height(&self) -> u64 {
        (self.max.y as i64 - self.min.y as i64 + 1) as u64
    }

    /// Saturates at `u64::MAX` for ranges spanning the whole `i32` plane
    pub fn count(&self) -> u64 {
        self.width().saturating_mul(self.height())
    }

    pub fn contains(&self, tile: TileIndex) -> bool {
        (self.min.x..=self.max.x).contains(&tile.x) && (self.min.y..=self.max.y).contains(&tile.y)
    }

    /// Tiles in column-major order (x outer, y inner)
    pub fn iter(&self) -> impl Iterator<Item = TileIndex> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| TileIndex::new(x, y)))
    }

    /// North-west corner of the min tile
    pub fn north_west(&self) -> GeoCoord {
        tile_to_coord(self.min, self.zoom)
    }

    /// South-east corner of the max tile
    pub fn south_east(&self) -> GeoCoord {
        tile_to_coord(
            TileIndex::new(self.max.x.saturating_add(1), self.max.y.saturating_add(1)),
            self.zoom,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tiles() {
        assert_eq!(coord_to_tile(GeoCoord::new(51.5074, -0.1278), 10), TileIndex::new(511, 340));
        assert_eq!(coord_to_tile(GeoCoord::new(42.438878, -71.119277), 12), TileIndex::new(1238, 1513));
        assert_eq!(coord_to_tile(GeoCoord::new(0.0, 0.0), 0), TileIndex::new(0, 0));
    }

    #[test]
    fn test_tile_to_coord_corners() {
        let nw = tile_to_coord(TileIndex::new(0, 0), 0);
        assert!((nw.lng - (-180.0)).abs() < 1e-9);
        assert!((nw.lat - 85.0511287798).abs() < 1e-6);

        let center = tile_to_coord(TileIndex::new(1, 1), 1);
        assert!(center.lng.abs() < 1e-9);
        assert!(center.lat.abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_one_tile() {
        let samples = [
            GeoCoord::new(-24.87034, -65.46616),
            GeoCoord::new(84.9, 179.9),
            GeoCoord::new(-84.9, -179.9),
            GeoCoord::new(42.438878, -71.119277),
            GeoCoord::new(0.001, 0.001),
        ];
        for zoom in [0u8, 3, 10, 17, 19] {
            for coord in samples {
                let tile = coord_to_tile(coord, zoom);
                let nw = tile_to_coord(tile, zoom);
                let se = tile_to_coord(TileIndex::new(tile.x + 1, tile.y + 1), zoom);
                let lng_step = se.lng - nw.lng;
                let lat_step = nw.lat - se.lat;
                assert!((coord.lng - nw.lng).abs() <= lng_step, "lng {:?} z{}", coord, zoom);
                assert!((coord.lat - nw.lat).abs() <= lat_step, "lat {:?} z{}", coord, zoom);
            }
        }
    }

    #[test]
    fn test_monotonic_in_longitude() {
        for zoom in [1u8, 8, 17] {
            let mut last = i32::MIN;
            let mut lng = -180.0;
            while lng < 180.0 {
                let tile = coord_to_tile(GeoCoord::new(-24.87, lng), zoom);
                assert!(tile.x >= last);
                last = tile.x;
                lng += 0.37;
            }
        }
    }

    #[test]
    fn test_reference_box_range() {
        let top_left = GeoCoord::new(-24.87034, -65.46616);
        let bottom_right = GeoCoord::new(-24.87910, -65.45532);
        let range = TileRange::covering(top_left, bottom_right, 17);

        assert_eq!(range.min, TileIndex::new(41700, 74889));
        assert_eq!(range.max, TileIndex::new(41704, 74893));
        let dx = (range.max.x - range.min.x) as u64;
        let dy = (range.max.y - range.min.y) as u64;
        assert_eq!(range.count(), (1 + dx) * (1 + dy));
        assert_eq!(range.iter().count(), 25);
    }

    #[test]
    fn test_covering_ignores_corner_order() {
        let a = GeoCoord::new(-24.87034, -65.45532);
        let b = GeoCoord::new(-24.87910, -65.46616);
        assert_eq!(TileRange::covering(a, b, 17), TileRange::covering(b, a, 17));
        assert_eq!(TileRange::covering(a, b, 17).count(), 25);
    }

    #[test]
    fn test_iter_is_column_major() {
        let range = TileRange {
            zoom: 5,
            min: TileIndex::new(3, 7),
            max: TileIndex::new(4, 8),
        };
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(
            tiles,
            vec![
                TileIndex::new(3, 7),
                TileIndex::new(3, 8),
                TileIndex::new(4, 7),
                TileIndex::new(4, 8),
            ]
        );
        assert!(range.contains(TileIndex::new(4, 7)));
        assert!(!range.contains(TileIndex::new(5, 7)));
    }

    #[test]
    fn test_lerp() {
        let a = GeoCoord::new(-24.872878, -65.462669);
        let b = GeoCoord::new(-24.875672, -65.456650);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.lat - (-24.874275)).abs() < 1e-9);
    }

    #[test]
    fn test_saturated_range_does_not_overflow() {
        // Beyond zoom 31 the x index saturates at i32::MAX
        let range = TileRange::covering(GeoCoord::new(10.0, -180.0), GeoCoord::new(-10.0, 179.0), 32);
        assert_eq!(range.max.x, i32::MAX);
        assert!(range.width() > u32::MAX as u64 / 2);
        assert!(range.count() >= range.width());

        let whole = TileRange {
            zoom: 32,
            min: TileIndex::new(i32::MIN, i32::MIN),
            max: TileIndex::new(i32::MAX, i32::MAX),
        };
        assert_eq!(whole.width(), 1 << 32);
        assert_eq!(whole.count(), u64::MAX);
        let _ = whole.south_east();
    }
}
