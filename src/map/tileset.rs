// src/map/tileset.rs
//! Assembled tile mosaic and its local pixel space
//!
//! World space has its origin at the north-west corner of the min tile,
//! x growing east and y growing north, so everything south of the origin
//! has a negative y.

use super::tile::{GeoCoord, TileIndex, TileRange, TILE_SIZE};
use crate::error::{MapError, Result};
use image::RgbaImage;

/// Position in the tileset's world space, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPos {
    pub x: f32,
    pub y: f32,
}

impl PixelPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PixelPos) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Center of `tile` relative to the north-west corner of `min`
pub fn tile_offset(tile: TileIndex, min: TileIndex) -> PixelPos {
    let size = TILE_SIZE as f32;
    PixelPos {
        x: ((tile.x as i64 - min.x as i64) as f32 + 0.5) * size,
        y: ((tile.y as i64 - min.y as i64) as f32 + 0.5) * -size,
    }
}

/// A decoded tile image placed in world space
#[derive(Debug, Clone)]
pub struct Tile {
    pub index: TileIndex,
    pub image: RgbaImage,
    pub pos: PixelPos,
}

#[derive(Debug, Clone)]
pub struct Tileset {
    tiles: Vec<Tile>,
    range: TileRange,
    min_coord: GeoCoord,
    max_coord: GeoCoord,
    size: PixelPos,
}

impl Tileset {
    /// Build a tileset over `range`. Bounds are taken from the tile corners,
    /// not from whatever box the range was computed from.
    pub fn new(tiles: Vec<Tile>, range: TileRange) -> Self {
        let size = TILE_SIZE as f32;
        Self {
            tiles,
            range,
            min_coord: range.north_west(),
            max_coord: range.south_east(),
            size: PixelPos::new(range.width() as f32 * size, range.height() as f32 * -size),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn range(&self) -> TileRange {
        self.range
    }

    pub fn zoom(&self) -> u8 {
        self.range.zoom
    }

    /// North-west corner of the mosaic
    pub fn min_coord(&self) -> GeoCoord {
        self.min_coord
    }

    /// South-east corner of the mosaic
    pub fn max_coord(&self) -> GeoCoord {
        self.max_coord
    }

    /// Pixel size of the mosaic; `y` is negative
    pub fn size(&self) -> PixelPos {
        self.size
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles the range asked for
    pub fn requested(&self) -> u64 {
        self.range.count()
    }

    pub fn is_complete(&self) -> bool {
        self.tiles.len() as u64 == self.range.count()
    }

    pub fn pos_from_coord(&self, coord: GeoCoord) -> PixelPos {
        // lat maps to y and lng to x
        let fac_x = self.size.x as f64 / (self.max_coord.lng - self.min_coord.lng);
        let fac_y = self.size.y as f64 / (self.max_coord.lat - self.min_coord.lat);
        PixelPos {
            x: (fac_x * (coord.lng - self.min_coord.lng)) as f32,
            y: (fac_y * (coord.lat - self.min_coord.lat)) as f32,
        }
    }

    pub fn coord_from_pos(&self, pos: PixelPos) -> GeoCoord {
        let fac_lat = (self.max_coord.lat - self.min_coord.lat) / self.size.y as f64;
        let fac_lng = (self.max_coord.lng - self.min_coord.lng) / self.size.x as f64;
        GeoCoord {
            lat: pos.y as f64 * fac_lat + self.min_coord.lat,
            lng: pos.x as f64 * fac_lng + self.min_coord.lng,
        }
    }

    /// Blit every tile into one image in screen orientation (y down).
    /// Missing tiles are left transparent. Fails when either side of the
    /// mosaic would not fit in a `u32` pixel count.
    pub fn compose(&self) -> Result<RgbaImage> {
        let side = |tiles: u64| {
            tiles
                .checked_mul(TILE_SIZE as u64)
                .and_then(|px| u32::try_from(px).ok())
        };
        let (width, height) = match (side(self.range.width()), side(self.range.height())) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(MapError::Other(format!(
                    "Mosaic of {}x{} tiles is too large to compose",
                    self.range.width(),
                    self.range.height()
                )))
            }
        };

        let mut mosaic = RgbaImage::new(width, height);
        for tile in &self.tiles {
            let x = (tile.index.x as i64 - self.range.min.x as i64) * TILE_SIZE as i64;
            let y = (tile.index.y as i64 - self.range.min.y as i64) * TILE_SIZE as i64;
            image::imageops::overlay(&mut mosaic, &tile.image, x, y);
        }
        Ok(mosaic)
    }
}
