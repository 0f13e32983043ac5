// src/map/mod.rs
//! Tile projection, caching and mosaic assembly

pub mod tile;
mod tile_cache;
mod tileset;

pub use tile::{coord_to_tile, tile_to_coord, GeoCoord, TileIndex, TileRange, MAX_ZOOM, TILE_SIZE};
pub use tile_cache::{
    CacheStats, HttpTileFetcher, TileCache, TileFetcher, DEFAULT_TILE_URL, DEFAULT_USER_AGENT,
    MAX_TILES_PER_LOAD,
};
pub use tileset::{tile_offset, PixelPos, Tile, Tileset};
