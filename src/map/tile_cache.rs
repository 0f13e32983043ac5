// src/map/tile_cache.rs
//! OpenStreetMap tile downloading and on-disk caching

use super::tile::{GeoCoord, TileIndex, TileRange, MAX_ZOOM};
use super::tileset::{tile_offset, Tile, Tileset};
use crate::error::{MapError, Result};
use image::RgbaImage;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Largest number of tiles a single `load_tiles` call will fetch
pub const MAX_TILES_PER_LOAD: u64 = 4096;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:47.0) Gecko/20100101 Firefox/47.0";

/// Source of raw tile bytes
pub trait TileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher
pub struct HttpTileFetcher {
    client: reqwest::blocking::Client,
}

impl HttpTileFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| MapError::Network(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| MapError::Network(format!("Download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MapError::Network(format!("HTTP error: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| MapError::Network(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

pub struct TileCache<F = HttpTileFetcher> {
    cache_dir: PathBuf,
    url_template: String,
    fetcher: F,
    download_delay: Duration,
}

impl TileCache<HttpTileFetcher> {
    /// Cache backed by the OSM tile server
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let fetcher = HttpTileFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(10))?;
        Ok(Self::with_fetcher(cache_dir, fetcher))
    }
}

impl<F: TileFetcher> TileCache<F> {
    pub fn with_fetcher(cache_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            url_template: DEFAULT_TILE_URL.to_string(),
            fetcher,
            // Respect OSM tile usage policy
            download_delay: Duration::from_millis(100),
        }
    }

    /// Template with `{z}`, `{x}` and `{y}` placeholders
    pub fn url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    /// Pause after every successful download
    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn tile_path(&self, zoom: u8, tile: TileIndex) -> PathBuf {
        Self::cache_file(&self.cache_dir, zoom, tile)
    }

    fn cache_file(cache_dir: &Path, zoom: u8, tile: TileIndex) -> PathBuf {
        cache_dir.join(format!("osm-{}_{}_{}.png", zoom, tile.x, tile.y))
    }

    pub fn tile_url(&self, zoom: u8, tile: TileIndex) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    /// Create the cache directory if needed. Failure is logged, not fatal.
    pub fn ensure_cache_dir(&self) {
        if self.cache_dir.is_dir() {
            return;
        }
        info!("Creating tile cache directory {:?}", self.cache_dir);
        if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
            warn!("Failed to create cache directory {:?}: {}", self.cache_dir, e);
        }
    }

    /// Path of the cached tile, downloading it first if absent
    pub fn fetch_tile(&self, zoom: u8, tile: TileIndex) -> Result<PathBuf> {
        let path = self.tile_path(zoom, tile);
        let cached = path.exists();
        debug!(
            " - ({}, {}) -> {:?} [{}]",
            tile.x,
            tile.y,
            path,
            if cached { "IN CACHE" } else { "NOT IN CACHE" }
        );
        if cached {
            return Ok(path);
        }

        let url = self.tile_url(zoom, tile);
        let bytes = self.fetcher.fetch(&url)?;
        std::fs::write(&path, &bytes)
            .map_err(|e| MapError::CacheIo(format!("Failed to write {:?}: {}", path, e)))?;

        if !self.download_delay.is_zero() {
            std::thread::sleep(self.download_delay);
        }
        Ok(path)
    }

    /// Decode one tile, fetching it if needed. A cached file that fails to
    /// decode is removed so the next load downloads it again.
    pub fn load_tile(&self, zoom: u8, tile: TileIndex) -> Result<RgbaImage> {
        let path = self.fetch_tile(zoom, tile)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| MapError::CacheIo(format!("Failed to read cached tile {:?}: {}", path, e)))?;

        match image::load_from_memory(&bytes) {
            Ok(image) => Ok(image.to_rgba8()),
            Err(e) => {
                if let Err(rm) = std::fs::remove_file(&path) {
                    warn!("Failed to remove corrupt tile {:?}: {}", path, rm);
                }
                Err(MapError::Decode(format!("{:?}: {}", path, e)))
            }
        }
    }

    /// Load every tile covering the box between two corners. Tiles that fail
    /// to download or decode are logged and left out of the result. A zoom
    /// above [`MAX_ZOOM`] or a range over [`MAX_TILES_PER_LOAD`] tiles is
    /// logged and yields an empty tileset.
    pub fn load_tiles(&self, min_coord: GeoCoord, max_coord: GeoCoord, zoom: u8) -> Tileset {
        let range = TileRange::covering(min_coord, max_coord, zoom);
        debug!(
            "min: ({} {}), max: ({} {})",
            range.min.x, range.min.y, range.max.x, range.max.y
        );

        if zoom > MAX_ZOOM {
            error!("Zoom {} is above the maximum of {}, no tiles loaded", zoom, MAX_ZOOM);
            return Tileset::new(Vec::new(), range);
        }
        if range.count() > MAX_TILES_PER_LOAD {
            error!(
                "Area needs {} tiles, more than the limit of {}, no tiles loaded",
                range.count(),
                MAX_TILES_PER_LOAD
            );
            return Tileset::new(Vec::new(), range);
        }
        info!("Fetching {} tiles", range.count());

        self.ensure_cache_dir();

        let mut tiles = Vec::new();
        for index in range.iter() {
            match self.load_tile(zoom, index) {
                Ok(image) => tiles.push(Tile {
                    index,
                    image,
                    pos: tile_offset(index, range.min),
                }),
                Err(e) => error!("Skipping tile {}/{}/{}: {}", zoom, index.x, index.y, e),
            }
        }

        let tileset = Tileset::new(tiles, range);
        if !tileset.is_complete() {
            warn!("Loaded {} of {} tiles", tileset.len(), tileset.requested());
        }
        tileset
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut disk_tiles = 0;
        let mut disk_size = 0u64;

        if let Ok(entries) = std::fs::read_dir(&self.cache_dir) {
            for entry in entries.flatten() {
                if !is_tile_file(&entry.path()) {
                    continue;
                }
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        disk_tiles += 1;
                        disk_size += metadata.len();
                    }
                }
            }
        }

        CacheStats {
            disk_tiles,
            disk_size_mb: disk_size as f64 / 1_048_576.0,
        }
    }

    /// Remove every cached tile. Other files in the directory are left alone.
    pub fn clear_disk_cache(&self) -> Result<()> {
        let entries = std::fs::read_dir(&self.cache_dir)
            .map_err(|e| MapError::CacheIo(format!("Failed to read cache directory: {}", e)))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if is_tile_file(&path) {
                std::fs::remove_file(&path)
                    .map_err(|e| MapError::CacheIo(format!("Failed to remove {:?}: {}", path, e)))?;
            }
        }
        Ok(())
    }
}

fn is_tile_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with("osm-") && name.ends_with(".png"))
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub disk_tiles: usize,
    pub disk_size_mb: f64,
}
