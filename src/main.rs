// src/main.rs
//! OSM Viewer - OpenStreetMap tiles with a live GPS marker

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use osm_viewer::{
    config::ViewerConfig,
    display::{self, terminal::TerminalDisplay},
    gps::{GpsPoller, PollSettings},
    map::{HttpTileFetcher, TileCache, MAX_ZOOM},
    viewer::Viewer,
};
use std::{path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[command(name = "osm-viewer", version, about = "OpenStreetMap tile viewer with live GPS marker")]
struct Cli {
    /// Tile cache directory
    cache_dir: Option<PathBuf>,

    /// GPS device URL returning JSON fixes
    gps_url: Option<String>,

    /// Zoom level (0-19)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=MAX_ZOOM as i64))]
    zoom: Option<u8>,

    /// Area to load as LAT1,LNG1,LAT2,LNG2
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<String>,

    /// Write the composed tile mosaic to this PNG and exit
    #[arg(long)]
    export: Option<PathBuf>,

    /// Do not poll the GPS device
    #[arg(long)]
    no_gps: bool,

    /// Open the window display (requires the `gui` feature)
    #[arg(long)]
    gui: bool,

    /// Configuration file (default: ~/.config/osm-viewer/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load_from(path),
        None => ViewerConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(gps_url) = cli.gps_url {
        config.gps_url = Some(gps_url);
    }
    if let Some(zoom) = cli.zoom {
        config.zoom = zoom;
    }
    if let Some(bbox) = &cli.bbox {
        config.update_bbox(bbox)?;
    }
    config.validate()?;

    // Tiles load synchronously before anything else runs
    let fetcher = HttpTileFetcher::new(&config.user_agent, config.tile_timeout())?;
    let cache = TileCache::with_fetcher(&config.cache_dir, fetcher)
        .url_template(config.tile_url.clone())
        .download_delay(config.download_delay());
    let [corner_a, corner_b] = config.bbox;
    let tileset = cache.load_tiles(corner_a, corner_b, config.zoom);
    info!(
        "Loaded {}/{} tiles into {:?}",
        tileset.len(),
        tileset.requested(),
        cache.cache_dir()
    );

    if let Some(path) = &cli.export {
        tileset
            .compose()?
            .save(path)
            .with_context(|| format!("Failed to write mosaic to {:?}", path))?;
        info!("Mosaic written to {:?}", path);
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let mut viewer = Viewer::from_config(&config, tileset);

    match config.gps_url.as_deref() {
        Some(url) if !cli.no_gps => {
            let poller = GpsPoller::new();
            let settings = PollSettings {
                interval: config.gps_poll_interval(),
                request_timeout: config.gps_timeout(),
                user_agent: config.user_agent.clone(),
                ..PollSettings::new(url)
            };
            {
                let _guard = runtime.enter();
                poller.start(settings);
            }
            viewer = viewer.with_gps(poller);
        }
        _ => info!("GPS polling disabled"),
    }

    if cli.gui && display::should_use_gui() {
        run_gui(viewer)?;
    } else {
        if cli.gui {
            warn!("GUI not available, falling back to the terminal display");
        }
        let result = runtime.block_on(TerminalDisplay::new().run(&mut viewer));
        viewer.shutdown();
        result?;
    }

    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

#[cfg(all(unix, not(target_os = "macos"), feature = "gui"))]
fn run_gui(viewer: Viewer) -> anyhow::Result<()> {
    display::gui::run(viewer)?;
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"), feature = "gui")))]
fn run_gui(_viewer: Viewer) -> anyhow::Result<()> {
    anyhow::bail!("built without the gui feature")
}
