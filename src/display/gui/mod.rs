// src/display/gui/mod.rs
//! Window display: tiles, markers and GPS status

mod app;
mod map_window;

pub use app::MapViewerApp;

use crate::{
    error::{MapError, Result},
    viewer::Viewer,
};

/// Open the window and block until it is closed
pub fn run(viewer: Viewer) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 1024.0])
            .with_title("OSM Viewer")
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "OSM Viewer",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(eframe::egui::Visuals::dark());
            Ok(Box::new(MapViewerApp::new(viewer)))
        }),
    )
    .map_err(MapError::from)
}
