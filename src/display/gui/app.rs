// src/display/gui/app.rs
//! Main GUI application structure and eframe::App implementation

use super::map_window::MapWindow;
use crate::viewer::{FixedTicker, Viewer};
use eframe::egui;
use std::time::{Duration, Instant};

pub struct MapViewerApp {
    viewer: Option<Viewer>,
    map: MapWindow,
    ticker: FixedTicker,
    last_frame: Instant,
}

impl MapViewerApp {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer: Some(viewer),
            map: MapWindow::new(),
            ticker: FixedTicker::new(60),
            last_frame: Instant::now(),
        }
    }

    fn shutdown(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            viewer.shutdown();
        }
    }
}

impl eframe::App for MapViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(Duration::from_millis(33));

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        let now = Instant::now();
        let step = self.ticker.step().as_secs_f64();
        for _ in 0..self.ticker.advance(now - self.last_frame) {
            viewer.update(step);
        }
        self.last_frame = now;

        let mut close = !viewer.is_running();

        // Top menu bar
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("🗺 OSM Viewer");
                ui.separator();

                let tileset = viewer.tileset();
                ui.label(format!(
                    "Zoom {} | {}/{} tiles",
                    tileset.zoom(),
                    tileset.len(),
                    tileset.requested()
                ));

                if viewer.has_gps() {
                    ui.separator();
                    let data = viewer.gps_data();
                    let status_color = if data.available && data.is_recent() {
                        egui::Color32::GREEN
                    } else {
                        egui::Color32::RED
                    };
                    ui.colored_label(status_color, "●");
                    ui.label(format!("GPS: {} sats", data.sat_count));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("❌ Exit").clicked() {
                        close = true;
                    }
                });
            });
        });

        if viewer.has_gps() {
            egui::SidePanel::right("gps_panel").default_width(200.0).show(ctx, |ui| {
                ui.strong("📍 GPS");
                ui.separator();
                ui.monospace(viewer.gps_data().info());
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.map.show(ui, viewer);
        });

        if close {
            self.shutdown();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}
