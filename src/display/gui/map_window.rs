// src/display/gui/map_window.rs
//! Tileset and marker rendering with pan and zoom

use crate::{
    map::{PixelPos, TileIndex, TILE_SIZE},
    marker::{
        Color, Marker, MarkerStyle, GPS_POINT_COLOR, GPS_POINT_OUTLINE, GPS_PRESENCE_COLOR,
        GPS_PRESENCE_OUTLINE,
    },
    viewer::Viewer,
};
use eframe::egui;
use std::collections::HashMap;

const MIN_SCALE: f32 = 0.25;
const MAX_SCALE: f32 = 4.0;

fn to_color32(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Maps world space (y up, origin at the north-west corner) to screen space
#[derive(Debug, Clone, Copy)]
struct View {
    origin: egui::Pos2,
    world_center: PixelPos,
    scale: f32,
}

impl View {
    fn to_screen(&self, p: PixelPos) -> egui::Pos2 {
        egui::pos2(
            self.origin.x + (p.x - self.world_center.x) * self.scale,
            self.origin.y - (p.y - self.world_center.y) * self.scale,
        )
    }

    fn to_world(&self, p: egui::Pos2) -> PixelPos {
        PixelPos::new(
            (p.x - self.origin.x) / self.scale + self.world_center.x,
            -(p.y - self.origin.y) / self.scale + self.world_center.y,
        )
    }
}

pub struct MapWindow {
    textures: HashMap<TileIndex, egui::TextureHandle>,
    pan: egui::Vec2,
    scale: f32,
    selected: Option<usize>,
}

impl MapWindow {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            pan: egui::Vec2::ZERO,
            scale: 1.0,
            selected: None,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, viewer: &Viewer) {
        ui.horizontal(|ui| {
            ui.label(format!("Scale: {:.2}x", self.scale));
            if ui.button("Reset view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.scale = 1.0;
            }
            if let Some(marker) = self.selected.and_then(|i| viewer.markers().get(i)) {
                ui.separator();
                ui.label(format!("Selected: {:.6}, {:.6}", marker.coord.lat, marker.coord.lng));
            }
        });
        ui.separator();

        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, egui::Sense::click_and_drag());

        if response.dragged() {
            self.pan += response.drag_delta();
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.scale = (self.scale * (scroll * 0.002).exp()).clamp(MIN_SCALE, MAX_SCALE);
            }
        }

        let size = viewer.tileset().size();
        let view = View {
            origin: response.rect.center() + self.pan,
            world_center: PixelPos::new(size.x * 0.5, size.y * 0.5),
            scale: self.scale,
        };

        painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(76));
        self.render_tiles(ui.ctx(), &painter, viewer, &view);

        for marker in viewer.markers().iter().filter(|m| !m.hidden) {
            self.render_marker(&painter, marker, &view);
        }
        if !viewer.gps_marker().hidden {
            self.render_marker(&painter, viewer.gps_marker(), &view);
        }

        if let Some(pointer) = response.hover_pos() {
            let world = view.to_world(pointer);
            let coord = viewer.tileset().coord_from_pos(world);
            painter.text(
                pointer + egui::vec2(12.0, -12.0),
                egui::Align2::LEFT_BOTTOM,
                format!("{:.6}, {:.6}", coord.lat, coord.lng),
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
            if response.clicked() {
                self.selected = viewer.markers().hit_test_at_scale(world, view.scale);
            }
        }
    }

    fn render_tiles(&mut self, ctx: &egui::Context, painter: &egui::Painter, viewer: &Viewer, view: &View) {
        let side = TILE_SIZE as f32 * view.scale;
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        for tile in viewer.tileset().tiles() {
            let texture = self.textures.entry(tile.index).or_insert_with(|| {
                let size = [tile.image.width() as usize, tile.image.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, tile.image.as_raw());
                ctx.load_texture(
                    format!("tile_{}_{}_{}", viewer.tileset().zoom(), tile.index.x, tile.index.y),
                    color_image,
                    egui::TextureOptions::LINEAR,
                )
            });

            let rect = egui::Rect::from_center_size(view.to_screen(tile.pos), egui::vec2(side, side));
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }
    }

    fn render_marker(&self, painter: &egui::Painter, marker: &Marker, view: &View) {
        let center = view.to_screen(marker.pos);
        match &marker.style {
            MarkerStyle::Gps { point_radius, presence_radius } => {
                let presence = presence_radius * view.scale;
                painter.circle_filled(center, presence, to_color32(GPS_PRESENCE_COLOR));
                painter.circle_stroke(center, presence, egui::Stroke::new(1.0, to_color32(GPS_PRESENCE_OUTLINE)));
                // Marker sizes stay constant on screen
                painter.circle_filled(center, *point_radius, to_color32(GPS_POINT_COLOR));
                painter.circle_stroke(center, *point_radius, egui::Stroke::new(1.5, to_color32(GPS_POINT_OUTLINE)));
            }
            MarkerStyle::Shape { fill, outline, outline_width, .. } => {
                // Outline is in world units around `pos`; keep the on-screen size fixed
                let points: Vec<egui::Pos2> = marker
                    .outline()
                    .into_iter()
                    .map(|v| center + egui::vec2(v.x - marker.pos.x, -(v.y - marker.pos.y)))
                    .collect();
                painter.add(egui::Shape::convex_polygon(
                    points,
                    to_color32(*fill),
                    egui::Stroke::new(*outline_width, to_color32(*outline)),
                ));
            }
        }
    }
}

impl Default for MapWindow {
    fn default() -> Self {
        Self::new()
    }
}
