// src/marker.rs
//! Map overlay markers
//!
//! Markers are placed by geographic coordinate and positioned in the
//! tileset's world space. Shapes are measured with signed distances
//! (negative inside) which the displays use for drawing and hit-testing.

use crate::map::{GeoCoord, PixelPos, Tileset};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// RGBA, components in `0.0..=1.0`
pub type Color = [f32; 4];

pub const GPS_POINT_COLOR: Color = [0.164, 0.715, 0.965, 1.0];
pub const GPS_POINT_OUTLINE: Color = [0.1, 0.1, 0.1, 1.0];
pub const GPS_PRESENCE_COLOR: Color = [0.703, 0.898, 0.988, 0.3];
pub const GPS_PRESENCE_OUTLINE: Color = [0.4, 0.4, 0.4, 0.5];

const CIRCLE_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Triangle,
    Square,
    Diamond,
    Pentagon,
}

impl ShapeKind {
    /// Polygon side count, 0 for a circle
    pub fn sides(&self) -> u32 {
        match self {
            ShapeKind::Circle => 0,
            ShapeKind::Triangle => 3,
            ShapeKind::Square | ShapeKind::Diamond => 4,
            ShapeKind::Pentagon => 5,
        }
    }

    /// Base rotation in radians
    pub fn rotation(&self) -> f32 {
        match self {
            ShapeKind::Circle | ShapeKind::Square => 0.0,
            ShapeKind::Triangle | ShapeKind::Pentagon => PI,
            ShapeKind::Diamond => FRAC_PI_4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerStyle {
    /// Position dot with a translucent presence halo
    Gps { point_radius: f32, presence_radius: f32 },
    /// Filled regular polygon or circle; `radius` is the apothem
    Shape {
        kind: ShapeKind,
        radius: f32,
        rotation: f32,
        fill: Color,
        outline: Color,
        outline_width: f32,
    },
}

/// Ping-pong movement between two coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub from: GeoCoord,
    pub to: GeoCoord,
    /// Seconds for one leg
    pub period: f64,
    elapsed: f64,
}

impl Route {
    pub fn new(from: GeoCoord, to: GeoCoord, period: f64) -> Self {
        Self { from, to, period, elapsed: 0.0 }
    }

    /// Advance by `dt` seconds and return the new coordinate
    pub fn advance(&mut self, dt: f64) -> GeoCoord {
        if self.period <= 0.0 {
            return self.to;
        }
        self.elapsed = (self.elapsed + dt) % (2.0 * self.period);
        let t = self.elapsed / self.period;
        let t = if t > 1.0 { 2.0 - t } else { t };
        self.from.lerp(&self.to, t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coord: GeoCoord,
    pub pos: PixelPos,
    pub style: MarkerStyle,
    pub hidden: bool,
    pub route: Option<Route>,
}

impl Marker {
    fn with_style(coord: GeoCoord, style: MarkerStyle) -> Self {
        Self {
            coord,
            pos: PixelPos::default(),
            style,
            hidden: false,
            route: None,
        }
    }

    pub fn gps(coord: GeoCoord, point_radius: f32, presence_radius: f32) -> Self {
        Self::with_style(coord, MarkerStyle::Gps { point_radius, presence_radius })
    }

    pub fn shape(coord: GeoCoord, kind: ShapeKind, radius: f32, fill: Color) -> Self {
        Self::with_style(
            coord,
            MarkerStyle::Shape {
                kind,
                radius,
                rotation: kind.rotation(),
                fill,
                outline: [0.0, 0.0, 0.0, 1.0],
                outline_width: 0.0,
            },
        )
    }

    pub fn with_outline(mut self, color: Color, width: f32) -> Self {
        if let MarkerStyle::Shape { outline, outline_width, .. } = &mut self.style {
            *outline = color;
            *outline_width = width;
        }
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.coord = route.from;
        self.route = Some(route);
        self
    }

    /// Recompute the world position from the coordinate
    pub fn place(&mut self, tileset: &Tileset) {
        self.pos = tileset.pos_from_coord(self.coord);
    }

    pub fn move_to(&mut self, coord: GeoCoord, tileset: &Tileset) {
        self.coord = coord;
        self.place(tileset);
    }

    /// Follow the route, if any
    pub fn advance(&mut self, dt: f64, tileset: &Tileset) {
        if let Some(route) = self.route.as_mut() {
            let coord = route.advance(dt);
            self.move_to(coord, tileset);
        }
    }

    /// Signed distance from `p` to the marker edge
    pub fn distance(&self, p: PixelPos) -> f32 {
        let local = PixelPos::new(p.x - self.pos.x, p.y - self.pos.y);
        match &self.style {
            MarkerStyle::Gps { point_radius, .. } => circle_distance(local, *point_radius),
            MarkerStyle::Shape { kind, radius, rotation, .. } => match kind.sides() {
                0 => circle_distance(local, *radius),
                sides => polygon_distance(local, *radius, sides as f32, *rotation),
            },
        }
    }

    pub fn contains(&self, p: PixelPos) -> bool {
        !self.hidden && self.distance(p) <= 0.0
    }

    /// Like [`Marker::contains`] for a marker drawn at a fixed screen size
    /// while the map is magnified by `scale`
    pub fn contains_at_scale(&self, p: PixelPos, scale: f32) -> bool {
        let on_screen = PixelPos::new(
            self.pos.x + (p.x - self.pos.x) * scale,
            self.pos.y + (p.y - self.pos.y) * scale,
        );
        self.contains(on_screen)
    }

    /// Vertices of the marker edge in world space
    pub fn outline(&self) -> Vec<PixelPos> {
        let (radius, sides, rotation) = match &self.style {
            MarkerStyle::Gps { point_radius, .. } => (*point_radius, 0, 0.0),
            MarkerStyle::Shape { kind, radius, rotation, .. } => (*radius, kind.sides(), *rotation),
        };

        let local: Vec<PixelPos> = if sides == 0 {
            (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
                    PixelPos::new(radius * angle.cos(), radius * angle.sin())
                })
                .collect()
        } else {
            let split = TAU / sides as f32;
            let circumradius = radius / (split * 0.5).cos();
            (0..sides)
                .map(|k| {
                    let angle = k as f32 * split + split * 0.5 - FRAC_PI_2;
                    rotate(PixelPos::new(circumradius * angle.cos(), circumradius * angle.sin()), rotation)
                })
                .collect()
        };

        local
            .into_iter()
            .map(|v| PixelPos::new(v.x + self.pos.x, v.y + self.pos.y))
            .collect()
    }
}

fn rotate(p: PixelPos, angle: f32) -> PixelPos {
    let (sin, cos) = angle.sin_cos();
    PixelPos::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}

fn circle_distance(p: PixelPos, radius: f32) -> f32 {
    (p.x * p.x + p.y * p.y).sqrt() - radius
}

fn polygon_distance(p: PixelPos, radius: f32, sides: f32, rotation: f32) -> f32 {
    let p = rotate(p, -rotation);
    let angle = p.y.atan2(p.x) + FRAC_PI_2;
    let split = TAU / sides;
    let len = (p.x * p.x + p.y * p.y).sqrt();
    len * (split * (0.5 + angle / split).floor() - angle).cos() - radius
}

/// Ordered marker collection; later markers draw on top
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker and return its index
    pub fn push(&mut self, marker: Marker) -> usize {
        self.markers.push(marker);
        self.markers.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Marker> {
        self.markers.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn place_all(&mut self, tileset: &Tileset) {
        for marker in &mut self.markers {
            marker.place(tileset);
        }
    }

    pub fn advance(&mut self, dt: f64, tileset: &Tileset) {
        for marker in &mut self.markers {
            marker.advance(dt, tileset);
        }
    }

    /// Topmost visible marker containing `p`
    pub fn hit_test(&self, p: PixelPos) -> Option<usize> {
        self.hit_test_at_scale(p, 1.0)
    }

    /// Topmost marker under `p` when markers keep their size on screen
    pub fn hit_test_at_scale(&self, p: PixelPos, scale: f32) -> Option<usize> {
        self.markers.iter().rposition(|m| m.contains_at_scale(p, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{TileIndex, TileRange};

    const RED: Color = [1.0, 0.0, 0.0, 1.0];

    fn at_origin(kind: ShapeKind, radius: f32) -> Marker {
        Marker::shape(GeoCoord::default(), kind, radius, RED)
    }

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
    fn test_shape_kinds() {
        assert_eq!(ShapeKind::Circle.sides(), 0);
        assert_eq!(ShapeKind::Triangle.sides(), 3);
        assert_eq!(ShapeKind::Diamond.sides(), 4);
        assert_eq!(ShapeKind::Diamond.rotation(), FRAC_PI_4);
        assert_eq!(ShapeKind::Pentagon.rotation(), PI);
    }

    #[test]
    fn test_square_distance() {
        let square = at_origin(ShapeKind::Square, 10.0);
        assert!((square.distance(PixelPos::new(5.0, 0.0)) + 5.0).abs() < 1e-4);
        assert!((square.distance(PixelPos::new(0.0, 20.0)) - 10.0).abs() < 1e-4);
        assert!(square.distance(PixelPos::new(10.0, 10.0)).abs() < 1e-3);
        assert!(square.contains(PixelPos::new(9.0, 9.0)));
        assert!(!square.contains(PixelPos::new(11.0, 0.0)));
    }

    #[test]
    fn test_diamond_is_rotated_square() {
        let diamond = at_origin(ShapeKind::Diamond, 10.0);
        // Corner of the unrotated square now lies outside
        assert!(!diamond.contains(PixelPos::new(9.5, 9.5)));
        assert!(diamond.contains(PixelPos::new(13.0, 0.0)));
    }

    #[test]
    fn test_outline_vertices_lie_on_edge() {
        for kind in [ShapeKind::Triangle, ShapeKind::Square, ShapeKind::Diamond, ShapeKind::Pentagon] {
            let marker = at_origin(kind, 12.0);
            let vertices = marker.outline();
            assert_eq!(vertices.len(), kind.sides() as usize);
            for v in vertices {
                assert!(marker.distance(v).abs() < 1e-3, "{:?} {:?}", kind, v);
            }
        }

        let circle = at_origin(ShapeKind::Circle, 4.0);
        assert_eq!(circle.outline().len(), 32);
        assert!(circle.outline().iter().all(|v| circle.distance(*v).abs() < 1e-4));
    }

    #[test]
    fn test_gps_marker_uses_point_radius() {
        let mut marker = Marker::gps(GeoCoord::default(), 5.0, 30.0);
        assert!(marker.contains(PixelPos::new(3.0, 0.0)));
        assert!(!marker.contains(PixelPos::new(10.0, 0.0)));
        marker.hidden = true;
        assert!(!marker.contains(PixelPos::new(0.0, 0.0)));
    }

    #[test]
    fn test_place_and_hit_test() {
        let tileset = tileset();
        let mut layer = MarkerLayer::new();
        let coord = GeoCoord::new(-24.872878, -65.462669);
        let first = layer.push(Marker::shape(coord, ShapeKind::Circle, 8.0, RED));
        let second = layer.push(Marker::shape(coord, ShapeKind::Square, 8.0, RED));
        layer.place_all(&tileset);

        let pos = layer.get(first).unwrap().pos;
        assert_eq!(pos, tileset.pos_from_coord(coord));
        assert_eq!(layer.hit_test(pos), Some(second));

        layer.get_mut(second).unwrap().hidden = true;
        assert_eq!(layer.hit_test(pos), Some(first));
        assert_eq!(layer.hit_test(PixelPos::new(pos.x + 100.0, pos.y)), None);
    }

    #[test]
    fn test_hit_test_follows_screen_size() {
        let mut layer = MarkerLayer::new();
        let index = layer.push(at_origin(ShapeKind::Circle, 8.0));

        // 6 world px is inside at 1x but 12 screen px away at 2x
        let p = PixelPos::new(6.0, 0.0);
        assert_eq!(layer.hit_test(p), Some(index));
        assert_eq!(layer.hit_test_at_scale(p, 2.0), None);
        // Zoomed out the same screen-size marker covers more of the map
        assert_eq!(layer.hit_test_at_scale(PixelPos::new(12.0, 0.0), 0.5), Some(index));
    }

    #[test]
    fn test_route_ping_pong() {
        let a = GeoCoord::new(-24.872878, -65.462669);
        let b = GeoCoord::new(-24.875672, -65.456650);
        let mut route = Route::new(a, b, 20.0);

        let mid = route.advance(10.0);
        assert!((mid.lng - a.lerp(&b, 0.5).lng).abs() < 1e-9);
        let end = route.advance(10.0);
        assert!((end.lat - b.lat).abs() < 1e-9);
        let back = route.advance(10.0);
        assert!((back.lng - mid.lng).abs() < 1e-9);
    }

    #[test]
    fn test_marker_follows_route() {
        let tileset = tileset();
        let a = GeoCoord::new(-24.872878, -65.462669);
        let b = GeoCoord::new(-24.875672, -65.456650);
        let mut marker = at_origin(ShapeKind::Triangle, 6.0).with_route(Route::new(a, b, 4.0));
        assert_eq!(marker.coord, a);

        marker.advance(4.0, &tileset);
        assert!((marker.coord.lat - b.lat).abs() < 1e-9);
        assert_eq!(marker.pos, tileset.pos_from_coord(marker.coord));
    }
}
