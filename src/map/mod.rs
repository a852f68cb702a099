//! The map engine: view, layers, hit testing and event production.
//!
//! # Module Organization
//!
//! - `view` - Center/zoom/projection and pixel conversions
//! - `layers` - Tile and vector layers
//! - `tiles` - Tile addressing, selection and texture cache

mod layers;
mod tiles;
mod view;

pub use layers::{Layer, TileLayer, VectorLayer};
pub use tiles::{decode_image, plan_tiles, TileCache, TileCoord, TileError, TilePlan, TileSource};
pub use view::{View, ViewState};

use crate::features::NamedMarker;
use crate::types::{Coordinate, Cursor};
use eframe::egui;

/// The element the map draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Element identifier (the canvas id in the browser)
    pub id: String,
    /// Size in pixels
    pub size: egui::Vec2,
}

impl Container {
    /// Creates a container description.
    pub fn new(id: impl Into<String>, size: egui::Vec2) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

/// Pointer and view events delivered to the session, one at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// Primary click without drag
    Click {
        /// Container pixel of the click
        pixel: egui::Pos2,
        /// Map coordinate under the click
        coordinate: Coordinate,
    },
    /// Pointer moved over the map
    PointerMove {
        /// Container pixel of the pointer
        pixel: egui::Pos2,
    },
    /// The view started changing (pan or zoom)
    MoveStart,
    /// The view stopped changing
    MoveEnd,
}

/// A view and a stack of layers bound to a container.
pub struct MapController {
    target: Option<Container>,
    layers: Vec<Layer>,
    view: View,
    cursor: Cursor,
    moving: bool,
}

impl MapController {
    /// Binds layers and a view to a container.
    ///
    /// Without a container the map stays detached: it draws nothing, hit tests miss
    /// and no events are produced.
    pub fn initialize(target: Option<Container>, layers: Vec<Layer>, view: View) -> Self {
        match &target {
            Some(c) => log::info!(
                "map attached to `{}` ({} layers, {} at zoom {})",
                c.id,
                layers.len(),
                view.projection().code(),
                view.zoom()
            ),
            None => log::warn!("map has no container; nothing will be drawn"),
        }
        Self {
            target,
            layers,
            view,
            cursor: Cursor::Default,
            moving: false,
        }
    }

    /// Whether the map has a container.
    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    /// Container description, when attached.
    pub fn target(&self) -> Option<&Container> {
        self.target.as_ref()
    }

    /// Container size in pixels, zero when detached.
    pub fn size(&self) -> egui::Vec2 {
        self.target.as_ref().map(|c| c.size).unwrap_or(egui::Vec2::ZERO)
    }

    /// Tracks a resized container.
    pub fn set_size(&mut self, size: egui::Vec2) {
        if let Some(target) = &mut self.target {
            target.size = size;
        }
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The current view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Cursor requested for the container.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Sets the cursor requested for the container.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Container pixel at which a coordinate is drawn.
    pub fn pixel_from_coordinate(&self, c: Coordinate) -> egui::Pos2 {
        self.view.pixel_from_coordinate(c, self.size())
    }

    /// Coordinate under a container pixel.
    pub fn coordinate_from_pixel(&self, p: egui::Pos2) -> Coordinate {
        self.view.coordinate_from_pixel(p, self.size())
    }

    /// Calls `f` with each marker at `pixel`, topmost first, until it returns `Some`.
    pub fn for_each_feature_at_pixel<T>(
        &self,
        pixel: egui::Pos2,
        mut f: impl FnMut(&NamedMarker) -> Option<T>,
    ) -> Option<T> {
        if !self.is_attached() {
            return None;
        }
        self.layers.iter().rev().find_map(|layer| match layer {
            Layer::Vector(v) => v
                .features_at_pixel(pixel, |c| self.pixel_from_coordinate(c))
                .find_map(&mut f),
            Layer::Tile(_) => None,
        })
    }

    /// Whether any marker lies at `pixel`.
    pub fn has_feature_at_pixel(&self, pixel: egui::Pos2) -> bool {
        self.for_each_feature_at_pixel(pixel, |_| Some(())).is_some()
    }

    /// A click event for a container pixel.
    pub fn click_event(&self, pixel: egui::Pos2) -> MapEvent {
        MapEvent::Click {
            pixel,
            coordinate: self.coordinate_from_pixel(pixel),
        }
    }

    /// Drags the map content. Returns whether the view changed.
    pub fn pan_by(&mut self, delta: egui::Vec2) -> bool {
        self.is_attached() && self.view.pan_by(delta)
    }

    /// Zooms around a container pixel. Returns whether the view changed.
    pub fn zoom_at(&mut self, pixel: egui::Pos2, delta: f64) -> bool {
        let size = self.size();
        self.is_attached() && self.view.zoom_at(pixel, size, delta)
    }

    /// Zooms around the container center. Returns whether the view changed.
    pub fn zoom_by(&mut self, delta: f64) -> bool {
        let center = (self.size() / 2.0).to_pos2();
        self.zoom_at(center, delta)
    }

    /// Turns per-frame "view changed" flags into `MoveStart`/`MoveEnd` edges.
    pub fn track_movement(&mut self, changed: bool) -> Option<MapEvent> {
        match (self.moving, changed) {
            (false, true) => {
                self.moving = true;
                Some(MapEvent::MoveStart)
            }
            (true, false) => {
                self.moving = false;
                Some(MapEvent::MoveEnd)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{create_marker, MarkerStyle};
    use crate::projection::Projection;

    fn controller(target: Option<Container>) -> MapController {
        let markers = VectorLayer::new(
            vec![
                create_marker(Coordinate::new(0.0, 0.0), "Origin"),
                create_marker(Coordinate::new(10_000.0, 0.0), "East"),
            ],
            MarkerStyle::default(),
        );
        let view = View::new(Projection::web_mercator(), Coordinate::new(0.0, 0.0), 10.0);
        MapController::initialize(target, vec![Layer::Vector(markers)], view)
    }

    fn attached() -> MapController {
        controller(Some(Container::new("map", egui::vec2(800.0, 600.0))))
    }

    #[test]
    fn hit_test_finds_marker_at_its_pixel() {
        let map = attached();
        let pixel = map.pixel_from_coordinate(Coordinate::new(10_000.0, 0.0));
        let label = map.for_each_feature_at_pixel(pixel, |m| Some(m.label().to_string()));
        assert_eq!(label.as_deref(), Some("East"));
        assert!(map.has_feature_at_pixel(egui::pos2(400.0, 300.0)));
        assert!(!map.has_feature_at_pixel(egui::pos2(10.0, 10.0)));
    }

    #[test]
    fn hit_test_is_idempotent() {
        let map = attached();
        for pixel in [egui::pos2(400.0, 300.0), egui::pos2(5.0, 5.0)] {
            assert_eq!(map.has_feature_at_pixel(pixel), map.has_feature_at_pixel(pixel));
        }
    }

    #[test]
    fn predicate_can_skip_features() {
        let map = attached();
        let found = map.for_each_feature_at_pixel(egui::pos2(400.0, 300.0), |m| {
            (m.label() != "Origin").then_some(())
        });
        assert!(found.is_none());
    }

    #[test]
    fn detached_map_never_hits_or_moves() {
        let mut map = controller(None);
        assert!(!map.is_attached());
        assert_eq!(map.size(), egui::Vec2::ZERO);
        assert!(!map.has_feature_at_pixel(egui::pos2(0.0, 0.0)));
        assert!(!map.pan_by(egui::vec2(10.0, 0.0)));
        assert!(!map.zoom_by(1.0));
    }

    #[test]
    fn movement_edges_become_events() {
        let mut map = attached();
        assert_eq!(map.track_movement(false), None);
        assert_eq!(map.track_movement(true), Some(MapEvent::MoveStart));
        assert_eq!(map.track_movement(true), None);
        assert_eq!(map.track_movement(false), Some(MapEvent::MoveEnd));
    }

    #[test]
    fn click_event_carries_coordinate() {
        let map = attached();
        match map.click_event(egui::pos2(400.0, 300.0)) {
            MapEvent::Click { coordinate, .. } => assert!(coordinate.distance(&Coordinate::new(0.0, 0.0)) < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
    }
}
