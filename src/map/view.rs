//! View state: center, zoom and projection, plus pixel/coordinate conversion.
//!
//! Pixels are measured from the top-left corner of the map container, with y growing
//! downwards; map coordinates grow northwards.

use crate::constants::{MAX_ZOOM, MIN_ZOOM};
use crate::projection::Projection;
use crate::types::{Coordinate, Extent};
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Serializable snapshot of a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Center in view projection units
    pub center: Coordinate,
    /// Fractional zoom level
    pub zoom: f64,
    /// Projection identifier
    pub projection: String,
}

/// The visible part of the map.
#[derive(Debug, Clone)]
pub struct View {
    projection: Projection,
    center: Coordinate,
    zoom: f64,
}

impl View {
    /// Creates a view; the zoom is clamped to the allowed range.
    pub fn new(projection: Projection, center: Coordinate, zoom: f64) -> Self {
        Self {
            projection,
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Projection of all coordinates shown in this view.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Current center.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Snapshot of center, zoom and projection.
    pub fn state(&self) -> ViewState {
        ViewState {
            center: self.center,
            zoom: self.zoom,
            projection: self.projection.code().to_string(),
        }
    }

    /// Map units per pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        self.projection.max_resolution() / 2f64.powf(self.zoom)
    }

    /// Sets the zoom level, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Container pixel at which a coordinate is drawn.
    pub fn pixel_from_coordinate(&self, c: Coordinate, size: egui::Vec2) -> egui::Pos2 {
        let res = self.resolution();
        egui::pos2(
            ((c.x - self.center.x) / res + f64::from(size.x) / 2.0) as f32,
            ((self.center.y - c.y) / res + f64::from(size.y) / 2.0) as f32,
        )
    }

    /// Coordinate shown at a container pixel.
    pub fn coordinate_from_pixel(&self, p: egui::Pos2, size: egui::Vec2) -> Coordinate {
        let res = self.resolution();
        Coordinate::new(
            self.center.x + (f64::from(p.x) - f64::from(size.x) / 2.0) * res,
            self.center.y - (f64::from(p.y) - f64::from(size.y) / 2.0) * res,
        )
    }

    /// Extent covered by a container of the given size.
    pub fn extent(&self, size: egui::Vec2) -> Extent {
        let half_w = f64::from(size.x) / 2.0 * self.resolution();
        let half_h = f64::from(size.y) / 2.0 * self.resolution();
        Extent::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Drags the map content by a pixel delta. Returns whether the view changed.
    pub fn pan_by(&mut self, delta: egui::Vec2) -> bool {
        if delta == egui::Vec2::ZERO {
            return false;
        }
        let res = self.resolution();
        self.center = Coordinate::new(
            self.center.x - f64::from(delta.x) * res,
            self.center.y + f64::from(delta.y) * res,
        );
        true
    }

    /// Changes the zoom by `delta` levels keeping the coordinate under `pixel` fixed.
    /// Returns whether the view changed.
    pub fn zoom_at(&mut self, pixel: egui::Pos2, size: egui::Vec2, delta: f64) -> bool {
        let anchor = self.coordinate_from_pixel(pixel, size);
        let old_zoom = self.zoom;
        self.set_zoom(self.zoom + delta);
        if (self.zoom - old_zoom).abs() <= f64::EPSILON {
            return false;
        }
        // Shift the center so the anchor coordinate ends up under the same pixel
        let moved = self.pixel_from_coordinate(anchor, size);
        let res = self.resolution();
        self.center = Coordinate::new(
            self.center.x + f64::from(moved.x - pixel.x) * res,
            self.center.y - f64::from(moved.y - pixel.y) * res,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> View {
        View::new(Projection::web_mercator(), Coordinate::new(1000.0, 2000.0), 10.0)
    }

    #[test]
    fn center_is_in_the_middle_of_the_container() {
        let v = view();
        let size = egui::vec2(800.0, 600.0);
        assert_eq!(v.pixel_from_coordinate(v.center(), size), egui::pos2(400.0, 300.0));
        let c = v.coordinate_from_pixel(egui::pos2(400.0, 300.0), size);
        assert!(c.distance(&v.center()) < 1e-6);
    }

    #[test]
    fn north_is_up() {
        let v = view();
        let size = egui::vec2(800.0, 600.0);
        let north = Coordinate::new(1000.0, 2000.0 + 100.0 * v.resolution());
        let p = v.pixel_from_coordinate(north, size);
        assert!((p.y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn pan_moves_content_with_the_pointer() {
        let mut v = view();
        let size = egui::vec2(800.0, 600.0);
        let c = Coordinate::new(1500.0, 2500.0);
        let before = v.pixel_from_coordinate(c, size);
        assert!(v.pan_by(egui::vec2(30.0, -20.0)));
        let after = v.pixel_from_coordinate(c, size);
        assert!((after.x - before.x - 30.0).abs() < 1e-2);
        assert!((after.y - before.y + 20.0).abs() < 1e-2);
        assert!(!v.pan_by(egui::Vec2::ZERO));
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut v = view();
        let size = egui::vec2(800.0, 600.0);
        let pixel = egui::pos2(100.0, 500.0);
        let anchor = v.coordinate_from_pixel(pixel, size);
        assert!(v.zoom_at(pixel, size, 1.0));
        assert_eq!(v.zoom(), 11.0);
        let p = v.pixel_from_coordinate(anchor, size);
        assert!((p - pixel).length() < 1e-2, "{p:?}");
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = view();
        v.set_zoom(MAX_ZOOM + 5.0);
        assert_eq!(v.zoom(), MAX_ZOOM);
        let size = egui::vec2(100.0, 100.0);
        assert!(!v.zoom_at(egui::pos2(10.0, 10.0), size, 1.0));
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        let mut v = view();
        let r10 = v.resolution();
        v.set_zoom(11.0);
        assert!((r10 / v.resolution() - 2.0).abs() < 1e-12);
    }
}
