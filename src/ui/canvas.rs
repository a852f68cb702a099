//! Map input: pointer and keyboard gestures turned into view changes and map events.
//!
//! Pixels handed to the session are relative to the top-left corner of the map
//! rectangle, so the map behaves the same wherever the panel puts it.

use super::state::GeoInfoApp;
use crate::constants::{BUTTON_ZOOM_STEP, WHEEL_ZOOM_STEP};
use crate::map::MapEvent;
use eframe::egui;

/// egui reports one wheel notch as this many points of scroll.
const POINTS_PER_WHEEL_NOTCH: f64 = 50.0;

impl GeoInfoApp {
    /// Converts a screen position to a container pixel.
    pub fn screen_to_container(rect: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - rect.min).to_pos2()
    }

    /// Converts a container pixel to a screen position.
    pub fn container_to_screen(rect: egui::Rect, pixel: egui::Pos2) -> egui::Pos2 {
        rect.min + pixel.to_vec2()
    }

    /// Reads this frame's input over the map and returns the events it produced,
    /// in delivery order.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the map widget
    /// * `button_zoom` - Zoom change requested by the zoom buttons this frame
    pub fn handle_map_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        button_zoom: f64,
    ) -> Vec<MapEvent> {
        let rect = response.rect;
        let mut events = Vec::new();
        let mut changed = false;

        // Resolve the click against the view it landed on, before any gesture moves it
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let pixel = Self::screen_to_container(rect, pos);
                events.push(self.session.map().click_event(pixel));
            }
        }

        if button_zoom != 0.0 {
            changed |= self.session.map_mut().zoom_by(button_zoom);
        }
        changed |= self.handle_map_panning(response);
        changed |= self.handle_map_zoom(ui, response);

        if let Some(event) = self.session.map_mut().track_movement(changed) {
            events.push(event);
        }

        let hover = ui
            .input(|i| i.pointer.hover_pos())
            .filter(|pos| rect.contains(*pos))
            .map(|pos| Self::screen_to_container(rect, pos));
        if let Some(pixel) = hover {
            if changed || self.last_pointer != Some(pixel) {
                events.push(MapEvent::PointerMove { pixel });
            }
        }
        self.last_pointer = hover;

        events
    }

    /// Drags the map with the primary button. Returns whether the view changed.
    fn handle_map_panning(&mut self, response: &egui::Response) -> bool {
        if !response.dragged_by(egui::PointerButton::Primary) {
            return false;
        }
        self.session.map_mut().pan_by(response.drag_delta())
    }

    /// Handles wheel, double-click and `+`/`-` key zooming.
    ///
    /// Wheel and double-click zoom around the pointer, keys around the map center.
    /// Returns whether the view changed.
    fn handle_map_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) -> bool {
        let rect = response.rect;
        let Some(hover_pos) = ui
            .input(|i| i.pointer.hover_pos())
            .filter(|pos| rect.contains(*pos))
        else {
            return false;
        };
        let mut changed = false;

        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta != 0.0 {
            let delta = f64::from(scroll_delta) / POINTS_PER_WHEEL_NOTCH * WHEEL_ZOOM_STEP;
            let pixel = Self::screen_to_container(rect, hover_pos);
            changed |= self.session.map_mut().zoom_at(pixel, delta);
        }

        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let pixel = Self::screen_to_container(rect, pos);
                changed |= self.session.map_mut().zoom_at(pixel, BUTTON_ZOOM_STEP);
            }
        }

        let (zoom_in, zoom_out) = ui.input(|i| {
            (
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
            )
        });
        if zoom_in {
            changed |= self.session.map_mut().zoom_by(BUTTON_ZOOM_STEP);
        }
        if zoom_out {
            changed |= self.session.map_mut().zoom_by(-BUTTON_ZOOM_STEP);
        }

        changed
    }
}
