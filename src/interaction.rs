//! Marker interaction: click to open a popover, hover feedback, dismiss on move.

use crate::map::{MapController, MapEvent};
use crate::popover::PopoverPresenter;
use crate::types::{Coordinate, Cursor};
use eframe::egui;

/// Reacts to map events by opening/closing the marker popover and updating the cursor.
#[derive(Debug, Default)]
pub struct InteractionHandler {
    popover_visible: bool,
}

impl InteractionHandler {
    /// Routes one event to its handler.
    pub fn handle(
        &mut self,
        event: &MapEvent,
        map: &mut MapController,
        popover: &mut PopoverPresenter,
    ) {
        match *event {
            MapEvent::Click { pixel, coordinate } => self.on_click(map, popover, pixel, coordinate),
            MapEvent::PointerMove { pixel } => self.on_pointer_move(map, pixel),
            MapEvent::MoveStart => self.on_move_start(popover),
            MapEvent::MoveEnd => log::debug!("map move ended"),
        }
    }

    /// Closes any open popover, then opens one for the marker under `pixel`, if any.
    pub fn on_click(
        &mut self,
        map: &MapController,
        popover: &mut PopoverPresenter,
        pixel: egui::Pos2,
        coordinate: Coordinate,
    ) {
        let label = map.for_each_feature_at_pixel(pixel, |marker| Some(marker.label().to_string()));
        popover.dispose();
        self.popover_visible = false;
        let Some(label) = label else {
            return;
        };
        popover.show(coordinate, &label);
        self.popover_visible = true;
    }

    /// Shows a pointer cursor while over a marker.
    pub fn on_pointer_move(&self, map: &mut MapController, pixel: egui::Pos2) {
        let cursor = if map.has_feature_at_pixel(pixel) {
            Cursor::Pointer
        } else {
            Cursor::Default
        };
        map.set_cursor(cursor);
    }

    /// Closes any open popover.
    pub fn on_move_start(&mut self, popover: &mut PopoverPresenter) {
        popover.dispose();
        self.popover_visible = false;
    }

    /// Whether the handler has a popover open.
    pub fn popover_visible(&self) -> bool {
        self.popover_visible
    }
}
