//! User interface for the map viewer.
//!
//! The window is one full-size map. Input over it is turned into map events for the
//! session, then the layers, controls and popover are painted from session state.
//!
//! # Module Organization
//!
//! - `state` - The application struct and its screen-only resources
//! - `canvas` - Pointer and keyboard handling, container/screen conversion
//! - `rendering` - Tiles, markers, zoom controls, attribution and the popover
//! - `markup` - Layout of popover bodies

mod canvas;
mod markup;
mod rendering;
mod state;

pub use state::GeoInfoApp;

use crate::types::Cursor;
use eframe::egui;

impl eframe::App for GeoInfoApp {
    /// Main update function called by egui for each frame.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Upload tiles that finished downloading since the last frame
        self.tiles.poll(ctx);
        self.ensure_icon(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });
    }
}

impl GeoInfoApp {
    /// Renders the map filling `ui` and handles its input.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_map(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        let ctx = ui.ctx().clone();

        if !self.session.map().is_attached() {
            return;
        }
        self.session.map_mut().set_size(canvas_rect.size());

        let button_zoom = self.draw_zoom_controls(&ctx, canvas_rect);
        let events = self.handle_map_input(ui, &response, button_zoom);
        self.session.handle_events(events);

        self.render_map_layers(&ctx, &painter, canvas_rect);
        self.draw_attribution(&painter, canvas_rect);
        self.draw_popover(&ctx, &painter, canvas_rect);

        if self.session.map().cursor() == Cursor::Pointer && self.last_pointer.is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }
    }
}
