//! # GeoInfo Map
//!
//! An interactive map of named places. Each place is drawn as an arrow marker over an
//! OpenStreetMap base layer; clicking a marker opens a popover with the place name.
//!
//! ## Features
//! - Swiss LV03 (EPSG:21781) view with reprojected OSM tiles, or a plain web Mercator view
//! - Named point markers from a coordinate registry
//! - Click-to-open popover, pointer cursor over markers, popover closes when the map moves
//! - Drag panning, wheel/double-click/keyboard zooming and zoom buttons
//! - Swiss and web Mercator presets, chosen at startup

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod features;
pub mod interaction;
pub mod map;
pub mod popover;
pub mod projection;
pub mod registry;
pub mod session;
pub mod types;
mod ui;

// Re-export public types and functions
pub use config::{ConfigError, MapConfig, ProjectionConfig};
pub use features::{create_marker, MarkerStyle, NamedMarker};
pub use interaction::InteractionHandler;
pub use map::{Container, Layer, MapController, MapEvent, View};
pub use popover::{Popover, PopoverPresenter};
pub use projection::{Projection, ProjectionError, ProjectionRegistry};
pub use registry::{CoordinateRegistry, PlaceEntry};
pub use session::MapSession;
pub use types::*;
pub use ui::GeoInfoApp;

/// Runs the map viewer in a native window.
///
/// The configuration comes from the environment (see [`MapConfig::from_env`]). A
/// configuration that cannot be built leaves the window with a detached, blank map.
///
/// # Example
///
/// ```no_run
/// use geoinfo_map::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let app = build_app(&MapConfig::from_env());
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("GeoInfo Map")
            .with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };
    eframe::run_native(
        "GeoInfo Map",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
}

/// Starts the map viewer on the canvas element with id `canvas_id`.
///
/// Without such a canvas nothing is drawn and an error is logged.
#[cfg(target_arch = "wasm32")]
pub async fn start_web(canvas_id: &str) {
    use wasm_bindgen::JsCast;

    let canvas = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(canvas_id))
        .and_then(|element| element.dyn_into::<web_sys::HtmlCanvasElement>().ok());
    let Some(canvas) = canvas else {
        log::error!("no canvas with id `{canvas_id}`; the map stays blank");
        return;
    };

    let app = build_app(&MapConfig::swiss());
    let result = eframe::WebRunner::new()
        .start(
            canvas,
            eframe::WebOptions::default(),
            Box::new(|_cc| Ok(Box::new(app))),
        )
        .await;
    if let Err(err) = result {
        log::error!("failed to start the map: {err:?}");
    }
}

fn build_app(config: &MapConfig) -> GeoInfoApp {
    match GeoInfoApp::new(config) {
        Ok(app) => app,
        Err(err) => {
            log::error!("invalid map configuration: {err}");
            let view = View::new(Projection::web_mercator(), config.center, config.zoom);
            GeoInfoApp::from_session(MapSession::from_map(MapController::initialize(
                None,
                Vec::new(),
                view,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_build_attached_apps() {
        for config in [MapConfig::swiss(), MapConfig::web_mercator()] {
            let app = build_app(&config);
            assert!(app.session.map().is_attached());
        }
    }

    #[test]
    fn broken_config_falls_back_to_blank_map() {
        let mut config = MapConfig::swiss();
        config.projection = Some(ProjectionConfig {
            code: "EPSG:0".into(),
            definition: Some("+proj=nope".into()),
        });
        let app = build_app(&config);
        assert!(!app.session.map().is_attached());
    }
}
