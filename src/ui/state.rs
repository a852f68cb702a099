//! Application state for the map window.
//!
//! The session owns everything the interaction logic needs; this struct adds the
//! pieces that only exist on screen: tile textures, the marker icon and the last
//! pointer position seen over the map.

use crate::config::{ConfigError, MapConfig};
use crate::constants::{MARKER_ICON_SRC, TILE_CACHE_CAPACITY};
use crate::map::{decode_image, Container, TileCache};
use crate::session::MapSession;
use eframe::egui;

/// Marker icon bundled with the binary.
const MARKER_ICON_BYTES: &[u8] = include_bytes!("../../assets/arrow_down.png");

/// Main application struct for the map viewer.
pub struct GeoInfoApp {
    /// Map, popover and interaction wiring
    pub session: MapSession,
    /// Downloaded base tiles
    pub(super) tiles: TileCache,
    /// Marker icon texture; `None` draws a plain triangle instead
    pub(super) icon: Option<egui::TextureHandle>,
    /// Whether loading the icon was already attempted
    pub(super) icon_loaded: bool,
    /// Last container pixel reported as a pointer move
    pub(super) last_pointer: Option<egui::Pos2>,
}

impl GeoInfoApp {
    /// Builds the app for a configuration. The container is sized on the first frame.
    pub fn new(config: &MapConfig) -> Result<Self, ConfigError> {
        let target = Container::new("map", egui::Vec2::ZERO);
        Ok(Self::from_session(MapSession::new(config, Some(target))?))
    }

    /// Wraps an existing session.
    pub fn from_session(session: MapSession) -> Self {
        Self {
            session,
            tiles: TileCache::new(TILE_CACHE_CAPACITY),
            icon: None,
            icon_loaded: false,
            last_pointer: None,
        }
    }

    /// Uploads the marker icon once.
    pub(super) fn ensure_icon(&mut self, ctx: &egui::Context) {
        if self.icon_loaded {
            return;
        }
        self.icon_loaded = true;
        match decode_image(MARKER_ICON_BYTES) {
            Ok(image) => {
                self.icon = Some(ctx.load_texture(
                    MARKER_ICON_SRC,
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
            Err(err) => log::warn!("marker icon {MARKER_ICON_SRC} unusable, drawing shapes: {err}"),
        }
    }
}
