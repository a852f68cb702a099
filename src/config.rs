//! Map configuration: projection, start view, places and tile service.
//!
//! Two presets mirror the two deployments of the map: the Swiss LV03 map with nine
//! places and the web Mercator map with two. Native builds pick the web preset with
//! `GEOINFO_MAP_VARIANT=web`.

use crate::constants::{
    OSM_ATTRIBUTION, OSM_TILE_URL, SWISS_PROJECTION_CODE, SWISS_PROJECTION_DEF, SWISS_START_ZOOM,
    WEB_MERCATOR_CODE, WEB_START_ZOOM,
};
use crate::features::MarkerStyle;
use crate::map::{Layer, TileLayer, TileSource, VectorLayer, View};
use crate::projection::{ProjectionError, ProjectionRegistry};
use crate::registry::{swiss_places, web_mercator_places, CoordinateRegistry, PlaceEntry};
use crate::types::Coordinate;
use thiserror::Error;

/// Errors raised while applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The projection could not be registered or found
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// A custom projection to register before building the view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Identifier, e.g. `EPSG:21781`
    pub code: String,
    /// Proj-style parameter string; `None` for built-in projections
    pub definition: Option<String>,
}

/// Everything needed to build a map session.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// View projection; web Mercator when absent
    pub projection: Option<ProjectionConfig>,
    /// Initial view center
    pub center: Coordinate,
    /// Initial zoom level
    pub zoom: f64,
    /// Places shown as markers, in draw order
    pub places: Vec<PlaceEntry>,
    /// XYZ tile URL template; no base layer when absent
    pub tile_url: Option<String>,
    /// Attribution for the tiles
    pub attribution: String,
    /// Marker icon style
    pub marker_style: MarkerStyle,
}

impl MapConfig {
    /// Swiss LV03 map with nine places, centered on Sachseln.
    pub fn swiss() -> Self {
        let places = swiss_places();
        let center = CoordinateRegistry::new(places.clone())
            .get("SACHSELN")
            .unwrap_or(Coordinate::new(600_000.0, 200_000.0));
        Self {
            projection: Some(ProjectionConfig {
                code: SWISS_PROJECTION_CODE.to_string(),
                definition: Some(SWISS_PROJECTION_DEF.to_string()),
            }),
            center,
            zoom: SWISS_START_ZOOM,
            places,
            tile_url: Some(OSM_TILE_URL.to_string()),
            attribution: OSM_ATTRIBUTION.to_string(),
            marker_style: MarkerStyle::default(),
        }
    }

    /// Web Mercator map with two places, centered on Sachseln.
    pub fn web_mercator() -> Self {
        let places = web_mercator_places();
        let center = CoordinateRegistry::new(places.clone())
            .get("SACHSELN")
            .unwrap_or(Coordinate::new(0.0, 0.0));
        Self {
            projection: None,
            center,
            zoom: WEB_START_ZOOM,
            places,
            tile_url: Some(OSM_TILE_URL.to_string()),
            attribution: OSM_ATTRIBUTION.to_string(),
            marker_style: MarkerStyle::default(),
        }
    }

    /// The preset named `variant` (`swiss` or `web`); unknown or missing names
    /// give the Swiss preset.
    pub fn preset(variant: Option<&str>) -> Self {
        match variant {
            Some("web") => Self::web_mercator(),
            Some("swiss") | None => Self::swiss(),
            Some(other) => {
                log::warn!("unknown map variant `{other}`, using swiss");
                Self::swiss()
            }
        }
    }

    /// Picks the preset named by `GEOINFO_MAP_VARIANT`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let variant = std::env::var("GEOINFO_MAP_VARIANT").ok();
        log::info!("map variant: {}", variant.as_deref().unwrap_or("swiss"));
        Self::preset(variant.as_deref())
    }

    /// Builds the view and the layer stack described by this configuration.
    pub fn build(&self) -> Result<(View, Vec<Layer>), ConfigError> {
        let mut projections = ProjectionRegistry::with_defaults();
        let code = match &self.projection {
            Some(ProjectionConfig {
                code,
                definition: Some(definition),
            }) => {
                projections.register(code, definition)?;
                code.as_str()
            }
            Some(ProjectionConfig { code, definition: None }) => code.as_str(),
            None => WEB_MERCATOR_CODE,
        };
        let projection = projections.get(code)?.clone();

        let mut layers = Vec::new();
        if let Some(url) = &self.tile_url {
            let source = TileSource::xyz(url, &self.attribution);
            let layer = if projection.is_equivalent(source.projection()) {
                TileLayer::new(source)
            } else {
                TileLayer::reprojected(source, projection.clone())
            };
            layers.push(Layer::Tile(layer));
        }
        let markers = CoordinateRegistry::new(self.places.clone()).markers();
        layers.push(Layer::Vector(VectorLayer::new(
            markers,
            self.marker_style.clone(),
        )));

        Ok((View::new(projection, self.center, self.zoom), layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swiss_preset_builds_reprojected_base_and_nine_markers() {
        let (view, layers) = MapConfig::swiss().build().expect("builds");
        assert_eq!(view.projection().code(), SWISS_PROJECTION_CODE);
        assert_eq!(view.zoom(), SWISS_START_ZOOM);
        assert_eq!(layers.len(), 2);
        assert!(matches!(&layers[0], Layer::Tile(t) if t.needs_reprojection()));
        assert!(matches!(&layers[1], Layer::Vector(v) if v.markers().len() == 9));
    }

    #[test]
    fn web_preset_uses_native_tiles() {
        let (view, layers) = MapConfig::web_mercator().build().expect("builds");
        assert_eq!(view.projection().code(), WEB_MERCATOR_CODE);
        assert!(matches!(&layers[0], Layer::Tile(t) if !t.needs_reprojection()));
        assert!(matches!(&layers[1], Layer::Vector(v) if v.markers().len() == 2));
    }

    #[test]
    fn variant_names_select_presets() {
        assert_eq!(MapConfig::preset(Some("web")), MapConfig::web_mercator());
        assert_eq!(MapConfig::preset(Some("swiss")), MapConfig::swiss());
        assert_eq!(MapConfig::preset(None), MapConfig::swiss());
        assert_eq!(MapConfig::preset(Some("mars")), MapConfig::swiss());
    }

    #[test]
    fn config_without_tiles_has_only_markers() {
        let mut config = MapConfig::web_mercator();
        config.tile_url = None;
        let (_, layers) = config.build().expect("builds");
        assert_eq!(layers.len(), 1);
        assert!(matches!(&layers[0], Layer::Vector(v) if v.markers().len() == 2));
    }

    #[test]
    fn unknown_projection_is_reported() {
        let mut config = MapConfig::web_mercator();
        config.projection = Some(ProjectionConfig {
            code: "EPSG:2056".into(),
            definition: None,
        });
        assert!(matches!(
            config.build(),
            Err(ConfigError::Projection(ProjectionError::Unknown(code))) if code == "EPSG:2056"
        ));
    }
}
