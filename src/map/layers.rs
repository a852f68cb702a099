//! Map layers: a raster base layer and a vector layer of markers.

use super::tiles::TileSource;
use crate::features::{MarkerStyle, NamedMarker};
use crate::projection::Projection;
use crate::types::Coordinate;
use eframe::egui;

/// Background imagery from a tile source.
#[derive(Debug, Clone)]
pub struct TileLayer {
    source: TileSource,
    projection: Option<Projection>,
}

impl TileLayer {
    /// Tiles drawn in the source's own projection.
    pub fn new(source: TileSource) -> Self {
        Self {
            source,
            projection: None,
        }
    }

    /// Tiles reprojected into `projection` before drawing.
    pub fn reprojected(source: TileSource, projection: Projection) -> Self {
        Self {
            source,
            projection: Some(projection),
        }
    }

    /// The tile source.
    pub fn source(&self) -> &TileSource {
        &self.source
    }

    /// Projection the tiles are drawn in.
    pub fn render_projection(&self) -> &Projection {
        self.projection
            .as_ref()
            .unwrap_or_else(|| self.source.projection())
    }

    /// Whether tiles must be warped to reach the render projection.
    pub fn needs_reprojection(&self) -> bool {
        !self.render_projection().is_equivalent(self.source.projection())
    }
}

/// All markers of the session, drawn in insertion order with one shared style.
#[derive(Debug, Clone, Default)]
pub struct VectorLayer {
    markers: Vec<NamedMarker>,
    style: MarkerStyle,
}

impl VectorLayer {
    /// Creates the layer from its markers and their style.
    pub fn new(markers: Vec<NamedMarker>, style: MarkerStyle) -> Self {
        Self { markers, style }
    }

    /// Markers in draw order.
    pub fn markers(&self) -> &[NamedMarker] {
        &self.markers
    }

    /// The shared marker style.
    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    /// Markers whose icon covers `pixel`, topmost (last drawn) first.
    pub fn features_at_pixel<'a>(
        &'a self,
        pixel: egui::Pos2,
        to_pixel: impl Fn(Coordinate) -> egui::Pos2 + 'a,
    ) -> impl Iterator<Item = &'a NamedMarker> + 'a {
        self.markers
            .iter()
            .rev()
            .filter(move |m| self.style.icon_rect(to_pixel(m.coordinate())).contains(pixel))
    }

    /// The topmost marker at `pixel`.
    pub fn get_feature_at_pixel<'a>(
        &'a self,
        pixel: egui::Pos2,
        to_pixel: impl Fn(Coordinate) -> egui::Pos2 + 'a,
    ) -> Option<&'a NamedMarker> {
        self.features_at_pixel(pixel, to_pixel).next()
    }
}

/// A layer in the map's draw stack.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Raster tiles
    Tile(TileLayer),
    /// Point markers
    Vector(VectorLayer),
}
