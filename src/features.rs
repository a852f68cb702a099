//! Point markers and their shared icon style.

use crate::constants::{
    MARKER_ANCHOR_X_FRACTION, MARKER_ANCHOR_Y_PIXELS, MARKER_ICON_SCALE, MARKER_ICON_SIZE,
    MARKER_ICON_SRC,
};
use crate::types::Coordinate;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Property key under which a marker's label is stored.
pub const LABEL_PROPERTY: &str = "name";

/// Unit of one icon anchor component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnchorUnit {
    /// Fraction of the icon size (0.0 = left/top, 1.0 = right/bottom)
    Fraction(f32),
    /// Icon pixels from the left/top edge
    Pixels(f32),
}

impl AnchorUnit {
    fn resolve(self, extent: f32) -> f32 {
        match self {
            AnchorUnit::Fraction(f) => f * extent,
            AnchorUnit::Pixels(p) => p,
        }
    }
}

/// Icon style shared by every marker of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    /// Name of the icon image
    pub src: String,
    /// Native icon size in pixels
    pub size: [f32; 2],
    /// Horizontal anchor
    pub anchor_x: AnchorUnit,
    /// Vertical anchor
    pub anchor_y: AnchorUnit,
    /// Scale applied when drawing
    pub scale: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            src: MARKER_ICON_SRC.to_string(),
            size: MARKER_ICON_SIZE,
            anchor_x: AnchorUnit::Fraction(MARKER_ANCHOR_X_FRACTION),
            anchor_y: AnchorUnit::Pixels(MARKER_ANCHOR_Y_PIXELS),
            scale: MARKER_ICON_SCALE,
        }
    }
}

impl MarkerStyle {
    /// Screen rectangle covered by the icon when its anchor sits at `anchor_pos`.
    pub fn icon_rect(&self, anchor_pos: egui::Pos2) -> egui::Rect {
        let [w, h] = self.size;
        let anchor = egui::vec2(self.anchor_x.resolve(w), self.anchor_y.resolve(h)) * self.scale;
        egui::Rect::from_min_size(anchor_pos - anchor, egui::vec2(w, h) * self.scale)
    }
}

/// A labeled point feature.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMarker {
    geometry: Coordinate,
    properties: serde_json::Map<String, serde_json::Value>,
}

impl NamedMarker {
    /// Point position in the view projection.
    pub fn coordinate(&self) -> Coordinate {
        self.geometry
    }

    /// Reads a metadata property.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// The marker label, empty when absent.
    pub fn label(&self) -> &str {
        self.get(LABEL_PROPERTY)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

/// Builds a marker at `coordinate` carrying `label` as its name property.
pub fn create_marker(coordinate: Coordinate, label: &str) -> NamedMarker {
    let mut properties = serde_json::Map::new();
    properties.insert(LABEL_PROPERTY.to_string(), serde_json::Value::from(label));
    NamedMarker {
        geometry: coordinate,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_marker_keeps_position_and_label() {
        let marker = create_marker(Coordinate::new(599_299.7, 200_399.4), "Bern");
        assert_eq!(marker.coordinate(), Coordinate::new(599_299.7, 200_399.4));
        assert_eq!(marker.label(), "Bern");
        assert_eq!(marker.get("name"), Some(&serde_json::json!("Bern")));
    }

    #[test]
    fn icon_rect_puts_anchor_on_point() {
        let style = MarkerStyle::default();
        let rect = style.icon_rect(egui::pos2(100.0, 100.0));
        // 48x48 icon at 0.25 scale, anchored at (0.5 fraction, 46 px)
        assert_eq!(rect.min, egui::pos2(94.0, 88.5));
        assert_eq!(rect.max, egui::pos2(106.0, 100.5));
        assert!(rect.contains(egui::pos2(100.0, 100.0)));
    }
}
