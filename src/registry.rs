//! Named place coordinates shown as markers.
//!
//! Each map variant has its own table, written in the coordinates of that variant's
//! view projection.

use crate::features::{create_marker, NamedMarker};
use crate::types::Coordinate;
use serde::{Deserialize, Serialize};

/// One named place: lookup key, display label and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceEntry {
    /// Stable lookup key (upper case, no spaces)
    pub name: String,
    /// Text shown in the popover
    pub label: String,
    /// Position in the view projection
    pub coordinate: Coordinate,
}

struct StaticPlace {
    name: &'static str,
    label: &'static str,
    coordinate: Coordinate,
}

const fn place(name: &'static str, label: &'static str, x: f64, y: f64) -> StaticPlace {
    StaticPlace {
        name,
        label,
        coordinate: Coordinate::new(x, y),
    }
}

// Swiss LV03 (EPSG:21781)
const SWISS_PLACES: &[StaticPlace] = &[
    place("BERN", "Bern", 599_299.710_370, 200_399.391_909),
    place("BRUNNEN", "Brunnen", 688_678.726_078, 205_633.585_652),
    place("DUBAI", "Dubai", 5_376_789.141_211, -774_702.628_050),
    place("EFFI", "Effi", 694_319.330_100, 253_963.396_810),
    place("ESSEX", "Essex", 151_518.924_144, 767_411.966_168),
    place("LAUSANNE", "Lausanne", 536_043.006_032, 152_971.192_322),
    place("SACHSELN", "Sachseln", 661_553.500_243, 191_685.035_751),
    place("SARNEN", "Sarnen", 661_468.366_911, 193_920.112_919),
    place("STGALLEN", "St. Gallen", 747_505.313_171, 255_431.833_775),
];

// Web Mercator (EPSG:3857)
const WEB_MERCATOR_PLACES: &[StaticPlace] = &[
    place("SACHSELN", "Sachseln", 917_949.299_418, 5_921_356.691_912),
    place("STGALLEN", "St. Gallen", 1_045_739.008_915, 6_012_980.820_388),
];

fn to_entries(places: &[StaticPlace]) -> Vec<PlaceEntry> {
    places
        .iter()
        .map(|p| PlaceEntry {
            name: p.name.to_string(),
            label: p.label.to_string(),
            coordinate: p.coordinate,
        })
        .collect()
}

/// Places of the Swiss LV03 variant.
pub fn swiss_places() -> Vec<PlaceEntry> {
    to_entries(SWISS_PLACES)
}

/// Places of the web Mercator variant.
pub fn web_mercator_places() -> Vec<PlaceEntry> {
    to_entries(WEB_MERCATOR_PLACES)
}

/// Read-only lookup of place coordinates by name.
#[derive(Debug, Clone, Default)]
pub struct CoordinateRegistry {
    entries: Vec<PlaceEntry>,
}

impl CoordinateRegistry {
    /// Wraps a table of places. Order is kept and becomes the marker draw order.
    pub fn new(entries: Vec<PlaceEntry>) -> Self {
        Self { entries }
    }

    /// Coordinate of the named place.
    pub fn get(&self, name: &str) -> Option<Coordinate> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.coordinate)
    }

    /// All places in table order.
    pub fn entries(&self) -> &[PlaceEntry] {
        &self.entries
    }

    /// Builds one marker per place.
    pub fn markers(&self) -> Vec<NamedMarker> {
        self.entries
            .iter()
            .map(|e| create_marker(e.coordinate, &e.label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swiss_table_has_nine_places() {
        let registry = CoordinateRegistry::new(swiss_places());
        assert_eq!(registry.entries().len(), 9);
        assert_eq!(
            registry.get("SACHSELN"),
            Some(Coordinate::new(661_553.500_243, 191_685.035_751))
        );
        assert_eq!(registry.get("ZURICH"), None);
    }

    #[test]
    fn markers_follow_table_order_and_labels() {
        let registry = CoordinateRegistry::new(web_mercator_places());
        let labels: Vec<_> = registry.markers().iter().map(|m| m.label().to_string()).collect();
        assert_eq!(labels, vec!["Sachseln", "St. Gallen"]);
    }
}
