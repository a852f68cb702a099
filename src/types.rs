//! Core data types shared by the map engine and the interaction layer.
//!
//! Map coordinates are planar values in the view projection's units; geographic
//! positions travel between projections as WGS84 longitude/latitude.

use serde::{Deserialize, Serialize};

/// A position in a planar projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Easting
    pub x: f64,
    /// Northing
    pub y: f64,
}

impl Coordinate {
    /// Creates a coordinate from an easting/northing pair.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another coordinate in projection units.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A geographic position on the WGS84 ellipsoid, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees, positive east
    pub lon: f64,
    /// Latitude in degrees, positive north
    pub lat: f64,
}

impl LonLat {
    /// Creates a geographic position.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// An axis-aligned rectangle in projection units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Minimum easting
    pub min_x: f64,
    /// Minimum northing
    pub min_y: f64,
    /// Maximum easting
    pub max_x: f64,
    /// Maximum northing
    pub max_y: f64,
}

impl Extent {
    /// Creates an extent from its corner values.
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest extent containing all given coordinates, or `None` for an empty input.
    pub fn bounding(points: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        points.into_iter().fold(None, |acc, c| {
            Some(match acc {
                None => Extent::new(c.x, c.y, c.x, c.y),
                Some(e) => Extent::new(
                    e.min_x.min(c.x),
                    e.min_y.min(c.y),
                    e.max_x.max(c.x),
                    e.max_y.max(c.y),
                ),
            })
        })
    }

    /// Width in projection units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in projection units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether the coordinate lies inside (inclusive).
    pub fn contains(&self, c: &Coordinate) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }
}

/// Cursor style requested for the map container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// The platform default arrow
    #[default]
    Default,
    /// Pointing hand shown over clickable markers
    Pointer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_extent_covers_all_points() {
        let extent = Extent::bounding([
            Coordinate::new(3.0, -1.0),
            Coordinate::new(-2.0, 4.0),
            Coordinate::new(0.5, 0.5),
        ])
        .expect("non-empty input");
        assert_eq!(extent, Extent::new(-2.0, -1.0, 3.0, 4.0));
        assert_eq!(extent.width(), 5.0);
        assert!(extent.contains(&Coordinate::new(0.0, 0.0)));
        assert!(!extent.contains(&Coordinate::new(3.1, 0.0)));
    }

    #[test]
    fn bounding_extent_of_nothing_is_none() {
        assert!(Extent::bounding(std::iter::empty()).is_none());
    }
}
