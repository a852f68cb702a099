//! Projection definitions and coordinate transforms.
//!
//! Projections are registered under an identifier (for example `EPSG:21781`) from a
//! proj-style parameter string and looked up by that identifier. Two methods are
//! supported: spherical web Mercator (`+proj=merc`) and the Swiss oblique Mercator
//! (`+proj=somerc`) on an arbitrary ellipsoid with an optional `+towgs84` datum shift.
//! Every projection converts to and from WGS84 longitude/latitude, which is how
//! coordinates move between projections.

use crate::constants::{
    NORMAL_SPHERE_RADIUS, TILE_SIZE, WEB_MERCATOR_CODE, WEB_MERCATOR_HALF_WORLD,
    WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_RADIUS,
};
use crate::types::{Coordinate, Extent, LonLat};
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use thiserror::Error;

/// Errors raised while registering or looking up a projection.
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    /// No projection is registered under the identifier
    #[error("unknown projection `{0}`")]
    Unknown(String),
    /// The definition has no `+proj` parameter
    #[error("projection definition has no `+proj` parameter")]
    MissingMethod,
    /// The `+proj` method is not implemented
    #[error("unsupported projection method `{0}`")]
    UnsupportedMethod(String),
    /// The `+ellps` name is not known
    #[error("unsupported ellipsoid `{0}`")]
    UnsupportedEllipsoid(String),
    /// A parameter value could not be parsed
    #[error("invalid value `{value}` for parameter `{name}`")]
    InvalidParameter {
        /// Parameter name without the leading `+`
        name: String,
        /// Raw value as written in the definition
        value: String,
    },
}

/// Reference ellipsoid given by semi-major axis and inverse flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Inverse flattening
    pub rf: f64,
}

impl Ellipsoid {
    /// World Geodetic System 1984.
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        rf: 298.257_223_563,
    };
    /// Bessel 1841, the ellipsoid of the Swiss CH1903 datum.
    pub const BESSEL: Ellipsoid = Ellipsoid {
        a: 6_377_397.155,
        rf: 299.152_812_8,
    };
    /// Geodetic Reference System 1980.
    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        rf: 298.257_222_101,
    };

    fn by_name(name: &str) -> Option<Self> {
        match name {
            "WGS84" => Some(Self::WGS84),
            "bessel" => Some(Self::BESSEL),
            "GRS80" => Some(Self::GRS80),
            _ => None,
        }
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        let f = 1.0 / self.rf;
        2.0 * f - f * f
    }

    fn to_geocentric(&self, lon: f64, lat: f64) -> [f64; 3] {
        let e2 = self.e2();
        let n = self.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        [
            n * lat.cos() * lon.cos(),
            n * lat.cos() * lon.sin(),
            n * (1.0 - e2) * lat.sin(),
        ]
    }

    fn from_geocentric(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.e2();
        let lon = y.atan2(x);
        let p = x.hypot(y);
        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..10 {
            let n = self.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
            let h = p / lat.cos() - n;
            let next = z.atan2(p * (1.0 - e2 * n / (n + h)));
            if (next - lat).abs() < 1e-14 {
                lat = next;
                break;
            }
            lat = next;
        }
        (lon, lat)
    }
}

/// Seven-parameter datum shift to WGS84 (position vector convention, as in `+towgs84`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatumShift {
    translation: [f64; 3],
    /// Rotations in radians
    rotation: [f64; 3],
    /// Scale factor `1 + ppm * 1e-6`
    scale: f64,
}

impl DatumShift {
    fn parse(value: &str) -> Result<Self, ProjectionError> {
        let values = value
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("towgs84", value))?;
        let arcsec = PI / 180.0 / 3600.0;
        match values.as_slice() {
            [dx, dy, dz] => Ok(Self {
                translation: [*dx, *dy, *dz],
                rotation: [0.0; 3],
                scale: 1.0,
            }),
            [dx, dy, dz, rx, ry, rz, ds] => Ok(Self {
                translation: [*dx, *dy, *dz],
                rotation: [rx * arcsec, ry * arcsec, rz * arcsec],
                scale: 1.0 + ds * 1e-6,
            }),
            _ => Err(invalid("towgs84", value)),
        }
    }

    fn to_wgs84(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let [dx, dy, dz] = self.translation;
        let [rx, ry, rz] = self.rotation;
        let m = self.scale;
        [
            m * (x - rz * y + ry * z) + dx,
            m * (rz * x + y - rx * z) + dy,
            m * (-ry * x + rx * y + z) + dz,
        ]
    }

    fn from_wgs84(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let [dx, dy, dz] = self.translation;
        let [rx, ry, rz] = self.rotation;
        let m = self.scale;
        let (x, y, z) = ((x - dx) / m, (y - dy) / m, (z - dz) / m);
        [
            x + rz * y - ry * z,
            -rz * x + y + rx * z,
            ry * x - rx * y + z,
        ]
    }
}

/// Swiss oblique Mercator (conformal double projection via the Gauss sphere).
#[derive(Debug, Clone, PartialEq)]
struct ObliqueMercator {
    ellipsoid: Ellipsoid,
    shift: Option<DatumShift>,
    e: f64,
    lon_0: f64,
    k_0: f64,
    x_0: f64,
    y_0: f64,
    /// Radius of the Gauss sphere
    radius: f64,
    alpha: f64,
    b_0: f64,
    k: f64,
}

impl ObliqueMercator {
    fn new(
        ellipsoid: Ellipsoid,
        shift: Option<DatumShift>,
        lat_0: f64,
        lon_0: f64,
        k_0: f64,
        x_0: f64,
        y_0: f64,
    ) -> Self {
        let e2 = ellipsoid.e2();
        let e = e2.sqrt();
        let phi_0 = lat_0.to_radians();
        let radius = ellipsoid.a * (1.0 - e2).sqrt() / (1.0 - e2 * phi_0.sin().powi(2));
        let alpha = (1.0 + e2 / (1.0 - e2) * phi_0.cos().powi(4)).sqrt();
        let b_0 = (phi_0.sin() / alpha).asin();
        let k = (FRAC_PI_4 + b_0 / 2.0).tan().ln() - alpha * (FRAC_PI_4 + phi_0 / 2.0).tan().ln()
            + alpha * e / 2.0 * ((1.0 + e * phi_0.sin()) / (1.0 - e * phi_0.sin())).ln();
        Self {
            ellipsoid,
            shift,
            e,
            lon_0: lon_0.to_radians(),
            k_0,
            x_0,
            y_0,
            radius,
            alpha,
            b_0,
            k,
        }
    }

    /// Projects geodetic radians on the local ellipsoid.
    fn project(&self, lon: f64, lat: f64) -> Coordinate {
        let e = self.e;
        let s = self.alpha * (FRAC_PI_4 + lat / 2.0).tan().ln()
            - self.alpha * e / 2.0 * ((1.0 + e * lat.sin()) / (1.0 - e * lat.sin())).ln()
            + self.k;
        let b = 2.0 * (s.exp().atan() - FRAC_PI_4);
        let l = self.alpha * (lon - self.lon_0);
        let l_bar = l
            .sin()
            .atan2(self.b_0.sin() * b.tan() + self.b_0.cos() * l.cos());
        let b_bar = (self.b_0.cos() * b.sin() - self.b_0.sin() * b.cos() * l.cos()).asin();
        let east = self.radius * l_bar;
        let north = self.radius / 2.0 * ((1.0 + b_bar.sin()) / (1.0 - b_bar.sin())).ln();
        Coordinate::new(east * self.k_0 + self.x_0, north * self.k_0 + self.y_0)
    }

    /// Inverse of [`Self::project`], returning geodetic radians on the local ellipsoid.
    fn unproject(&self, c: Coordinate) -> (f64, f64) {
        let east = (c.x - self.x_0) / self.k_0;
        let north = (c.y - self.y_0) / self.k_0;
        let l_bar = east / self.radius;
        let b_bar = 2.0 * ((north / self.radius).exp().atan() - FRAC_PI_4);
        let b = (self.b_0.cos() * b_bar.sin() + self.b_0.sin() * b_bar.cos() * l_bar.cos()).asin();
        let l = l_bar
            .sin()
            .atan2(self.b_0.cos() * l_bar.cos() - self.b_0.sin() * b_bar.tan());
        let lon = self.lon_0 + l / self.alpha;

        let e = self.e;
        let gauss = ((FRAC_PI_4 + b / 2.0).tan().ln() - self.k) / self.alpha;
        let mut lat = b;
        for _ in 0..20 {
            let s = gauss + e * (FRAC_PI_4 + (e * lat.sin()).asin() / 2.0).tan().ln();
            let next = 2.0 * s.exp().atan() - FRAC_PI_2;
            if (next - lat).abs() < 1e-14 {
                lat = next;
                break;
            }
            lat = next;
        }
        (lon, lat)
    }

    fn from_lon_lat(&self, p: LonLat) -> Coordinate {
        let (lon, lat) = (p.lon.to_radians(), p.lat.to_radians());
        let (lon, lat) = match self.shift {
            Some(shift) => {
                let xyz = shift.from_wgs84(Ellipsoid::WGS84.to_geocentric(lon, lat));
                self.ellipsoid.from_geocentric(xyz)
            }
            None => (lon, lat),
        };
        self.project(lon, lat)
    }

    fn to_lon_lat(&self, c: Coordinate) -> LonLat {
        let (lon, lat) = self.unproject(c);
        let (lon, lat) = match self.shift {
            Some(shift) => {
                let xyz = shift.to_wgs84(self.ellipsoid.to_geocentric(lon, lat));
                Ellipsoid::WGS84.from_geocentric(xyz)
            }
            None => (lon, lat),
        };
        LonLat::new(lon.to_degrees(), lat.to_degrees())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Method {
    /// Spherical Mercator with the given sphere radius
    Mercator { radius: f64 },
    ObliqueMercator(Box<ObliqueMercator>),
}

/// A registered projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    code: String,
    method: Method,
    extent: Option<Extent>,
}

impl Projection {
    /// The spherical web Mercator projection (`EPSG:3857`).
    pub fn web_mercator() -> Self {
        let h = WEB_MERCATOR_HALF_WORLD;
        Self {
            code: WEB_MERCATOR_CODE.to_string(),
            method: Method::Mercator {
                radius: WEB_MERCATOR_RADIUS,
            },
            extent: Some(Extent::new(-h, -h, h, h)),
        }
    }

    /// Builds a projection from a proj-style parameter string.
    ///
    /// Recognized parameters: `+proj` (`merc`, `somerc`), `+lat_0`, `+lon_0`, `+k_0`,
    /// `+x_0`, `+y_0`, `+ellps`, `+a`, `+towgs84`. Others (`+units`, `+no_defs`) are
    /// accepted and ignored.
    pub fn from_definition(code: &str, definition: &str) -> Result<Self, ProjectionError> {
        let params = parse_parameters(definition);
        let number = |name: &str, default: f64| -> Result<f64, ProjectionError> {
            match params.get(name) {
                Some(Some(v)) => v.parse::<f64>().map_err(|_| invalid(name, v)),
                Some(None) => Err(invalid(name, "")),
                None => Ok(default),
            }
        };

        let method = match params.get("proj") {
            Some(Some(m)) => m.as_str(),
            _ => return Err(ProjectionError::MissingMethod),
        };
        let method = match method {
            "merc" => {
                if let Some(Some(name)) = params.get("ellps") {
                    if name != "sphere" && params.get("a").is_none() {
                        return Err(ProjectionError::UnsupportedMethod(format!(
                            "ellipsoidal merc ({name})"
                        )));
                    }
                }
                Method::Mercator {
                    radius: number("a", WEB_MERCATOR_RADIUS)?,
                }
            }
            "somerc" => {
                let ellipsoid = match params.get("ellps") {
                    Some(Some(name)) => Ellipsoid::by_name(name)
                        .ok_or_else(|| ProjectionError::UnsupportedEllipsoid(name.clone()))?,
                    _ => Ellipsoid::WGS84,
                };
                let shift = match params.get("towgs84") {
                    Some(Some(v)) => Some(DatumShift::parse(v)?),
                    Some(None) => return Err(invalid("towgs84", "")),
                    None => None,
                };
                Method::ObliqueMercator(Box::new(ObliqueMercator::new(
                    ellipsoid,
                    shift,
                    number("lat_0", 0.0)?,
                    number("lon_0", 0.0)?,
                    number("k_0", 1.0)?,
                    number("x_0", 0.0)?,
                    number("y_0", 0.0)?,
                )))
            }
            other => return Err(ProjectionError::UnsupportedMethod(other.to_string())),
        };

        let extent = match &method {
            Method::Mercator { radius } => {
                let h = PI * radius;
                Some(Extent::new(-h, -h, h, h))
            }
            Method::ObliqueMercator(_) => None,
        };

        Ok(Self {
            code: code.to_string(),
            method,
            extent,
        })
    }

    /// Identifier under which the projection is registered.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Valid extent, when the projection declares one.
    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    /// Resolution (units per pixel) at zoom level 0.
    pub fn max_resolution(&self) -> f64 {
        let size = self
            .extent
            .map(|e| e.width().max(e.height()))
            .unwrap_or(2.0 * PI * NORMAL_SPHERE_RADIUS);
        size / TILE_SIZE
    }

    /// Projects a WGS84 position into this projection.
    pub fn from_lon_lat(&self, p: LonLat) -> Coordinate {
        match &self.method {
            Method::Mercator { radius } => {
                let lat = p.lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
                Coordinate::new(
                    radius * p.lon.to_radians(),
                    radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
                )
            }
            Method::ObliqueMercator(m) => m.from_lon_lat(p),
        }
    }

    /// Converts a coordinate of this projection back to WGS84.
    pub fn to_lon_lat(&self, c: Coordinate) -> LonLat {
        match &self.method {
            Method::Mercator { radius } => LonLat::new(
                (c.x / radius).to_degrees(),
                (2.0 * (c.y / radius).exp().atan() - FRAC_PI_2).to_degrees(),
            ),
            Method::ObliqueMercator(m) => m.to_lon_lat(c),
        }
    }

    /// Whether coordinates of both projections are interchangeable without transform.
    pub fn is_equivalent(&self, other: &Projection) -> bool {
        self.code == other.code || self.method == other.method
    }
}

/// Transforms a coordinate between two projections through WGS84.
pub fn transform(c: Coordinate, from: &Projection, to: &Projection) -> Coordinate {
    if from.is_equivalent(to) {
        return c;
    }
    to.from_lon_lat(from.to_lon_lat(c))
}

/// Projections known to a map, addressed by identifier.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRegistry {
    projections: HashMap<String, Projection>,
}

impl ProjectionRegistry {
    /// A registry that knows the web Mercator projection.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        let mercator = Projection::web_mercator();
        registry
            .projections
            .insert(mercator.code().to_string(), mercator);
        registry
    }

    /// Parses and registers a projection definition, replacing any previous one.
    pub fn register(&mut self, code: &str, definition: &str) -> Result<&Projection, ProjectionError> {
        let projection = Projection::from_definition(code, definition)?;
        log::debug!("registered projection {code}");
        self.projections.insert(code.to_string(), projection);
        self.get(code)
    }

    /// Looks up a projection by identifier.
    pub fn get(&self, code: &str) -> Result<&Projection, ProjectionError> {
        self.projections
            .get(code)
            .ok_or_else(|| ProjectionError::Unknown(code.to_string()))
    }
}

/// Splits `+key=value +flag` tokens into a map; flags map to `None`.
fn parse_parameters(definition: &str) -> HashMap<String, Option<String>> {
    definition
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('+'))
        .map(|token| match token.split_once('=') {
            Some((k, v)) => (k.to_string(), Some(v.to_string())),
            None => (token.to_string(), None),
        })
        .collect()
}

fn invalid(name: &str, value: &str) -> ProjectionError {
    ProjectionError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}
