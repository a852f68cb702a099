//! Shared application-wide constants.
//! Centralizes tweakable values used across the map engine, rendering and interactions.

// Projections
/// Identifier of the Swiss LV03 projected coordinate system.
pub const SWISS_PROJECTION_CODE: &str = "EPSG:21781";
/// Parameter string for [`SWISS_PROJECTION_CODE`] (Swiss oblique Mercator on Bessel 1841).
pub const SWISS_PROJECTION_DEF: &str = "+proj=somerc +lat_0=46.95240555555556 \
     +lon_0=7.439583333333333 +k_0=1 +x_0=600000 +y_0=200000 +ellps=bessel \
     +towgs84=660.077,13.551,369.344,2.484,1.783,2.939,5.66 +units=m +no_defs";
/// Identifier of the spherical web Mercator projection used by public tile services.
pub const WEB_MERCATOR_CODE: &str = "EPSG:3857";
/// Sphere radius used by web Mercator (meters).
pub const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;
/// Half the width of the web Mercator world square (meters).
pub const WEB_MERCATOR_HALF_WORLD: f64 = 20_037_508.342_789_244;
/// Latitude limit of the web Mercator square (degrees).
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;
/// Radius of the normal sphere used to size views of projections without an extent.
pub const NORMAL_SPHERE_RADIUS: f64 = 6_370_997.0;

// View
/// Initial zoom of the Swiss map variant.
pub const SWISS_START_ZOOM: f64 = 8.0;
/// Initial zoom of the web Mercator map variant.
pub const WEB_START_ZOOM: f64 = 8.0;
/// Lowest zoom level a gesture can reach.
pub const MIN_ZOOM: f64 = 0.0;
/// Highest zoom level a gesture can reach.
pub const MAX_ZOOM: f64 = 28.0;
/// Zoom change for one mouse-wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 0.25;
/// Zoom change for a double click, zoom button or `+`/`-` key.
pub const BUTTON_ZOOM_STEP: f64 = 1.0;

// Tiles
/// Edge length of a raster tile in pixels.
pub const TILE_SIZE: f64 = 256.0;
/// Tile URL template of the public OpenStreetMap service.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
/// Attribution shown for OpenStreetMap tiles.
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
/// Highest zoom level served by the tile source.
pub const TILE_MAX_ZOOM: u32 = 19;
/// Number of tile textures kept in memory.
pub const TILE_CACHE_CAPACITY: usize = 300;
/// Upper bound on tiles requested for a single frame.
pub const MAX_TILES_PER_FRAME: usize = 96;
/// Grid subdivisions per tile edge when warping tiles into another projection.
pub const REPROJECTION_DIVISIONS: usize = 8;
/// User agent sent with native tile requests.
pub const USER_AGENT: &str = concat!("geoinfo-map/", env!("CARGO_PKG_VERSION"));
/// Timeout for a single native tile request (seconds).
pub const TILE_TIMEOUT_SECS: u64 = 10;

// Markers
/// Name of the marker icon asset.
pub const MARKER_ICON_SRC: &str = "arrow_down.png";
/// Native pixel size of the marker icon.
pub const MARKER_ICON_SIZE: [f32; 2] = [48.0, 48.0];
/// Horizontal icon anchor as a fraction of the icon width.
pub const MARKER_ANCHOR_X_FRACTION: f32 = 0.5;
/// Vertical icon anchor in icon pixels from the top.
pub const MARKER_ANCHOR_Y_PIXELS: f32 = 46.0;
/// Scale applied to the icon when drawn.
pub const MARKER_ICON_SCALE: f32 = 0.25;

// Popover
/// Gap between the popover arrow tip and the anchor (screen pixels).
pub const POPOVER_OFFSET: f32 = 8.0;
/// Maximum popover body width (screen pixels).
pub const POPOVER_MAX_WIDTH: f32 = 276.0;
