//! Raster tile source, tile selection and the texture cache.
//!
//! Tiles follow the XYZ scheme of public web map services: web Mercator, 256-pixel
//! tiles, origin at the top-left corner of the world square. Fetching runs off the UI
//! thread (a worker thread natively, `fetch` in the browser); decoded images come back
//! through an inbox that the UI thread drains once per frame.

use crate::constants::{
    MAX_TILES_PER_FRAME, OSM_ATTRIBUTION, OSM_TILE_URL, TILE_MAX_ZOOM, TILE_SIZE,
    WEB_MERCATOR_HALF_WORLD,
};
use crate::projection::{transform, Projection};
use crate::types::{Coordinate, Extent};
use eframe::egui;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised while loading a tile.
#[derive(Debug, Error)]
pub enum TileError {
    /// The request could not be sent or completed
    #[error("request failed: {0}")]
    Http(String),
    /// The server answered with a non-success status
    #[error("server answered with status {0}")]
    Status(u16),
    /// Reading the response body failed
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
    /// The body is not a decodable image
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Address of one tile in the XYZ grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column, counted from the west
    pub x: u32,
    /// Row, counted from the north
    pub y: u32,
}

impl TileCoord {
    /// Web Mercator edge length of tiles at zoom `z`.
    fn span(z: u32) -> f64 {
        2.0 * WEB_MERCATOR_HALF_WORLD / f64::from(1u32 << z)
    }

    /// Area covered by the tile in web Mercator meters.
    pub fn extent(&self) -> Extent {
        let span = Self::span(self.z);
        let min_x = -WEB_MERCATOR_HALF_WORLD + f64::from(self.x) * span;
        let max_y = WEB_MERCATOR_HALF_WORLD - f64::from(self.y) * span;
        Extent::new(min_x, max_y - span, min_x + span, max_y)
    }
}

/// An XYZ raster tile service.
#[derive(Debug, Clone)]
pub struct TileSource {
    url_template: String,
    attribution: String,
    projection: Projection,
    max_zoom: u32,
}

impl TileSource {
    /// The public OpenStreetMap tile service.
    pub fn osm() -> Self {
        Self::xyz(OSM_TILE_URL, OSM_ATTRIBUTION)
    }

    /// A service with a `{z}/{x}/{y}` URL template.
    pub fn xyz(url_template: &str, attribution: &str) -> Self {
        Self {
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
            projection: Projection::web_mercator(),
            max_zoom: TILE_MAX_ZOOM,
        }
    }

    /// Native projection of the tiles.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Attribution text to show with the tiles.
    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    /// URL of one tile.
    pub fn url(&self, tile: TileCoord) -> String {
        self.url_template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    /// Zoom level whose tile resolution is closest to `resolution` (source units per pixel).
    pub fn zoom_for_resolution(&self, resolution: f64) -> u32 {
        let max_resolution = 2.0 * WEB_MERCATOR_HALF_WORLD / TILE_SIZE;
        let z = (max_resolution / resolution).log2().round();
        if z.is_finite() {
            z.clamp(0.0, f64::from(self.max_zoom)) as u32
        } else {
            0
        }
    }

    /// Tiles at zoom `z` intersecting `extent` (source projection), row by row.
    pub fn tiles_in_extent(&self, extent: &Extent, z: u32) -> Vec<TileCoord> {
        let span = TileCoord::span(z);
        let last = (1u32 << z) - 1;
        let column = |x: f64| (((x + WEB_MERCATOR_HALF_WORLD) / span).floor().max(0.0) as u32).min(last);
        let row = |y: f64| (((WEB_MERCATOR_HALF_WORLD - y) / span).floor().max(0.0) as u32).min(last);
        let (x0, x1) = (column(extent.min_x), column(extent.max_x));
        let (y0, y1) = (row(extent.max_y), row(extent.min_y));
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| TileCoord { z, x, y }))
            .collect()
    }
}

/// Tiles needed to cover a view.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    /// Tile zoom level
    pub z: u32,
    /// Tiles to draw
    pub tiles: Vec<TileCoord>,
}

/// Picks the tiles covering a view of `view_extent` (view projection) drawn at
/// `size` pixels. Returns `None` when the view does not overlap the source.
pub fn plan_tiles(
    source: &TileSource,
    view_projection: &Projection,
    view_extent: &Extent,
    size: egui::Vec2,
) -> Option<TilePlan> {
    const SAMPLES: usize = 5;
    let samples = (0..SAMPLES).flat_map(|i| {
        (0..SAMPLES).map(move |j| {
            let fx = i as f64 / (SAMPLES - 1) as f64;
            let fy = j as f64 / (SAMPLES - 1) as f64;
            Coordinate::new(
                view_extent.min_x + fx * view_extent.width(),
                view_extent.min_y + fy * view_extent.height(),
            )
        })
    });
    let h = WEB_MERCATOR_HALF_WORLD;
    let in_source = Extent::bounding(
        samples
            .map(|c| transform(c, view_projection, source.projection()))
            .filter(|c| c.x.is_finite() && c.y.is_finite())
            .map(|c| Coordinate::new(c.x.clamp(-h, h), c.y.clamp(-h, h))),
    )?;
    if in_source.width() <= 0.0 || in_source.height() <= 0.0 || size.x <= 0.0 {
        return None;
    }

    let resolution = in_source.width() / f64::from(size.x);
    let mut z = source.zoom_for_resolution(resolution);
    loop {
        let tiles = source.tiles_in_extent(&in_source, z);
        if tiles.len() <= MAX_TILES_PER_FRAME || z == 0 {
            return Some(TilePlan { z, tiles });
        }
        z -= 1;
    }
}

type Inbox = Arc<Mutex<Vec<(TileCoord, Result<egui::ColorImage, TileError>)>>>;

/// Tile textures, keyed by tile address, with in-flight and failed bookkeeping.
pub struct TileCache {
    textures: LruCache<TileCoord, egui::TextureHandle>,
    pending: HashSet<TileCoord>,
    failed: HashSet<TileCoord>,
    inbox: Inbox,
}

impl TileCache {
    /// Creates a cache keeping at most `capacity` textures.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            textures: LruCache::new(capacity),
            pending: HashSet::new(),
            failed: HashSet::new(),
            inbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Uploads finished downloads as textures. Call once per frame on the UI thread.
    pub fn poll(&mut self, ctx: &egui::Context) {
        let finished = match self.inbox.lock() {
            Ok(mut inbox) => std::mem::take(&mut *inbox),
            Err(_) => return,
        };
        for (tile, result) in finished {
            self.pending.remove(&tile);
            match result {
                Ok(image) => {
                    let name = format!("tile-{}-{}-{}", tile.z, tile.x, tile.y);
                    let texture = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
                    self.textures.put(tile, texture);
                }
                Err(err) => {
                    log::warn!("tile {}/{}/{} unavailable: {err}", tile.z, tile.x, tile.y);
                    self.failed.insert(tile);
                }
            }
        }
    }

    /// Texture of a loaded tile.
    pub fn texture(&mut self, tile: TileCoord) -> Option<egui::TextureId> {
        self.textures.get(&tile).map(|t| t.id())
    }

    /// Starts loading a tile unless it is cached, in flight or known to fail.
    pub fn request(&mut self, ctx: &egui::Context, source: &TileSource, tile: TileCoord) {
        if self.textures.contains(&tile) || self.pending.contains(&tile) || self.failed.contains(&tile) {
            return;
        }
        self.pending.insert(tile);
        let url = source.url(tile);
        log::debug!("requesting tile {url}");

        let inbox = Arc::clone(&self.inbox);
        let ctx = ctx.clone();
        spawn_fetch(url, move |result| {
            let decoded = result.and_then(|bytes| decode_image(&bytes));
            if let Ok(mut inbox) = inbox.lock() {
                inbox.push((tile, decoded));
            }
            ctx.request_repaint();
        });
    }

    /// Number of tiles currently being fetched.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Decodes PNG bytes into an egui image.
pub fn decode_image(bytes: &[u8]) -> Result<egui::ColorImage, TileError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_fetch(url: String, done: impl FnOnce(Result<Vec<u8>, TileError>) + Send + 'static) {
    std::thread::spawn(move || done(fetch_blocking(&url)));
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_blocking(url: &str) -> Result<Vec<u8>, TileError> {
    use crate::constants::{TILE_TIMEOUT_SECS, USER_AGENT};
    use std::io::Read;

    let response = ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .timeout(std::time::Duration::from_secs(TILE_TIMEOUT_SECS))
        .call()
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => TileError::Status(code),
            other => TileError::Http(other.to_string()),
        })?;
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(target_arch = "wasm32")]
fn spawn_fetch(url: String, done: impl FnOnce(Result<Vec<u8>, TileError>) + 'static) {
    wasm_bindgen_futures::spawn_local(async move {
        done(fetch_browser(&url).await);
    });
}

#[cfg(target_arch = "wasm32")]
async fn fetch_browser(url: &str) -> Result<Vec<u8>, TileError> {
    use wasm_bindgen::JsCast;

    let js_err = |e: wasm_bindgen::JsValue| TileError::Http(format!("{e:?}"));
    let opts = web_sys::RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(web_sys::RequestMode::Cors);
    let request = web_sys::Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
    let window = web_sys::window().ok_or_else(|| TileError::Http("no window".to_string()))?;
    let response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_err)?;
    if !response.ok() {
        return Err(TileError::Status(response.status()));
    }
    let buffer = wasm_bindgen_futures::JsFuture::from(response.array_buffer().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SWISS_PROJECTION_CODE, SWISS_PROJECTION_DEF};

    #[test]
    fn url_template_is_filled() {
        let source = TileSource::osm();
        assert_eq!(
            source.url(TileCoord { z: 7, x: 66, y: 45 }),
            "https://tile.openstreetmap.org/7/66/45.png"
        );
    }

    #[test]
    fn tile_extents_tile_the_world() {
        let root = TileCoord { z: 0, x: 0, y: 0 }.extent();
        assert!((root.width() - 2.0 * WEB_MERCATOR_HALF_WORLD).abs() < 1e-6);
        let nw = TileCoord { z: 1, x: 0, y: 0 }.extent();
        assert_eq!(nw.max_y, WEB_MERCATOR_HALF_WORLD);
        assert!(nw.min_x == -WEB_MERCATOR_HALF_WORLD && nw.max_x.abs() < 1e-6);
    }

    #[test]
    fn zoom_follows_resolution() {
        let source = TileSource::osm();
        assert_eq!(source.zoom_for_resolution(156_543.033_928), 0);
        assert_eq!(source.zoom_for_resolution(611.5), 8);
        assert_eq!(source.zoom_for_resolution(0.001), TILE_MAX_ZOOM);
    }

    #[test]
    fn tiles_in_extent_covers_rows_and_columns() {
        let source = TileSource::osm();
        let tiles = source.tiles_in_extent(&Extent::new(-1.0, -1.0, 1.0, 1.0), 1);
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[0], TileCoord { z: 1, x: 0, y: 0 });
        assert_eq!(tiles[3], TileCoord { z: 1, x: 1, y: 1 });
    }

    #[test]
    fn swiss_view_plans_tiles_over_switzerland() {
        let swiss = Projection::from_definition(SWISS_PROJECTION_CODE, SWISS_PROJECTION_DEF)
            .expect("parses");
        let extent = Extent::new(480_000.0, 70_000.0, 840_000.0, 300_000.0);
        let plan = plan_tiles(&TileSource::osm(), &swiss, &extent, egui::vec2(600.0, 400.0))
            .expect("overlaps");
        assert!(plan.z >= 6 && plan.z <= 9, "z = {}", plan.z);
        assert!(!plan.tiles.is_empty() && plan.tiles.len() <= MAX_TILES_PER_FRAME);
        // Bern lies at about 7.44E 46.95N
        let bern_x = ((7.44 + 180.0) / 360.0 * f64::from(1u32 << plan.z)) as u32;
        assert!(plan.tiles.iter().any(|t| t.x == bern_x));
    }

    #[test]
    fn finished_downloads_become_textures_and_failures_stick() {
        let ctx = egui::Context::default();
        let source = TileSource::osm();
        let mut cache = TileCache::new(4);
        let loaded = TileCoord { z: 3, x: 4, y: 2 };
        let missing = TileCoord { z: 3, x: 5, y: 2 };
        cache.pending.extend([loaded, missing]);
        {
            let mut inbox = cache.inbox.lock().unwrap();
            let red = egui::ColorImage::from_rgba_unmultiplied([1, 1], &[255, 0, 0, 255]);
            inbox.push((loaded, Ok(red)));
            inbox.push((missing, Err(TileError::Status(404))));
        }
        cache.poll(&ctx);

        assert!(cache.texture(loaded).is_some());
        assert!(cache.texture(missing).is_none());
        assert_eq!(cache.pending_count(), 0);

        // neither a cached nor a failed tile is fetched again
        cache.request(&ctx, &source, loaded);
        cache.request(&ctx, &source, missing);
        assert_eq!(cache.pending_count(), 0);
    }

    #[test]
    fn image_decoding_rejects_garbage() {
        assert!(matches!(decode_image(b"not a png"), Err(TileError::Decode(_))));
    }
}
