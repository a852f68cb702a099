//! Drawing the map: base tiles, markers, controls and the popover.
//!
//! Layers are painted in stack order, so later markers end up on top, which is
//! the same order the hit test walks in reverse.

use super::markup;
use super::state::GeoInfoApp;
use crate::constants::{
    BUTTON_ZOOM_STEP, POPOVER_MAX_WIDTH, POPOVER_OFFSET, REPROJECTION_DIVISIONS,
};
use crate::map::{plan_tiles, Layer, MapController, TileCache, TileCoord, TileLayer, VectorLayer};
use crate::popover::Placement;
use crate::projection::{transform, Projection};
use crate::types::Coordinate;
use eframe::egui;
use eframe::epaint::{Mesh, Vertex};

/// Size of the tip drawn between a popover and its anchor.
const POPOVER_TIP_SIZE: egui::Vec2 = egui::vec2(12.0, 6.0);

impl GeoInfoApp {
    /// Renders every layer of the map into `canvas_rect`.
    pub fn render_map_layers(&mut self, ctx: &egui::Context, painter: &egui::Painter, canvas_rect: egui::Rect) {
        painter.rect_filled(canvas_rect, 0.0, ctx.style().visuals.extreme_bg_color);

        let map = self.session.map();
        for layer in map.layers() {
            match layer {
                Layer::Tile(tiles) => {
                    draw_tile_layer(&mut self.tiles, ctx, painter, canvas_rect, map, tiles)
                }
                Layer::Vector(markers) => {
                    draw_vector_layer(self.icon.as_ref(), painter, canvas_rect, map, markers)
                }
            }
        }
    }

    /// Draws the zoom buttons in the top-left corner.
    ///
    /// Returns the zoom change requested this frame.
    pub fn draw_zoom_controls(&self, ctx: &egui::Context, canvas_rect: egui::Rect) -> f64 {
        let mut delta = 0.0;
        egui::Area::new(egui::Id::new("zoom_controls"))
            .order(egui::Order::Middle)
            .fixed_pos(canvas_rect.min + egui::vec2(8.0, 8.0))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    let size = egui::vec2(24.0, 24.0);
                    if ui
                        .add_sized(size, egui::Button::new("+"))
                        .on_hover_text("Zoom in")
                        .clicked()
                    {
                        delta += BUTTON_ZOOM_STEP;
                    }
                    if ui
                        .add_sized(size, egui::Button::new("−"))
                        .on_hover_text("Zoom out")
                        .clicked()
                    {
                        delta -= BUTTON_ZOOM_STEP;
                    }
                });
            });
        delta
    }

    /// Writes the attribution of every tile layer in the bottom-right corner.
    pub fn draw_attribution(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let text = self
            .session
            .map()
            .layers()
            .iter()
            .filter_map(|layer| match layer {
                Layer::Tile(tiles) if !tiles.source().attribution().is_empty() => {
                    Some(tiles.source().attribution())
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" | ");
        if text.is_empty() {
            return;
        }

        let style = painter.ctx().style();
        let visuals = &style.visuals;
        let galley = painter.layout_no_wrap(
            text,
            egui::FontId::proportional(11.0),
            visuals.text_color(),
        );
        let rect = egui::Align2::RIGHT_BOTTOM
            .anchor_size(canvas_rect.right_bottom(), galley.size())
            .expand(3.0);
        painter.rect_filled(rect, 2.0, visuals.window_fill.gamma_multiply(0.8));
        painter.galley(rect.min + egui::vec2(3.0, 3.0), galley, visuals.text_color());
    }

    /// Shows the open popover above its anchor.
    pub fn draw_popover(&self, ctx: &egui::Context, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let presenter = self.session.popover();
        let (Some(popover), Some(anchor)) = (presenter.popover(), presenter.anchor()) else {
            return;
        };
        let anchor_pos = Self::container_to_screen(canvas_rect, self.session.map().pixel_from_coordinate(anchor));
        if !canvas_rect.contains(anchor_pos) {
            return;
        }

        let overlay = presenter.overlay();
        let placement = popover.options().placement;
        let direction = placement.direction();
        let tip = overlay
            .positioning()
            .pivot()
            .anchor_size(anchor_pos + direction * POPOVER_OFFSET, POPOVER_TIP_SIZE);
        // The popover frame starts where the tip ends
        let popover_pos = tip.center() + direction * POPOVER_TIP_SIZE * 0.5;

        let visuals = ctx.style().visuals.clone();
        let tip_shape = match placement {
            Placement::Top => vec![tip.left_top(), tip.right_top(), tip.center_bottom()],
            Placement::Bottom => vec![tip.left_bottom(), tip.right_bottom(), tip.center_top()],
            Placement::Left => vec![tip.left_top(), tip.left_bottom(), tip.right_center()],
            Placement::Right => vec![tip.right_top(), tip.right_bottom(), tip.left_center()],
        };
        painter.add(egui::Shape::convex_polygon(
            tip_shape,
            visuals.window_fill,
            visuals.window_stroke,
        ));

        let font_id = egui::TextStyle::Body.resolve(&ctx.style());
        let job = markup::popover_layout(popover.content(), font_id, visuals.dark_mode);
        egui::Area::new(egui::Id::new("popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(popover_pos)
            .pivot(placement.pivot())
            .interactable(overlay.stops_events())
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(POPOVER_MAX_WIDTH);
                    ui.label(job);
                });
            });
    }
}

/// Draws the loaded tiles covering the view and requests the missing ones.
fn draw_tile_layer(
    cache: &mut TileCache,
    ctx: &egui::Context,
    painter: &egui::Painter,
    canvas_rect: egui::Rect,
    map: &MapController,
    layer: &TileLayer,
) {
    let view = map.view();
    let Some(plan) = plan_tiles(
        layer.source(),
        view.projection(),
        &view.extent(map.size()),
        map.size(),
    ) else {
        return;
    };

    let divisions = if layer.needs_reprojection() {
        REPROJECTION_DIVISIONS
    } else {
        1
    };
    let to_screen = |c: Coordinate| GeoInfoApp::container_to_screen(canvas_rect, map.pixel_from_coordinate(c));
    for tile in plan.tiles {
        let Some(texture) = cache.texture(tile) else {
            cache.request(ctx, layer.source(), tile);
            continue;
        };
        let mesh = tile_mesh(
            tile,
            texture,
            divisions,
            layer.source().projection(),
            view.projection(),
            to_screen,
        );
        if let Some(mesh) = mesh {
            painter.add(egui::Shape::mesh(mesh));
        }
    }
}

/// Draws every marker icon at its anchor pixel.
fn draw_vector_layer(
    icon: Option<&egui::TextureHandle>,
    painter: &egui::Painter,
    canvas_rect: egui::Rect,
    map: &MapController,
    layer: &VectorLayer,
) {
    for marker in layer.markers() {
        let anchor = GeoInfoApp::container_to_screen(canvas_rect, map.pixel_from_coordinate(marker.coordinate()));
        let icon_rect = layer.style().icon_rect(anchor);
        if !canvas_rect.intersects(icon_rect) {
            continue;
        }
        match icon {
            Some(icon) => {
                painter.image(
                    icon.id(),
                    icon_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => draw_fallback_marker(painter, icon_rect),
        }
    }
}

/// Builds a textured mesh for one tile, warped from the tile's projection into the
/// view's on a `divisions` x `divisions` grid. Returns `None` if any grid point
/// cannot be placed on screen.
fn tile_mesh(
    tile: TileCoord,
    texture: egui::TextureId,
    divisions: usize,
    source: &Projection,
    view: &Projection,
    to_screen: impl Fn(Coordinate) -> egui::Pos2,
) -> Option<Mesh> {
    let extent = tile.extent();
    let mut mesh = Mesh::with_texture(texture);
    let n = divisions.max(1);
    for j in 0..=n {
        for i in 0..=n {
            let fx = i as f64 / n as f64;
            let fy = j as f64 / n as f64;
            let c = Coordinate::new(
                extent.min_x + fx * extent.width(),
                extent.max_y - fy * extent.height(),
            );
            let pos = to_screen(transform(c, source, view));
            if !pos.x.is_finite() || !pos.y.is_finite() {
                return None;
            }
            mesh.vertices.push(Vertex {
                pos,
                uv: egui::pos2(fx as f32, fy as f32),
                color: egui::Color32::WHITE,
            });
        }
    }
    let row = n as u32 + 1;
    for j in 0..n as u32 {
        for i in 0..n as u32 {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(b, d, c);
        }
    }
    Some(mesh)
}

/// Down-pointing triangle standing in for a missing icon image.
fn draw_fallback_marker(painter: &egui::Painter, icon_rect: egui::Rect) {
    let points = vec![
        icon_rect.left_top(),
        icon_rect.right_top(),
        icon_rect.center_bottom(),
    ];
    painter.add(egui::Shape::convex_polygon(
        points,
        egui::Color32::from_rgb(214, 39, 40),
        egui::Stroke::new(1.0, egui::Color32::from_gray(40)),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untransformed_tile_is_a_quad() {
        let tile = TileCoord { z: 1, x: 0, y: 0 };
        let merc = Projection::web_mercator();
        let mesh = tile_mesh(tile, egui::TextureId::default(), 1, &merc, &merc, |c| {
            egui::pos2((c.x / 1e5) as f32, (-c.y / 1e5) as f32)
        })
        .expect("mesh");
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.vertices[0].uv, egui::pos2(0.0, 0.0));
        assert_eq!(mesh.vertices[3].uv, egui::pos2(1.0, 1.0));
        assert!(mesh.vertices[0].pos.x < mesh.vertices[1].pos.x);
        assert!(mesh.vertices[0].pos.y < mesh.vertices[2].pos.y);
    }

    #[test]
    fn warped_tile_has_a_grid_of_vertices() {
        let tile = TileCoord { z: 8, x: 133, y: 90 };
        let merc = Projection::web_mercator();
        let mesh = tile_mesh(tile, egui::TextureId::default(), 4, &merc, &merc, |c| {
            egui::pos2(c.x as f32, c.y as f32)
        })
        .expect("mesh");
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.indices.len(), 4 * 4 * 6);
    }

    #[test]
    fn unplaceable_tile_is_skipped() {
        let tile = TileCoord { z: 0, x: 0, y: 0 };
        let merc = Projection::web_mercator();
        let mesh = tile_mesh(tile, egui::TextureId::default(), 2, &merc, &merc, |_| {
            egui::pos2(f32::NAN, 0.0)
        });
        assert!(mesh.is_none());
    }
}
