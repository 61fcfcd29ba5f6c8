use macroquad::prelude::*;

use crate::layer::{Layer, Tile};
use crate::spatial::{MapGeometry, TileCoord};

/// Extra tiles kept around the visible rectangle. Staggered and hexagonal
/// cells overhang their reference cell, so one is not always enough.
const CULL_MARGIN_TILES: i32 = 2;

/// Screen-space rectangle seen through a camera.
pub fn camera_bounds(cam: &Camera2D) -> (Vec2, Vec2) {
    let (viewport_width, viewport_height) = match cam.viewport {
        Some((_, _, w, h)) => (w as f32, h as f32),
        None => (screen_width(), screen_height()),
    };
    let half_w = viewport_width / cam.zoom.x / 2.0;
    let half_h = viewport_height / cam.zoom.y / 2.0;
    let half = vec2(half_w.abs(), half_h.abs());
    (cam.target - half, cam.target + half)
}

/// Inclusive tile range covering a screen rectangle, padded by a margin.
///
/// The corners may be given in any order.
pub fn visible_tile_range(
    geometry: &MapGeometry,
    view_min: Vec2,
    view_max: Vec2,
) -> (TileCoord, TileCoord) {
    let corners = [
        vec2(view_min.x, view_min.y),
        vec2(view_max.x, view_min.y),
        vec2(view_min.x, view_max.y),
        vec2(view_max.x, view_max.y),
    ]
    .map(|p| geometry.screen_to_tile(p));

    let mut min = corners[0];
    let mut max = corners[0];
    for c in &corners[1..] {
        min = TileCoord::new(min.x.min(c.x), min.y.min(c.y));
        max = TileCoord::new(max.x.max(c.x), max.y.max(c.y));
    }
    (
        TileCoord::new(min.x - CULL_MARGIN_TILES, min.y - CULL_MARGIN_TILES),
        TileCoord::new(max.x + CULL_MARGIN_TILES, max.y + CULL_MARGIN_TILES),
    )
}

/// Tiles of a layer that may be visible in the screen rectangle, row-major.
///
/// The layer offset is taken into account. Works for finite and chunked
/// layers; other layer kinds yield nothing.
pub fn visible_tiles<'a>(layer: &'a Layer, view_min: Vec2, view_max: Vec2) -> Vec<&'a Tile> {
    let Some(tiles) = layer.as_tiles() else {
        return Vec::new();
    };
    let offset = layer.offset();
    let (min, max) = visible_tile_range(layer.geometry(), view_min - offset, view_max - offset);
    let in_range = |c: TileCoord| c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y;

    if let Some(grid) = tiles.grid() {
        let x0 = min.x.max(0);
        let y0 = min.y.max(0);
        let x1 = max.x.min(grid.columns() as i32 - 1);
        let y1 = max.y.min(grid.rows() as i32 - 1);
        let mut out = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Ok(Some(tile)) = grid.get(x, y) {
                    out.push(tile);
                }
            }
        }
        return out;
    }

    let mut out: Vec<&Tile> = Vec::new();
    for chunk in tiles.chunks() {
        let o = chunk.origin();
        let far = TileCoord::new(o.x + chunk.width() as i32 - 1, o.y + chunk.height() as i32 - 1);
        if far.x < min.x || o.x > max.x || far.y < min.y || o.y > max.y {
            continue;
        }
        out.extend(chunk.grid().values().filter(|t| in_range(t.coord())));
    }
    out.sort_by_key(|t| (t.coord().y, t.coord().x));
    out
}
