use macroquad::prelude::*;

use crate::layer::Layer;
use crate::spatial::{MapGeometry, Orientation, TileCoord};

/// Debug drawing toggles and colors of one layer.
///
/// Created explicitly through [`Layer::ensure_debug_overlay`].
#[derive(Debug, Clone, PartialEq)]
pub struct DebugOverlay {
    pub show_grid: bool,
    pub show_bounds: bool,
    pub grid_color: Color,
    pub frame_color: Color,
    pub highlight_color: Color,
    pub grid_opacity: f32,
    pub line_width: f32,
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self {
            show_grid: false,
            show_bounds: false,
            grid_color: BLACK,
            frame_color: BLACK,
            highlight_color: WHITE,
            grid_opacity: 0.2,
            line_width: 1.0,
        }
    }
}

impl DebugOverlay {
    /// Grid and bounds both shown.
    pub fn debug_draw(&self) -> bool {
        self.show_grid && self.show_bounds
    }

    pub fn set_debug_draw(&mut self, on: bool) {
        self.show_grid = on;
        self.show_bounds = on;
    }
}

/// Outline of the whole map in screen space, as a closed polygon.
///
/// Isometric maps give a diamond; every other orientation a rectangle.
pub fn bounds_polygon(geometry: &MapGeometry) -> Vec<Vec2> {
    match geometry.orientation() {
        Orientation::Isometric => {
            let th = geometry.tile_height() as f32;
            let w = geometry.columns() as f32 * th;
            let h = geometry.rows() as f32 * th;
            [vec2(0.0, 0.0), vec2(w, 0.0), vec2(w, h), vec2(0.0, h)]
                .into_iter()
                .map(|p| geometry.pixel_to_screen(p))
                .collect()
        }
        _ => {
            let size = geometry.size_in_points();
            vec![
                vec2(0.0, 0.0),
                vec2(size.x, 0.0),
                vec2(size.x, size.y),
                vec2(0.0, size.y),
            ]
        }
    }
}

/// Outline of one tile in screen space, as a closed polygon.
pub fn tile_outline(geometry: &MapGeometry, coord: TileCoord) -> Vec<Vec2> {
    let origin = geometry.tile_to_screen(coord);
    let tw = geometry.tile_width() as f32;
    let th = geometry.tile_height() as f32;
    let points = match geometry.orientation() {
        Orientation::Orthogonal => vec![
            vec2(0.0, 0.0),
            vec2(tw, 0.0),
            vec2(tw, th),
            vec2(0.0, th),
        ],
        // origin is the top corner of the diamond
        Orientation::Isometric => vec![
            vec2(0.0, 0.0),
            vec2(tw / 2.0, th / 2.0),
            vec2(0.0, th),
            vec2(-tw / 2.0, th / 2.0),
        ],
        Orientation::Staggered => vec![
            vec2(tw / 2.0, 0.0),
            vec2(tw, th / 2.0),
            vec2(tw / 2.0, th),
            vec2(0.0, th / 2.0),
        ],
        Orientation::Hexagonal if geometry.stagger_x() => {
            let off = geometry.side_offset_x() as f32;
            let len = geometry.side_length_x() as f32;
            vec![
                vec2(0.0, th / 2.0),
                vec2(off, 0.0),
                vec2(off + len, 0.0),
                vec2(tw, th / 2.0),
                vec2(off + len, th),
                vec2(off, th),
            ]
        }
        Orientation::Hexagonal => {
            let off = geometry.side_offset_y() as f32;
            let len = geometry.side_length_y() as f32;
            vec![
                vec2(tw / 2.0, 0.0),
                vec2(tw, off),
                vec2(tw, off + len),
                vec2(tw / 2.0, th),
                vec2(0.0, off + len),
                vec2(0.0, off),
            ]
        }
    };
    points.into_iter().map(|p| origin + p).collect()
}

/// Line segments of the map grid in screen space.
pub fn grid_segments(geometry: &MapGeometry) -> Vec<(Vec2, Vec2)> {
    let (cols, rows) = (geometry.columns() as i32, geometry.rows() as i32);
    match geometry.orientation() {
        Orientation::Orthogonal | Orientation::Isometric => {
            let mut out = Vec::with_capacity((cols + rows + 2) as usize);
            for x in 0..=cols {
                out.push((
                    geometry.tile_to_screen(TileCoord::new(x, 0)),
                    geometry.tile_to_screen(TileCoord::new(x, rows)),
                ));
            }
            for y in 0..=rows {
                out.push((
                    geometry.tile_to_screen(TileCoord::new(0, y)),
                    geometry.tile_to_screen(TileCoord::new(cols, y)),
                ));
            }
            out
        }
        // staggered cells do not share straight grid lines; outline each one
        Orientation::Staggered | Orientation::Hexagonal => {
            let mut out = Vec::new();
            for y in 0..rows {
                for x in 0..cols {
                    out.extend(closed_edges(&tile_outline(geometry, TileCoord::new(x, y))));
                }
            }
            out
        }
    }
}

fn closed_edges(points: &[Vec2]) -> Vec<(Vec2, Vec2)> {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
        .collect()
}

fn stroke(points: &[Vec2], offset: Vec2, thickness: f32, color: Color) {
    for (a, b) in closed_edges(points) {
        let (a, b) = (a + offset, b + offset);
        draw_line(a.x, a.y, b.x, b.y, thickness, color);
    }
}

/// Draw a layer's debug overlay. Must run inside a macroquad frame.
///
/// Does nothing for hidden layers or layers without an overlay.
pub fn draw_layer_debug(layer: &Layer) {
    let Some(overlay) = layer.debug_overlay() else {
        return;
    };
    if !layer.visible() {
        return;
    }
    let geometry = layer.geometry();
    let offset = layer.offset();
    let width = overlay.line_width;

    if overlay.show_grid {
        let mut color = overlay.grid_color;
        color.a *= overlay.grid_opacity * layer.opacity();
        for (a, b) in grid_segments(geometry) {
            let (a, b) = (a + offset, b + offset);
            draw_line(a.x, a.y, b.x, b.y, width, color);
        }
    }
    if overlay.show_bounds {
        stroke(&bounds_polygon(geometry), offset, width, overlay.frame_color);
    }
    if let Some(tiles) = layer.as_tiles() {
        for tile in tiles.tiles().into_iter().filter(|t| t.highlighted) {
            stroke(
                &tile_outline(geometry, tile.coord()),
                offset,
                width * 2.0,
                overlay.highlight_color,
            );
        }
    }
}
