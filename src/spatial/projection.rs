//! Conversions between tile coordinates, map ("pixel") space and screen space.
//!
//! Map space is the orientation's native, unprojected space: for orthogonal,
//! hexagonal and staggered maps it is identical to screen space, for isometric
//! maps it is a square grid measured in tile-height units. Screen space is the
//! projected 2D space with y growing downwards; flipping y for a y-up renderer
//! is left to the caller.

use std::fmt;
use std::str::FromStr;

use macroquad::prelude::{vec2, Vec2};
use serde::Deserialize;

use crate::error::{MapError, Result};

/// Map projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Hexagonal,
    Staggered,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Orthogonal => "orthogonal",
            Orientation::Isometric => "isometric",
            Orientation::Hexagonal => "hexagonal",
            Orientation::Staggered => "staggered",
        }
    }
}

impl FromStr for Orientation {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "orthogonal" => Ok(Orientation::Orthogonal),
            "isometric" => Ok(Orientation::Isometric),
            "hexagonal" => Ok(Orientation::Hexagonal),
            "staggered" => Ok(Orientation::Staggered),
            _ => Err(MapError::InvalidMap(format!("unknown orientation '{s}'"))),
        }
    }
}

/// Axis along which hexagonal and staggered maps alternate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerAxis {
    X,
    #[default]
    Y,
}

impl FromStr for StaggerAxis {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" => Ok(StaggerAxis::X),
            "y" => Ok(StaggerAxis::Y),
            _ => Err(MapError::InvalidMap(format!("unknown stagger axis '{s}'"))),
        }
    }
}

/// Which lines along the stagger axis are shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerParity {
    #[default]
    Odd,
    Even,
}

impl FromStr for StaggerParity {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "odd" => Ok(StaggerParity::Odd),
            "even" => Ok(StaggerParity::Even),
            _ => Err(MapError::InvalidMap(format!("unknown stagger index '{s}'"))),
        }
    }
}

/// Tile coordinate: `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        TileCoord { x, y }
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        TileCoord { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Where inside a tile [`MapGeometry::tile_anchor`] should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileAnchor {
    #[default]
    Center,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
    Left,
    Right,
}

/// Size and projection of a map. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGeometry {
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    rows: u32,
    orientation: Orientation,
    stagger_axis: StaggerAxis,
    stagger_parity: StaggerParity,
    hex_side_length: u32,
}

impl MapGeometry {
    /// Fails if either tile dimension is zero.
    pub fn new(
        orientation: Orientation,
        columns: u32,
        rows: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(MapError::InvalidGeometry(format!(
                "tile size must be positive, got {tile_width}x{tile_height}"
            )));
        }
        Ok(Self {
            tile_width,
            tile_height,
            columns,
            rows,
            orientation,
            stagger_axis: StaggerAxis::default(),
            stagger_parity: StaggerParity::default(),
            hex_side_length: 0,
        })
    }

    pub fn with_stagger(mut self, axis: StaggerAxis, parity: StaggerParity) -> Self {
        self.stagger_axis = axis;
        self.stagger_parity = parity;
        self
    }

    pub fn with_hex_side_length(mut self, length: u32) -> Self {
        self.hex_side_length = length;
        self
    }

    #[inline] pub fn tile_width(&self) -> u32 { self.tile_width }
    #[inline] pub fn tile_height(&self) -> u32 { self.tile_height }
    #[inline] pub fn columns(&self) -> u32 { self.columns }
    #[inline] pub fn rows(&self) -> u32 { self.rows }
    #[inline] pub fn orientation(&self) -> Orientation { self.orientation }
    #[inline] pub fn stagger_axis(&self) -> StaggerAxis { self.stagger_axis }
    #[inline] pub fn stagger_parity(&self) -> StaggerParity { self.stagger_parity }
    #[inline] pub fn hex_side_length(&self) -> u32 { self.hex_side_length }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_width as f32, self.tile_height as f32)
    }

    /// Number of cells in a finite layer.
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    #[inline]
    fn tw(&self) -> f32 {
        self.tile_width as f32
    }

    #[inline]
    fn th(&self) -> f32 {
        self.tile_height as f32
    }

    #[inline]
    fn tile_width_half(&self) -> f32 {
        self.tw() / 2.0
    }

    #[inline]
    fn tile_height_half(&self) -> f32 {
        self.th() / 2.0
    }

    /// Screen x of the isometric origin (top corner of tile 0,0).
    #[inline]
    fn iso_origin_x(&self) -> f32 {
        self.rows as f32 * self.tile_width_half()
    }

    // Hexagonal/staggered layout values. Integer math on purpose: these are
    // the same truncated values Tiled uses when laying out tiles.

    #[inline]
    pub fn stagger_x(&self) -> bool {
        self.stagger_axis == StaggerAxis::X
    }

    #[inline]
    pub fn stagger_even(&self) -> bool {
        self.stagger_parity == StaggerParity::Even
    }

    pub fn side_length_x(&self) -> i32 {
        match self.orientation {
            Orientation::Hexagonal if self.stagger_x() => self.hex_side_length as i32,
            _ => 0,
        }
    }

    pub fn side_length_y(&self) -> i32 {
        match self.orientation {
            Orientation::Hexagonal if !self.stagger_x() => self.hex_side_length as i32,
            _ => 0,
        }
    }

    pub fn side_offset_x(&self) -> i32 {
        (self.tile_width as i32 - self.side_length_x()) / 2
    }

    pub fn side_offset_y(&self) -> i32 {
        (self.tile_height as i32 - self.side_length_y()) / 2
    }

    pub fn column_width(&self) -> i32 {
        self.side_offset_x() + self.side_length_x()
    }

    pub fn row_height(&self) -> i32 {
        self.side_offset_y() + self.side_length_y()
    }

    /// True if column `x` is shifted down.
    #[inline]
    pub fn do_stagger_x(&self, x: i32) -> bool {
        self.stagger_x() && ((x & 1) ^ self.stagger_even() as i32) != 0
    }

    /// True if row `y` is shifted right.
    #[inline]
    pub fn do_stagger_y(&self, y: i32) -> bool {
        !self.stagger_x() && ((y & 1) ^ self.stagger_even() as i32) != 0
    }

    #[inline]
    fn staggered_line(&self, x: i32, y: i32) -> bool {
        let i = if self.stagger_x() { x } else { y };
        ((i & 1) ^ self.stagger_even() as i32) != 0
    }

    pub fn top_left(&self, x: i32, y: i32) -> TileCoord {
        match (self.stagger_x(), self.staggered_line(x, y)) {
            (false, true) => TileCoord::new(x, y - 1),
            (false, false) => TileCoord::new(x - 1, y - 1),
            (true, true) => TileCoord::new(x - 1, y),
            (true, false) => TileCoord::new(x - 1, y - 1),
        }
    }

    pub fn top_right(&self, x: i32, y: i32) -> TileCoord {
        match (self.stagger_x(), self.staggered_line(x, y)) {
            (false, true) => TileCoord::new(x + 1, y - 1),
            (false, false) => TileCoord::new(x, y - 1),
            (true, true) => TileCoord::new(x + 1, y),
            (true, false) => TileCoord::new(x + 1, y - 1),
        }
    }

    pub fn bottom_left(&self, x: i32, y: i32) -> TileCoord {
        match (self.stagger_x(), self.staggered_line(x, y)) {
            (false, true) => TileCoord::new(x, y + 1),
            (false, false) => TileCoord::new(x - 1, y + 1),
            (true, true) => TileCoord::new(x - 1, y + 1),
            (true, false) => TileCoord::new(x - 1, y),
        }
    }

    pub fn bottom_right(&self, x: i32, y: i32) -> TileCoord {
        match (self.stagger_x(), self.staggered_line(x, y)) {
            (false, true) => TileCoord::new(x + 1, y + 1),
            (false, false) => TileCoord::new(x, y + 1),
            (true, true) => TileCoord::new(x + 1, y + 1),
            (true, false) => TileCoord::new(x + 1, y),
        }
    }

    /// True if the coordinate lies inside the map bounds.
    pub fn is_valid(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as i64) < self.columns as i64
            && (coord.y as i64) < self.rows as i64
    }

    /// Size of the whole map in screen space.
    pub fn size_in_points(&self) -> Vec2 {
        let (cols, rows) = (self.columns as f32, self.rows as f32);
        match self.orientation {
            Orientation::Orthogonal => vec2(cols * self.tw(), rows * self.th()),
            Orientation::Isometric => vec2(
                (cols + rows) * self.tile_width_half(),
                (cols + rows) * self.tile_height_half(),
            ),
            Orientation::Hexagonal | Orientation::Staggered => {
                if self.stagger_x() {
                    let mut h = rows * (self.th() + self.side_length_y() as f32);
                    if self.columns > 1 {
                        h += self.row_height() as f32;
                    }
                    vec2(cols * self.column_width() as f32 + self.side_offset_x() as f32, h)
                } else {
                    let mut w = cols * (self.tw() + self.side_length_x() as f32);
                    if self.rows > 1 {
                        w += self.column_width() as f32;
                    }
                    vec2(w, rows * self.row_height() as f32 + self.side_offset_y() as f32)
                }
            }
        }
    }

    /// Tile coordinate to map space.
    ///
    /// Orthogonal and isometric maps give the tile's origin corner. Hexagonal
    /// and staggered cells share their bounding-box corner with a neighbour,
    /// so those give the (floored) tile center instead; either way
    /// [`pixel_to_tile`](Self::pixel_to_tile) maps the result back to `coord`.
    pub fn tile_to_pixel(&self, coord: TileCoord) -> Vec2 {
        match self.orientation {
            Orientation::Orthogonal => vec2(coord.x as f32 * self.tw(), coord.y as f32 * self.th()),
            Orientation::Isometric => vec2(coord.x as f32 * self.th(), coord.y as f32 * self.th()),
            Orientation::Hexagonal | Orientation::Staggered => self.tile_center(coord).floor(),
        }
    }

    /// Map space to the containing tile coordinate.
    pub fn pixel_to_tile(&self, point: Vec2) -> TileCoord {
        match self.orientation {
            Orientation::Orthogonal => floor_coord(point.x / self.tw(), point.y / self.th()),
            Orientation::Isometric => floor_coord(point.x / self.th(), point.y / self.th()),
            Orientation::Hexagonal | Orientation::Staggered => self.screen_to_tile(point),
        }
    }

    /// Map space to screen space. Identity except for isometric maps.
    pub fn pixel_to_screen(&self, point: Vec2) -> Vec2 {
        match self.orientation {
            Orientation::Isometric => {
                let tile_y = point.y / self.th();
                let tile_x = point.x / self.th();
                vec2(
                    (tile_x - tile_y) * self.tile_width_half() + self.iso_origin_x(),
                    (tile_x + tile_y) * self.tile_height_half(),
                )
            }
            _ => point,
        }
    }

    /// Screen space to map space. Identity except for isometric maps.
    pub fn screen_to_pixel(&self, point: Vec2) -> Vec2 {
        match self.orientation {
            Orientation::Isometric => {
                let x = point.x - self.iso_origin_x();
                let tile_y = point.y / self.th();
                let tile_x = x / self.tw();
                vec2((tile_y + tile_x) * self.th(), (tile_y - tile_x) * self.th())
            }
            _ => point,
        }
    }

    /// Tile coordinate to screen space: the top-left corner of the tile's
    /// bounding box (the top corner of the diamond for isometric maps).
    pub fn tile_to_screen(&self, coord: TileCoord) -> Vec2 {
        match self.orientation {
            Orientation::Orthogonal => vec2(coord.x as f32 * self.tw(), coord.y as f32 * self.th()),
            Orientation::Isometric => {
                let (x, y) = (coord.x as f32, coord.y as f32);
                vec2(
                    (x - y) * self.tile_width_half() + self.iso_origin_x(),
                    (x + y) * self.tile_height_half(),
                )
            }
            Orientation::Hexagonal | Orientation::Staggered => {
                let TileCoord { x, y } = coord;
                if self.stagger_x() {
                    let mut py = y * (self.tile_height as i32 + self.side_length_y());
                    if self.do_stagger_x(x) {
                        py += self.row_height();
                    }
                    vec2((x * self.column_width()) as f32, py as f32)
                } else {
                    let mut px = x * (self.tile_width as i32 + self.side_length_x());
                    if self.do_stagger_y(y) {
                        px += self.column_width();
                    }
                    vec2(px as f32, (y * self.row_height()) as f32)
                }
            }
        }
    }

    /// Screen space to the containing tile coordinate.
    pub fn screen_to_tile(&self, point: Vec2) -> TileCoord {
        match self.orientation {
            Orientation::Orthogonal => floor_coord(point.x / self.tw(), point.y / self.th()),
            Orientation::Isometric => {
                let x = point.x - self.iso_origin_x();
                let tile_y = point.y / self.th();
                let tile_x = x / self.tw();
                floor_coord(tile_y + tile_x, tile_y - tile_x)
            }
            Orientation::Hexagonal => self.hex_screen_to_tile(point),
            Orientation::Staggered => self.staggered_screen_to_tile(point),
        }
    }

    // Sections are floored before the stagger shift and again after it. The
    // side offset is added rather than subtracted for negative input, which
    // misplaces points left of / above the origin; kept as-is and pinned by tests.
    fn hex_screen_to_tile(&self, point: Vec2) -> TileCoord {
        let (mut pixel_x, mut pixel_y) = (point.x, point.y);

        let (section_x, section_y) = if self.stagger_x() {
            let s = self.side_length_x() as f32;
            let r = (self.tw() - s) / 2.0;
            let h = self.th() / 2.0;

            pixel_x = if pixel_x < 0.0 { pixel_x + r } else { pixel_x - r };

            let mut section_x = pixel_x / (r + s);
            let mut section_y = pixel_y / (h * 2.0);
            if section_x < 0.0 {
                section_x = section_x.floor();
            }
            if section_y < 0.0 {
                section_y = section_y.floor();
            }
            if self.do_stagger_x(section_x.floor() as i32) {
                section_y -= 0.5;
            }
            (section_x, section_y)
        } else {
            let s = self.side_length_y() as f32;
            let r = self.tw() / 2.0;
            let h = (self.th() - s) / 2.0;

            pixel_y = if pixel_y < 0.0 { pixel_y + h } else { pixel_y - h };

            let mut section_x = pixel_x / (r * 2.0);
            let mut section_y = pixel_y / (h + s);
            if section_x < 0.0 {
                section_x = section_x.floor();
            }
            if section_y < 0.0 {
                section_y = section_y.floor();
            }
            if self.do_stagger_y(section_y.floor() as i32) {
                section_x -= 0.5;
            }
            (section_x, section_y)
        };

        floor_coord(section_x, section_y)
    }

    // Corner tests run top-left, top-right, bottom-left, bottom-right; the
    // first hit wins and a point on an edge stays in the reference cell.
    fn staggered_screen_to_tile(&self, point: Vec2) -> TileCoord {
        let (mut pixel_x, mut pixel_y) = (point.x, point.y);
        if self.stagger_x() {
            if self.stagger_even() {
                pixel_x -= self.side_offset_x() as f32;
            }
        } else if self.stagger_even() {
            pixel_y -= self.side_offset_y() as f32;
        }

        let mut reference = floor_coord(pixel_x / self.tw(), pixel_y / self.th());
        let rel_x = pixel_x - reference.x as f32 * self.tw();
        let rel_y = pixel_y - reference.y as f32 * self.th();

        if self.stagger_x() {
            reference.x *= 2;
            if self.stagger_even() {
                reference.x += 1;
            }
        } else {
            reference.y *= 2;
            if self.stagger_even() {
                reference.y += 1;
            }
        }

        let side_offset_y = self.side_offset_y() as f32;
        let delta = rel_x * (self.th() / self.tw());
        let TileCoord { x, y } = reference;

        if side_offset_y - delta > rel_y {
            return self.top_left(x, y);
        }
        if -side_offset_y + delta > rel_y {
            return self.top_right(x, y);
        }
        if side_offset_y + delta < rel_y {
            return self.bottom_left(x, y);
        }
        if side_offset_y * 3.0 - delta < rel_y {
            return self.bottom_right(x, y);
        }
        reference
    }

    /// Center of a tile in screen space.
    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        let origin = self.tile_to_screen(coord);
        match self.orientation {
            Orientation::Isometric => origin + vec2(0.0, self.tile_height_half()),
            _ => origin + vec2(self.tile_width_half(), self.tile_height_half()),
        }
    }

    /// A point inside (or on the edge of) a tile, in screen space.
    pub fn tile_anchor(&self, coord: TileCoord, anchor: TileAnchor) -> Vec2 {
        let (hw, hh) = (self.tile_width_half(), self.tile_height_half());
        let offset = match anchor {
            TileAnchor::Center => Vec2::ZERO,
            TileAnchor::Top => vec2(0.0, -hh),
            TileAnchor::TopLeft => vec2(-hw, -hh),
            TileAnchor::TopRight => vec2(hw, -hh),
            TileAnchor::Bottom => vec2(0.0, hh),
            TileAnchor::BottomLeft => vec2(-hw, hh),
            TileAnchor::BottomRight => vec2(hw, hh),
            TileAnchor::Left => vec2(-hw, 0.0),
            TileAnchor::Right => vec2(hw, 0.0),
        };
        self.tile_center(coord) + offset
    }
}

#[inline]
fn floor_coord(x: f32, y: f32) -> TileCoord {
    TileCoord::new(x.floor() as i32, y.floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometries() -> Vec<MapGeometry> {
        let mut out = Vec::new();
        for (tw, th) in [(32, 32), (64, 32), (33, 17)] {
            out.push(MapGeometry::new(Orientation::Orthogonal, 64, 64, tw, th).unwrap());
            out.push(MapGeometry::new(Orientation::Isometric, 64, 64, tw, th).unwrap());
        }
        for axis in [StaggerAxis::X, StaggerAxis::Y] {
            for parity in [StaggerParity::Odd, StaggerParity::Even] {
                out.push(
                    MapGeometry::new(Orientation::Staggered, 64, 64, 64, 32)
                        .unwrap()
                        .with_stagger(axis, parity),
                );
                let (tw, th) = if axis == StaggerAxis::X { (32, 28) } else { (28, 32) };
                out.push(
                    MapGeometry::new(Orientation::Hexagonal, 64, 64, tw, th)
                        .unwrap()
                        .with_stagger(axis, parity)
                        .with_hex_side_length(16),
                );
                out.push(
                    MapGeometry::new(Orientation::Hexagonal, 64, 64, 14, 12)
                        .unwrap()
                        .with_stagger(axis, parity)
                        .with_hex_side_length(6),
                );
            }
        }
        out
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        assert!(MapGeometry::new(Orientation::Orthogonal, 4, 4, 0, 16).is_err());
        assert!(MapGeometry::new(Orientation::Orthogonal, 0, 0, 16, 16).is_ok());
    }

    #[test]
    fn pixel_round_trip_for_every_orientation() {
        for g in geometries() {
            for y in 0..64 {
                for x in 0..64 {
                    let c = TileCoord::new(x, y);
                    assert_eq!(g.pixel_to_tile(g.tile_to_pixel(c)), c, "{g:?}");
                }
            }
        }
    }

    #[test]
    fn orthogonal_and_isometric_screen_corners_round_trip() {
        for g in geometries()
            .into_iter()
            .filter(|g| matches!(g.orientation(), Orientation::Orthogonal | Orientation::Isometric))
        {
            for y in 0..64 {
                for x in 0..64 {
                    let c = TileCoord::new(x, y);
                    assert_eq!(g.screen_to_tile(g.tile_to_screen(c)), c, "{g:?}");
                }
            }
        }
    }

    #[test]
    fn hexagonal_and_staggered_pixels_sit_inside_the_cell() {
        let stag = MapGeometry::new(Orientation::Staggered, 64, 64, 64, 32).unwrap();
        assert_eq!(stag.tile_to_pixel(TileCoord::new(0, 0)), vec2(32.0, 16.0));
        assert_eq!(stag.pixel_to_tile(vec2(32.0, 16.0)), TileCoord::new(0, 0));
        // the bounding-box corner belongs to the neighbour
        assert_eq!(stag.pixel_to_tile(stag.tile_to_screen(TileCoord::new(0, 0))), TileCoord::new(-1, -1));
    }

    #[test]
    fn tile_center_round_trip_for_every_orientation() {
        for g in geometries() {
            for y in 0..64 {
                for x in 0..64 {
                    let c = TileCoord::new(x, y);
                    let p = g.tile_center(c).floor();
                    assert_eq!(g.screen_to_tile(p), c, "{:?} {:?}", g.orientation(), c);
                    assert_eq!(g.pixel_to_tile(g.screen_to_pixel(p)), c);
                }
            }
        }
    }

    #[test]
    fn isometric_tile_to_screen() {
        let g = MapGeometry::new(Orientation::Isometric, 4, 4, 64, 32).unwrap();
        assert_eq!(g.tile_to_screen(TileCoord::new(0, 0)), vec2(128.0, 0.0));
        assert_eq!(g.tile_to_screen(TileCoord::new(1, 0)), vec2(160.0, 16.0));
        assert_eq!(g.tile_to_screen(TileCoord::new(0, 1)), vec2(96.0, 16.0));
        assert_eq!(g.screen_to_tile(vec2(128.0, 0.0)), TileCoord::new(0, 0));
        // left of the top corner falls into row -1
        assert_eq!(g.screen_to_tile(vec2(127.0, 0.0)), TileCoord::new(-1, 0));
    }

    #[test]
    fn isometric_pixel_and_screen_agree() {
        let g = MapGeometry::new(Orientation::Isometric, 4, 4, 64, 32).unwrap();
        let p = g.tile_to_pixel(TileCoord::new(2, 1));
        assert_eq!(p, vec2(64.0, 32.0));
        let s = g.pixel_to_screen(p);
        assert_eq!(s, g.tile_to_screen(TileCoord::new(2, 1)));
        assert_eq!(g.screen_to_pixel(s), p);
    }

    #[test]
    fn orthogonal_negative_points_floor() {
        let g = MapGeometry::new(Orientation::Orthogonal, 4, 4, 16, 16).unwrap();
        assert_eq!(g.screen_to_tile(vec2(-0.5, 3.0)), TileCoord::new(-1, 0));
        assert_eq!(g.screen_to_tile(vec2(-16.0, -16.1)), TileCoord::new(-1, -2));
        assert!(!g.is_valid(TileCoord::new(-1, 0)));
        assert!(g.is_valid(TileCoord::new(3, 3)));
        assert!(!g.is_valid(TileCoord::new(4, 3)));
    }

    #[test]
    fn hexagonal_layout_values() {
        let flat = MapGeometry::new(Orientation::Hexagonal, 10, 10, 32, 28)
            .unwrap()
            .with_stagger(StaggerAxis::X, StaggerParity::Odd)
            .with_hex_side_length(16);
        assert_eq!(flat.column_width(), 24);
        assert_eq!(flat.row_height(), 14);
        assert_eq!(flat.tile_to_screen(TileCoord::new(1, 0)), vec2(24.0, 14.0));
        assert_eq!(flat.tile_to_screen(TileCoord::new(2, 1)), vec2(48.0, 28.0));

        let pointy = MapGeometry::new(Orientation::Hexagonal, 10, 10, 28, 32)
            .unwrap()
            .with_stagger(StaggerAxis::Y, StaggerParity::Odd)
            .with_hex_side_length(16);
        assert_eq!(pointy.tile_to_screen(TileCoord::new(0, 1)), vec2(14.0, 24.0));
    }

    #[test]
    fn hexagonal_negative_points_keep_source_behaviour() {
        let flat = MapGeometry::new(Orientation::Hexagonal, 10, 10, 32, 28)
            .unwrap()
            .with_stagger(StaggerAxis::X, StaggerParity::Odd)
            .with_hex_side_length(16);
        // left of column 0's bounding box, still reported as column 0
        assert_eq!(flat.screen_to_tile(vec2(-4.0, 10.0)), TileCoord::new(0, 0));
        assert_eq!(flat.screen_to_tile(vec2(-20.0, 5.0)), TileCoord::new(-1, -1));
        assert_eq!(flat.screen_to_tile(vec2(10.0, -3.0)), TileCoord::new(0, -1));
        // the center of (-1, 0) does not map back to (-1, 0)
        let center = flat.tile_center(TileCoord::new(-1, 0));
        assert_eq!(center, vec2(-8.0, 28.0));
        assert_eq!(flat.screen_to_tile(center), TileCoord::new(0, 1));

        let pointy = MapGeometry::new(Orientation::Hexagonal, 10, 10, 28, 32)
            .unwrap()
            .with_stagger(StaggerAxis::Y, StaggerParity::Odd)
            .with_hex_side_length(16);
        assert_eq!(pointy.screen_to_tile(vec2(10.0, -4.0)), TileCoord::new(0, 0));
        assert_eq!(pointy.screen_to_tile(vec2(-3.0, 10.0)), TileCoord::new(-1, 0));
    }

    #[test]
    fn staggered_negative_tiles_round_trip() {
        for axis in [StaggerAxis::X, StaggerAxis::Y] {
            let g = MapGeometry::new(Orientation::Staggered, 10, 10, 64, 32)
                .unwrap()
                .with_stagger(axis, StaggerParity::Odd);
            for y in -6..0 {
                for x in -6..0 {
                    let c = TileCoord::new(x, y);
                    assert_eq!(g.screen_to_tile(g.tile_center(c).floor()), c);
                }
            }
        }
    }

    #[test]
    fn staggered_corner_order_is_deterministic() {
        let g = MapGeometry::new(Orientation::Staggered, 10, 10, 64, 32)
            .unwrap()
            .with_stagger(StaggerAxis::Y, StaggerParity::Odd);

        // on the edge between the top-left and bottom-left corners
        let edge = vec2(0.0, 16.0);
        let first = g.screen_to_tile(edge);
        assert_eq!(first, TileCoord::new(0, 0));
        for _ in 0..8 {
            assert_eq!(g.screen_to_tile(edge), first);
        }

        assert_eq!(g.screen_to_tile(vec2(0.0, 15.5)), TileCoord::new(-1, -1));
        assert_eq!(g.screen_to_tile(vec2(0.0, 16.5)), TileCoord::new(-1, 1));
        assert_eq!(g.screen_to_tile(vec2(63.5, 16.0)), TileCoord::new(0, 0));
        assert_eq!(g.screen_to_tile(vec2(64.0, 16.0)), TileCoord::new(1, 0));
        assert_eq!(g.screen_to_tile(vec2(-16.0, -8.0)), TileCoord::new(-1, -2));
    }

    #[test]
    fn anchors_offset_from_center() {
        let g = MapGeometry::new(Orientation::Orthogonal, 4, 4, 16, 8).unwrap();
        let c = TileCoord::new(1, 1);
        assert_eq!(g.tile_anchor(c, TileAnchor::Center), vec2(24.0, 12.0));
        assert_eq!(g.tile_anchor(c, TileAnchor::TopLeft), vec2(16.0, 8.0));
        assert_eq!(g.tile_anchor(c, TileAnchor::BottomRight), vec2(32.0, 16.0));
    }

    #[test]
    fn map_size_in_points() {
        let ortho = MapGeometry::new(Orientation::Orthogonal, 10, 5, 16, 16).unwrap();
        assert_eq!(ortho.size_in_points(), vec2(160.0, 80.0));
        let iso = MapGeometry::new(Orientation::Isometric, 4, 4, 64, 32).unwrap();
        assert_eq!(iso.size_in_points(), vec2(256.0, 128.0));
        let stag = MapGeometry::new(Orientation::Staggered, 4, 4, 64, 32).unwrap();
        assert_eq!(stag.size_in_points(), vec2(288.0, 80.0));
    }

    #[test]
    fn orientation_parses_tiled_names() {
        assert_eq!("staggered".parse::<Orientation>().unwrap(), Orientation::Staggered);
        assert!("hex".parse::<Orientation>().is_err());
        assert_eq!("x".parse::<StaggerAxis>().unwrap(), StaggerAxis::X);
        assert_eq!("even".parse::<StaggerParity>().unwrap(), StaggerParity::Even);
    }
}
