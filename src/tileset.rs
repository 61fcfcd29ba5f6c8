use std::sync::Arc;

use log::debug;
use macroquad::prelude::{vec2, Rect, Vec2};

use crate::error::{MapError, Result};
use crate::properties::Properties;
use crate::spatial::GID_MASK;

/// One step of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Local id of the tile shown during this frame.
    pub tile_id: u32,
    pub duration_ms: u32,
}

/// Metadata shared by every tile drawn from the same tileset entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    local_id: u32,
    tileset: Arc<str>,
    tile_type: Option<String>,
    properties: Properties,
    frames: Vec<AnimationFrame>,
    source: Rect,
    image: Option<String>,
    offset: Vec2,
}

impl TileData {
    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    /// Name of the owning tileset.
    pub fn tileset_name(&self) -> &str {
        &self.tileset
    }

    /// Tiled "type" (or "class") of the tile.
    pub fn tile_type(&self) -> Option<&str> {
        self.tile_type.as_deref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn is_animated(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Sub-rectangle of the tileset image holding this tile's art.
    pub fn source_rect(&self) -> Rect {
        self.source
    }

    /// Image path the source rectangle refers to.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Drawing offset inherited from the owning tileset.
    pub fn tile_offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_tile_type(&mut self, tile_type: impl Into<String>) {
        self.tile_type = Some(tile_type.into());
    }

    pub fn set_animation(&mut self, frames: Vec<AnimationFrame>) {
        self.frames = frames;
    }

    /// Give this tile its own image (image-collection tilesets).
    pub fn set_image(&mut self, image: impl Into<String>, width: u32, height: u32) {
        self.image = Some(image.into());
        self.source = Rect::new(0.0, 0.0, width as f32, height as f32);
    }
}

/// A set of tiles sharing a tile size and (usually) one atlas image.
#[derive(Debug, Clone)]
pub struct Tileset {
    name: Arc<str>,
    tile_width: u32,
    tile_height: u32,
    tile_count: u32,
    columns: u32,
    spacing: u32,
    margin: u32,
    image: Option<String>,
    tile_offset: Vec2,
    properties: Properties,
    tiles: Vec<Arc<TileData>>,
}

impl Tileset {
    /// Build a tileset and the metadata of each of its tiles.
    ///
    /// Fails when `tile_count` does not fit the global id space.
    pub fn new(
        name: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        tile_count: u32,
        columns: u32,
    ) -> Result<Self> {
        let name: Arc<str> = Arc::from(name.into());
        if tile_count > GID_MASK {
            return Err(MapError::InvalidTileset(format!(
                "tileset '{name}' declares {tile_count} tiles, more than the {GID_MASK} global ids available"
            )));
        }
        let mut ts = Tileset {
            name: name.clone(),
            tile_width,
            tile_height,
            tile_count,
            columns,
            spacing: 0,
            margin: 0,
            image: None,
            tile_offset: Vec2::ZERO,
            properties: Properties::new(),
            tiles: Vec::with_capacity(tile_count as usize),
        };
        for local_id in 0..tile_count {
            let data = TileData {
                local_id,
                tileset: name.clone(),
                tile_type: None,
                properties: Properties::new(),
                frames: Vec::new(),
                source: ts.atlas_rect(local_id),
                image: None,
                offset: Vec2::ZERO,
            };
            ts.tiles.push(Arc::new(data));
        }
        Ok(ts)
    }

    /// Atlas image shared by all tiles.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        let image = image.into();
        for tile in &mut self.tiles {
            Arc::make_mut(tile).image = Some(image.clone());
        }
        self.image = Some(image);
        self
    }

    /// Spacing between tiles and margin around the atlas, in pixels.
    pub fn with_layout(mut self, spacing: u32, margin: u32) -> Self {
        self.spacing = spacing;
        self.margin = margin;
        for i in 0..self.tiles.len() {
            let rect = self.atlas_rect(i as u32);
            Arc::make_mut(&mut self.tiles[i]).source = rect;
        }
        self
    }

    /// Drawing offset applied to every tile of this tileset.
    pub fn with_tile_offset(mut self, offset: Vec2) -> Self {
        for tile in &mut self.tiles {
            Arc::make_mut(tile).offset = offset;
        }
        self.tile_offset = offset;
        self
    }

    // u64 keeps huge tile sizes from overflowing; the rect is f32 anyway
    fn atlas_rect(&self, local_id: u32) -> Rect {
        let cols = self.columns.max(1) as u64;
        let id = local_id as u64;
        let (col, row) = (id % cols, id / cols);
        let (margin, spacing) = (self.margin as u64, self.spacing as u64);
        let sx = margin + col * (self.tile_width as u64 + spacing);
        let sy = margin + row * (self.tile_height as u64 + spacing);
        Rect::new(
            sx as f32,
            sy as f32,
            self.tile_width as f32,
            self.tile_height as f32,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn tile_size(&self) -> Vec2 {
        vec2(self.tile_width as f32, self.tile_height as f32)
    }

    pub fn tile_offset(&self) -> Vec2 {
        self.tile_offset
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn tile(&self, local_id: u32) -> Option<&Arc<TileData>> {
        self.tiles.get(local_id as usize)
    }

    /// Edit a tile's metadata. Tiles already handed out keep the old data.
    pub fn tile_mut(&mut self, local_id: u32) -> Option<&mut TileData> {
        self.tiles.get_mut(local_id as usize).map(Arc::make_mut)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Arc<TileData>> + '_ {
        self.tiles.iter()
    }
}

#[derive(Debug, Clone)]
struct TilesetEntry {
    first_gid: u32,
    tileset: Arc<Tileset>,
}

impl TilesetEntry {
    #[inline]
    fn end_gid(&self) -> u64 {
        self.first_gid as u64 + self.tileset.tile_count as u64
    }

    #[inline]
    fn contains(&self, gid: u32) -> bool {
        gid >= self.first_gid && (gid as u64) < self.end_gid()
    }
}

/// Tilesets of a map with their global id ranges.
///
/// Ranges are kept sorted by first gid; maps carry a handful of tilesets, so
/// lookups scan linearly.
#[derive(Debug, Clone, Default)]
pub struct TilesetRegistry {
    entries: Vec<TilesetEntry>,
}

impl TilesetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `[first_gid, first_gid + tile_count)` for `tileset`.
    pub fn register(&mut self, tileset: Tileset, first_gid: u32) -> Result<Arc<Tileset>> {
        if first_gid == 0 {
            return Err(MapError::ZeroFirstGid(tileset.name().to_owned()));
        }
        let entry = TilesetEntry {
            first_gid,
            tileset: Arc::new(tileset),
        };
        if entry.end_gid() > GID_MASK as u64 + 1 {
            return Err(MapError::InvalidTileset(format!(
                "tileset '{}' gid range {}..{} exceeds the 29-bit id space",
                entry.tileset.name(),
                entry.first_gid,
                entry.end_gid()
            )));
        }

        let (start, end) = (entry.first_gid as u64, entry.end_gid());
        if let Some(other) = self
            .entries
            .iter()
            .find(|e| start < e.end_gid() && (e.first_gid as u64) < end)
        {
            return Err(MapError::OverlappingTileset {
                name: entry.tileset.name().to_owned(),
                first_gid,
                end_gid: end as u32,
                other: other.tileset.name().to_owned(),
                other_first_gid: other.first_gid,
                other_end_gid: other.end_gid() as u32,
            });
        }

        debug!(
            "registered tileset '{}' for gids {}..{}",
            entry.tileset.name(),
            start,
            end
        );
        let tileset = entry.tileset.clone();
        let pos = self.entries.partition_point(|e| e.first_gid < first_gid);
        self.entries.insert(pos, entry);
        Ok(tileset)
    }

    /// Tile metadata for a global id; flip bits are ignored.
    ///
    /// Returns `None` for the empty id and for ids outside every range.
    pub fn resolve(&self, gid: u32) -> Option<Arc<TileData>> {
        self.resolve_entry(gid)
            .and_then(|(ts, local)| ts.tile(local).cloned())
    }

    /// Owning tileset and local id for a global id.
    pub fn resolve_entry(&self, gid: u32) -> Option<(&Tileset, u32)> {
        let clean = gid & GID_MASK;
        if clean == 0 {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.contains(clean))
            .map(|e| (e.tileset.as_ref(), clean - e.first_gid))
    }

    /// First gid assigned to the tileset with this name.
    pub fn first_gid(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.tileset.name() == name)
            .map(|e| e.first_gid)
    }

    pub fn tileset(&self, name: &str) -> Option<&Arc<Tileset>> {
        self.entries
            .iter()
            .find(|e| e.tileset.name() == name)
            .map(|e| &e.tileset)
    }

    /// Tilesets with their first gid, in gid order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<Tileset>)> + '_ {
        self.entries.iter().map(|e| (e.first_gid, &e.tileset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest gid claimed by any tileset, 0 when empty.
    pub fn max_gid(&self) -> u32 {
        self.entries
            .iter()
            .map(|e| e.end_gid().saturating_sub(1) as u32)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spatial::{FLIP_D, FLIP_H};

    #[test]
    fn overlapping_ranges_are_rejected() {
        let mut reg = TilesetRegistry::new();
        reg.register(Tileset::new("a", 16, 16, 9, 3).unwrap(), 1).unwrap();
        let err = reg.register(Tileset::new("b", 16, 16, 10, 5).unwrap(), 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, MapError::OverlappingTileset { ref other, .. } if other == "a"));
        assert_eq!(reg.len(), 1);

        // adjacent ranges are fine
        reg.register(Tileset::new("c", 16, 16, 4, 2).unwrap(), 10).unwrap();
        assert_eq!(reg.max_gid(), 13);
    }

    #[test]
    fn zero_first_gid_is_a_configuration_error() {
        let mut reg = TilesetRegistry::new();
        let err = reg.register(Tileset::new("a", 16, 16, 4, 2).unwrap(), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn resolve_masks_flags_and_finds_local_id() {
        let mut reg = TilesetRegistry::new();
        // registered out of order on purpose
        reg.register(Tileset::new("second", 16, 16, 4, 2).unwrap(), 5).unwrap();
        reg.register(Tileset::new("first", 16, 16, 4, 2).unwrap(), 1).unwrap();

        let data = reg.resolve(6 | FLIP_H | FLIP_D).unwrap();
        assert_eq!(data.tileset_name(), "second");
        assert_eq!(data.local_id(), 1);

        let (ts, local) = reg.resolve_entry(4).unwrap();
        assert_eq!((ts.name(), local), ("first", 3));

        assert!(reg.resolve(0).is_none());
        assert!(reg.resolve(FLIP_H).is_none());
        assert!(reg.resolve(9).is_none());
        assert_eq!(reg.first_gid("second"), Some(5));
    }

    #[test]
    fn atlas_rects_follow_margin_and_spacing() {
        let ts = Tileset::new("atlas", 16, 16, 6, 3)
            .unwrap()
            .with_image("tiles.png")
            .with_layout(2, 1);
        let rect = ts.tile(4).unwrap().source_rect();
        assert_eq!((rect.x, rect.y, rect.w, rect.h), (19.0, 19.0, 16.0, 16.0));
        assert_eq!(ts.tile(4).unwrap().image(), Some("tiles.png"));
    }

    #[test]
    fn tall_tiles_far_down_the_atlas_do_not_overflow() {
        let ts = Tileset::new("strips", 16, 1 << 20, 5000, 1).unwrap();
        let rect = ts.tile(4999).unwrap().source_rect();
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 4999.0 * (1u32 << 20) as f32);
    }

    #[test]
    fn tile_counts_beyond_the_gid_space_are_rejected() {
        let err = Tileset::new("huge", 16, 16, GID_MASK + 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, MapError::InvalidTileset(_)));
    }

    #[test]
    fn gid_range_past_the_id_space_is_a_configuration_error() {
        let mut reg = TilesetRegistry::new();
        let err = reg
            .register(Tileset::new("tail", 16, 16, 4, 2).unwrap(), GID_MASK - 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, MapError::InvalidTileset(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn tileset_offset_reaches_every_tile() {
        let ts = Tileset::new("tall", 16, 24, 2, 2)
            .unwrap()
            .with_tile_offset(vec2(0.0, 8.0));
        assert_eq!(ts.tile(0).unwrap().tile_offset(), vec2(0.0, 8.0));
        assert_eq!(ts.tile(1).unwrap().tile_offset(), vec2(0.0, 8.0));
    }

    #[test]
    fn tile_metadata_is_shared_after_resolve() {
        let mut ts = Tileset::new("items", 16, 16, 2, 2).unwrap();
        {
            let tile = ts.tile_mut(1).unwrap();
            tile.set_tile_type("food");
            tile.properties_mut().insert("pointValue", "2100");
            tile.set_animation(vec![
                AnimationFrame { tile_id: 0, duration_ms: 100 },
                AnimationFrame { tile_id: 1, duration_ms: 100 },
            ]);
        }
        let mut reg = TilesetRegistry::new();
        reg.register(ts, 1).unwrap();

        let a = reg.resolve(2).unwrap();
        let b = reg.resolve(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.tile_type(), Some("food"));
        assert_eq!(a.properties().get_string("pointValue"), Some("2100"));
        assert!(a.is_animated());
    }
}
