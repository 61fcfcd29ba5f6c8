use std::collections::BTreeSet;
use std::sync::Arc;

use log::warn;

use crate::error::{MapError, Result};
use crate::spatial::{
    decode, tile_to_chunk, ChunkMap, DecodedGid, FlipFlags, SparseTileGrid, TileChunk, TileCoord,
    TileId,
};
use crate::tileset::{TileData, TilesetRegistry};

/// A placed tile.
///
/// The screen position is not stored; ask the owning layer for
/// `point_for_coordinate(tile.coord())`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    coord: TileCoord,
    gid: u32,
    flip: FlipFlags,
    data: Arc<TileData>,
    pub visible: bool,
    pub highlighted: bool,
}

impl Tile {
    pub fn new(coord: TileCoord, id: TileId, data: Arc<TileData>) -> Self {
        let DecodedGid { gid, flip } = id.decode();
        Self {
            coord,
            gid,
            flip,
            data,
            visible: true,
            highlighted: false,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Global id without flip bits.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Raw id with this instance's flip flags.
    pub fn id(&self) -> TileId {
        TileId::from(DecodedGid {
            gid: self.gid,
            flip: self.flip,
        })
    }

    pub fn flip(&self) -> FlipFlags {
        self.flip
    }

    /// Override the flip flags of this tile only.
    pub fn set_flip(&mut self, flip: FlipFlags) {
        self.flip = flip;
    }

    pub fn data(&self) -> &Arc<TileData> {
        &self.data
    }
}

/// Outcome of a bulk data load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tiles placed.
    pub placed: usize,
    /// Distinct gids no tileset claims, in ascending order.
    pub unresolved: Vec<u32>,
}

#[derive(Debug, Clone)]
enum TileStorage {
    Finite(SparseTileGrid<Tile>),
    Chunked(ChunkMap<Tile>),
}

/// Grid of tiles. Finite layers own one grid the size of the map; layers of
/// infinite maps own a set of chunks.
#[derive(Debug, Clone)]
pub struct TileLayer {
    storage: TileStorage,
    unresolved: BTreeSet<u32>,
}

impl TileLayer {
    /// Empty layer of `columns x rows` cells.
    pub fn finite(columns: u32, rows: u32) -> Self {
        Self {
            storage: TileStorage::Finite(SparseTileGrid::new(columns as usize, rows as usize)),
            unresolved: BTreeSet::new(),
        }
    }

    /// Empty infinite layer bucketed into `chunk_size` square chunks.
    pub fn chunked(chunk_size: u32) -> Self {
        Self {
            storage: TileStorage::Chunked(ChunkMap::new(chunk_size)),
            unresolved: BTreeSet::new(),
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.storage, TileStorage::Chunked(_))
    }

    /// Finite grid, if this layer has one.
    pub fn grid(&self) -> Option<&SparseTileGrid<Tile>> {
        match &self.storage {
            TileStorage::Finite(grid) => Some(grid),
            TileStorage::Chunked(_) => None,
        }
    }

    /// Loaded chunks, sorted by position. Empty for finite layers.
    pub fn chunks(&self) -> Vec<&TileChunk<Tile>> {
        match &self.storage {
            TileStorage::Finite(_) => Vec::new(),
            TileStorage::Chunked(map) => map.chunks(),
        }
    }

    /// Inside the grid, or inside a loaded chunk.
    pub fn is_valid(&self, coord: TileCoord) -> bool {
        match &self.storage {
            TileStorage::Finite(grid) => grid.contains(coord.x, coord.y),
            TileStorage::Chunked(map) => map.contains(coord),
        }
    }

    /// Replace the whole grid with decoded `data` (row-major).
    ///
    /// The length is checked before anything is touched: on mismatch the
    /// layer keeps its previous tiles.
    pub(crate) fn set_data(
        &mut self,
        layer: &str,
        data: &[u32],
        registry: &TilesetRegistry,
    ) -> Result<LoadReport> {
        let (columns, rows) = match &self.storage {
            TileStorage::Finite(grid) => (grid.columns(), grid.rows()),
            TileStorage::Chunked(_) => {
                return Err(MapError::InvalidMap(format!(
                    "layer '{layer}' is infinite and takes chunk data"
                )))
            }
        };
        let expected = columns * rows;
        if data.len() != expected {
            return Err(MapError::SizeMismatch {
                layer: layer.to_owned(),
                expected,
                actual: data.len(),
            });
        }

        let mut grid = SparseTileGrid::new(columns, rows);
        let mut missing = BTreeSet::new();
        let placed = fill(&mut grid, TileCoord::default(), data, registry, &mut missing)?;
        self.storage = TileStorage::Finite(grid);
        self.unresolved = missing.clone();
        Ok(report(layer, placed, missing))
    }

    /// Load one chunk of an infinite layer. `origin` is the chunk's top-left
    /// tile and must be aligned to the chunk size.
    pub(crate) fn set_chunk_data(
        &mut self,
        layer: &str,
        origin: TileCoord,
        width: u32,
        height: u32,
        data: &[u32],
        registry: &TilesetRegistry,
    ) -> Result<LoadReport> {
        let TileStorage::Chunked(map) = &mut self.storage else {
            return Err(MapError::InvalidMap(format!(
                "layer '{layer}' is finite and cannot take chunk data"
            )));
        };
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(MapError::SizeMismatch {
                layer: layer.to_owned(),
                expected,
                actual: data.len(),
            });
        }

        let mut chunk = TileChunk::new(origin, width as usize, height as usize);
        let mut missing = BTreeSet::new();
        let placed = fill(chunk.grid_mut(), origin, data, registry, &mut missing)?;
        map.insert(chunk)?;
        self.unresolved.extend(missing.iter().copied());
        Ok(report(layer, placed, missing))
    }

    /// Gids seen during loading that no tileset claims.
    pub fn unresolved_gids(&self) -> impl Iterator<Item = u32> + '_ {
        self.unresolved.iter().copied()
    }

    /// Tile at a coordinate; `None` for empty or out-of-range cells.
    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        match &self.storage {
            TileStorage::Finite(grid) => grid.get(coord.x, coord.y).ok().flatten(),
            TileStorage::Chunked(map) => map
                .chunk_for(coord)
                .and_then(|c| c.get(coord).ok().flatten()),
        }
    }

    pub fn tile_at_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        match &mut self.storage {
            TileStorage::Finite(grid) => grid.get_mut(coord.x, coord.y).ok().flatten(),
            TileStorage::Chunked(map) => {
                let chunk = map.chunk_for_mut(coord)?;
                let local = chunk.local(coord);
                chunk.grid_mut().get_mut(local.x, local.y).ok().flatten()
            }
        }
    }

    /// Every placed tile, row-major (chunk by chunk for infinite layers).
    pub fn tiles(&self) -> Vec<&Tile> {
        match &self.storage {
            TileStorage::Finite(grid) => grid.values().collect(),
            TileStorage::Chunked(map) => map
                .chunks()
                .into_iter()
                .flat_map(|c| c.grid().values())
                .collect(),
        }
    }

    pub fn tile_count(&self) -> usize {
        match &self.storage {
            TileStorage::Finite(grid) => grid.count(),
            TileStorage::Chunked(map) => map.chunks().iter().map(|c| c.grid().count()).sum(),
        }
    }

    pub fn tiles_of_type(&self, tile_type: &str) -> Vec<&Tile> {
        self.filter(|t| t.data.tile_type() == Some(tile_type))
    }

    /// Tiles placed with this global id. Flip bits in `gid` are ignored.
    pub fn tiles_with_global_id(&self, gid: u32) -> Vec<&Tile> {
        let gid = decode(gid).gid;
        self.filter(|t| t.gid == gid)
    }

    pub fn tiles_with_property(&self, name: &str, value: &str) -> Vec<&Tile> {
        self.filter(|t| t.data.properties().get_string(name) == Some(value))
    }

    pub fn animated_tiles(&self) -> Vec<&Tile> {
        self.filter(|t| t.data.is_animated())
    }

    /// Distinct tile data carrying a property, in placement order.
    pub fn tile_data_with_property(&self, name: &str) -> Vec<Arc<TileData>> {
        let mut out: Vec<Arc<TileData>> = Vec::new();
        for tile in self.tiles() {
            if tile.data.has_property(name) && !out.iter().any(|d| Arc::ptr_eq(d, &tile.data)) {
                out.push(tile.data.clone());
            }
        }
        out
    }

    fn filter(&self, pred: impl Fn(&Tile) -> bool) -> Vec<&Tile> {
        self.tiles().into_iter().filter(|t| pred(t)).collect()
    }

    /// Place a tile from a global id, replacing the current occupant.
    ///
    /// Returns `Ok(None)` when no tileset claims `id`; the id is remembered in
    /// [`unresolved_gids`](Self::unresolved_gids). Infinite layers allocate
    /// the owning chunk on demand.
    pub(crate) fn add_tile_at(
        &mut self,
        coord: TileCoord,
        id: TileId,
        registry: &TilesetRegistry,
    ) -> Result<Option<&Tile>> {
        let Some(data) = registry.resolve(id.raw()) else {
            if !id.is_empty() {
                self.unresolved.insert(id.clean());
            }
            return Ok(None);
        };
        self.put(coord, Some(Tile::new(coord, id, data)))?;
        Ok(self.tile_at(coord))
    }

    pub(crate) fn remove_tile_at(&mut self, coord: TileCoord) -> Option<Tile> {
        match &mut self.storage {
            TileStorage::Finite(grid) => grid.take(coord.x, coord.y).ok().flatten(),
            TileStorage::Chunked(map) => map
                .chunk_for_mut(coord)
                .and_then(|c| c.set(coord, None).ok().flatten()),
        }
    }

    /// Store `tile` (moved to `coord`) or clear the cell, returning the
    /// previous occupant.
    pub(crate) fn set_tile(&mut self, coord: TileCoord, tile: Option<Tile>) -> Result<Option<Tile>> {
        let tile = tile.map(|mut t| {
            t.coord = coord;
            t
        });
        self.put(coord, tile)
    }

    fn put(&mut self, coord: TileCoord, tile: Option<Tile>) -> Result<Option<Tile>> {
        match &mut self.storage {
            TileStorage::Finite(grid) => grid.set(coord.x, coord.y, tile),
            TileStorage::Chunked(map) => {
                if !map.contains(coord) {
                    if tile.is_none() {
                        return Ok(None);
                    }
                    let size = map.chunk_size();
                    let key = tile_to_chunk(coord, size);
                    let origin = TileCoord::new(key.x * size, key.y * size);
                    map.insert(TileChunk::new(origin, size as usize, size as usize))?;
                }
                match map.chunk_for_mut(coord) {
                    Some(chunk) => chunk.set(coord, tile),
                    // a smaller chunk already sits in this slot
                    None => Err(MapError::OutOfBounds {
                        x: coord.x,
                        y: coord.y,
                        columns: 0,
                        rows: 0,
                    }),
                }
            }
        }
    }

    /// Drop every tile.
    pub(crate) fn clear(&mut self) {
        match &mut self.storage {
            TileStorage::Finite(grid) => grid.clear(),
            TileStorage::Chunked(map) => map.clear(),
        }
        self.unresolved.clear();
    }
}

fn fill(
    grid: &mut SparseTileGrid<Tile>,
    origin: TileCoord,
    data: &[u32],
    registry: &TilesetRegistry,
    missing: &mut BTreeSet<u32>,
) -> Result<usize> {
    let columns = grid.columns().max(1);
    let mut placed = 0;
    for (i, &raw) in data.iter().enumerate() {
        let id = TileId(raw);
        if id.is_empty() {
            continue;
        }
        let (x, y) = ((i % columns) as i32, (i / columns) as i32);
        match registry.resolve(raw) {
            Some(data) => {
                let coord = TileCoord::new(origin.x + x, origin.y + y);
                grid.set(x, y, Some(Tile::new(coord, id, data)))?;
                placed += 1;
            }
            None => {
                missing.insert(id.clean());
            }
        }
    }
    Ok(placed)
}

fn report(layer: &str, placed: usize, missing: BTreeSet<u32>) -> LoadReport {
    if !missing.is_empty() {
        warn!(
            "layer '{layer}': {} unresolved tile id(s) skipped: {:?}",
            missing.len(),
            missing
        );
    }
    LoadReport {
        placed,
        unresolved: missing.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{FLIP_D, FLIP_H};
    use crate::tileset::Tileset;

    fn registry() -> TilesetRegistry {
        let mut ts = Tileset::new("terrain", 16, 16, 4, 2).unwrap();
        ts.tile_mut(1).unwrap().set_tile_type("wall");
        ts.tile_mut(2).unwrap().properties_mut().insert("solid", "true");
        let mut reg = TilesetRegistry::new();
        reg.register(ts, 1).unwrap();
        reg
    }

    #[test]
    fn size_mismatch_places_nothing() {
        let reg = registry();
        let mut layer = TileLayer::finite(10, 10);
        let err = layer.set_data("ground", &[1; 80], &reg).unwrap_err();
        assert!(matches!(
            err,
            MapError::SizeMismatch { expected: 100, actual: 80, .. }
        ));
        assert_eq!(layer.tile_count(), 0);
    }

    #[test]
    fn unresolved_ids_are_collected_not_fatal() {
        let reg = registry();
        let mut layer = TileLayer::finite(3, 2);
        let report = layer
            .set_data("ground", &[1, 0, 99, 2 | FLIP_H, 99, 7], &reg)
            .unwrap();
        assert_eq!(report.placed, 2);
        assert_eq!(report.unresolved, vec![7, 99]);
        assert_eq!(layer.unresolved_gids().collect::<Vec<_>>(), vec![7, 99]);
        assert!(layer.tile_at(TileCoord::new(2, 0)).is_none());

        let flipped = layer.tile_at(TileCoord::new(0, 1)).unwrap();
        assert_eq!(flipped.gid(), 2);
        assert!(flipped.flip().horizontal);
        assert_eq!(flipped.id().raw(), 2 | FLIP_H);
    }

    #[test]
    fn queries_by_type_id_and_property() {
        let reg = registry();
        let mut layer = TileLayer::finite(2, 2);
        layer.set_data("ground", &[2, 3, 2 | FLIP_D, 1], &reg).unwrap();

        assert_eq!(layer.tiles_of_type("wall").len(), 2);
        let coords: Vec<_> = layer
            .tiles_with_global_id(2)
            .iter()
            .map(|t| t.coord())
            .collect();
        assert_eq!(coords, vec![TileCoord::new(0, 0), TileCoord::new(0, 1)]);
        assert_eq!(layer.tiles_with_property("solid", "true").len(), 1);
        assert_eq!(layer.tile_data_with_property("solid").len(), 1);
        assert!(layer.animated_tiles().is_empty());
    }

    #[test]
    fn add_remove_and_move_tiles() {
        let reg = registry();
        let mut layer = TileLayer::finite(4, 4);
        let c = TileCoord::new(3, 3);
        assert_eq!(layer.add_tile_at(c, TileId(4), &reg).unwrap().unwrap().gid(), 4);
        assert!(layer.add_tile_at(c, TileId(50), &reg).unwrap().is_none());
        assert!(layer.add_tile_at(TileCoord::new(4, 0), TileId(1), &reg).is_err());

        let removed = layer.remove_tile_at(c).unwrap();
        assert!(layer.tile_at(c).is_none());
        layer.set_tile(TileCoord::new(1, 2), Some(removed)).unwrap();
        assert_eq!(layer.tile_at(TileCoord::new(1, 2)).unwrap().coord(), TileCoord::new(1, 2));
    }

    #[test]
    fn chunked_layers_handle_negative_coordinates() {
        let reg = registry();
        let mut layer = TileLayer::chunked(4);
        let mut data = vec![0; 16];
        data[5] = 3;
        let report = layer
            .set_chunk_data("ground", TileCoord::new(-4, -4), 4, 4, &data, &reg)
            .unwrap();
        assert_eq!(report.placed, 1);

        let tile = layer.tile_at(TileCoord::new(-3, -3)).unwrap();
        assert_eq!(tile.gid(), 3);
        assert_eq!(tile.coord(), TileCoord::new(-3, -3));
        assert!(layer.is_valid(TileCoord::new(-1, -1)));
        assert!(!layer.is_valid(TileCoord::new(0, 0)));

        // allocates the chunk at (4, 0)
        layer.add_tile_at(TileCoord::new(5, 2), TileId(1), &reg).unwrap();
        assert_eq!(layer.chunks().len(), 2);
        assert_eq!(layer.tile_count(), 2);

        let err = layer
            .set_chunk_data("ground", TileCoord::new(0, -4), 4, 4, &[0; 15], &reg)
            .unwrap_err();
        assert!(matches!(err, MapError::SizeMismatch { .. }));
    }
}
