use std::collections::HashMap;

use crate::error::{MapError, Result};
use crate::spatial::{SparseTileGrid, TileCoord};

/// Position of a chunk in chunk units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

/// Chunk that contains a tile, for chunks of `size` tiles square.
#[inline]
pub fn tile_to_chunk(coord: TileCoord, size: i32) -> ChunkCoord {
    ChunkCoord {
        x: coord.x.div_euclid(size),
        y: coord.y.div_euclid(size),
    }
}

/// One loaded rectangle of an infinite layer.
#[derive(Debug, Clone)]
pub struct TileChunk<T> {
    origin: TileCoord,
    grid: SparseTileGrid<T>,
}

impl<T> TileChunk<T> {
    pub fn new(origin: TileCoord, width: usize, height: usize) -> Self {
        Self {
            origin,
            grid: SparseTileGrid::new(width, height),
        }
    }

    pub fn origin(&self) -> TileCoord {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.grid.columns()
    }

    pub fn height(&self) -> usize {
        self.grid.rows()
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.grid.contains(coord.x - self.origin.x, coord.y - self.origin.y)
    }

    /// Converts a layer coordinate into this chunk's local coordinate.
    pub fn local(&self, coord: TileCoord) -> TileCoord {
        TileCoord::new(coord.x - self.origin.x, coord.y - self.origin.y)
    }

    pub fn get(&self, coord: TileCoord) -> Result<Option<&T>> {
        let l = self.local(coord);
        self.grid.get(l.x, l.y)
    }

    pub fn set(&mut self, coord: TileCoord, value: Option<T>) -> Result<Option<T>> {
        let l = self.local(coord);
        self.grid.set(l.x, l.y, value)
    }

    pub fn grid(&self) -> &SparseTileGrid<T> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut SparseTileGrid<T> {
        &mut self.grid
    }
}

/// Chunks of an infinite layer, bucketed by chunk coordinate.
///
/// Tiled writes chunks aligned to a fixed chunk size, so a coordinate can be
/// looked up with a single `div_euclid` followed by a hash lookup.
#[derive(Debug, Clone)]
pub struct ChunkMap<T> {
    chunk_size: i32,
    chunks: HashMap<ChunkCoord, TileChunk<T>>,
}

impl<T> ChunkMap<T> {
    pub fn new(chunk_size: u32) -> Self {
        Self {
            chunk_size: chunk_size.max(1) as i32,
            chunks: HashMap::new(),
        }
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Insert a chunk, replacing any chunk with the same key.
    ///
    /// The chunk origin must be aligned to the chunk size and the chunk must
    /// not be larger than it.
    pub fn insert(&mut self, chunk: TileChunk<T>) -> Result<Option<TileChunk<T>>> {
        let origin = chunk.origin();
        let size = self.chunk_size as usize;
        if origin.x.rem_euclid(self.chunk_size) != 0
            || origin.y.rem_euclid(self.chunk_size) != 0
            || chunk.width() > size
            || chunk.height() > size
        {
            return Err(MapError::InvalidMap(format!(
                "chunk at {origin} ({}x{}) is not aligned to chunk size {}",
                chunk.width(),
                chunk.height(),
                self.chunk_size
            )));
        }
        let key = tile_to_chunk(origin, self.chunk_size);
        Ok(self.chunks.insert(key, chunk))
    }

    pub fn chunk_for(&self, coord: TileCoord) -> Option<&TileChunk<T>> {
        self.chunks
            .get(&tile_to_chunk(coord, self.chunk_size))
            .filter(|c| c.contains(coord))
    }

    pub fn chunk_for_mut(&mut self, coord: TileCoord) -> Option<&mut TileChunk<T>> {
        self.chunks
            .get_mut(&tile_to_chunk(coord, self.chunk_size))
            .filter(|c| c.contains(coord))
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.chunk_for(coord).is_some()
    }

    /// Chunks sorted by position (row first) for stable iteration.
    pub fn chunks(&self) -> Vec<&TileChunk<T>> {
        let mut out: Vec<_> = self.chunks.iter().collect();
        out.sort_by_key(|(c, _)| (c.y, c.x));
        out.into_iter().map(|(_, chunk)| chunk).collect()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut TileChunk<T>> + '_ {
        self.chunks.values_mut()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
