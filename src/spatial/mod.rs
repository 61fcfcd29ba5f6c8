mod chunk;
mod gid;
mod grid;
mod projection;

pub use chunk::{tile_to_chunk, ChunkCoord, ChunkMap, TileChunk};
pub use gid::{decode, encode, DecodedGid, FlipFlags, TileId, FLIP_D, FLIP_H, FLIP_MASK, FLIP_V, GID_MASK};
pub use grid::SparseTileGrid;
pub use projection::{
    MapGeometry, Orientation, StaggerAxis, StaggerParity, TileAnchor, TileCoord,
};
