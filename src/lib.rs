//! Tiled map layers for Macroquad: tile storage, tilesets and coordinate
//! projections for orthogonal, isometric, staggered and hexagonal maps.
//!
//! ```no_run
//! use tiled_layers::{Map, TileCoord};
//!
//! let map = Map::load("assets/map.json")?;
//! let ground = map.layer_named("ground").expect("ground layer");
//! let center = ground.point_for_coordinate(TileCoord::new(3, 4));
//! assert_eq!(ground.coordinate_for_point(center), TileCoord::new(3, 4));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;
mod error;
pub mod layer;
mod loader {
    pub mod json_loader;
}
mod map;
mod properties;
pub mod render;
pub mod spatial;
mod tileset;

pub use config::MapConfig;
pub use error::{ErrorKind, MapError, Result};
pub use layer::{
    Layer, LayerAttributes, LayerEvent, LayerKind, LayerState, ObjectShape, RenderStatistics,
    Tile, TileObject,
};
pub use loader::json_loader::{decode_map_file, decode_map_str};
pub use map::Map;
pub use properties::Properties;
pub use spatial::{MapGeometry, Orientation, StaggerAxis, StaggerParity, TileAnchor, TileCoord, TileId};
pub use tileset::{AnimationFrame, TileData, Tileset, TilesetRegistry};
