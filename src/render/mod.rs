mod cull;
mod debug;

pub use cull::{camera_bounds, visible_tile_range, visible_tiles};
pub use debug::{bounds_polygon, draw_layer_debug, grid_segments, tile_outline, DebugOverlay};
