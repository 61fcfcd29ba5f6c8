use serde::Deserialize;

/// Map-wide settings that are not part of the map file itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Z distance between consecutive layer indices.
    #[serde(default = "one")]
    pub z_delta: f32,
    /// Skip custom properties while loading.
    #[serde(default)]
    pub ignore_properties: bool,
    /// Opacity of the debug grid overlay.
    #[serde(default = "default_grid_opacity")]
    pub grid_opacity: f32,
    /// Chunk edge (in tiles) used for infinite layers when a chunk omits its size.
    #[serde(default = "default_chunk_size")]
    pub infinite_chunk_size: u32,
    /// Alignment of layers relative to the map origin, reported in render statistics.
    #[serde(default = "default_layer_anchor")]
    pub layer_anchor: [f32; 2],
}

fn one() -> f32 {
    1.0
}
fn default_grid_opacity() -> f32 {
    0.2
}
fn default_chunk_size() -> u32 {
    16
}
fn default_layer_anchor() -> [f32; 2] {
    [0.5, 0.5]
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            z_delta: one(),
            ignore_properties: false,
            grid_opacity: default_grid_opacity(),
            infinite_chunk_size: default_chunk_size(),
            layer_anchor: default_layer_anchor(),
        }
    }
}
