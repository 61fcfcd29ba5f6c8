use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::debug;
use macroquad::prelude::{vec2, Color, Vec2};

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::layer::{
    Layer, LayerAttributes, LoadReport, RenderStatistics, Tile, TileObject,
};
use crate::loader::json_loader::decode_map_file;
use crate::properties::Properties;
use crate::render::DebugOverlay;
use crate::spatial::{MapGeometry, TileCoord, TileId};
use crate::tileset::{TileData, Tileset, TilesetRegistry};

/// A loaded map: geometry, tilesets and the layer tree.
///
/// Layers share the map geometry through an `Arc`; tile data is shared
/// between the tilesets and every tile placed from them.
#[derive(Debug)]
pub struct Map {
    geometry: Arc<MapGeometry>,
    tilesets: TilesetRegistry,
    layers: Vec<Layer>,
    config: MapConfig,
    properties: Properties,
    background_color: Option<Color>,
    infinite: bool,
}

impl Map {
    pub fn new(geometry: MapGeometry, config: MapConfig) -> Self {
        Self {
            geometry: Arc::new(geometry),
            tilesets: TilesetRegistry::new(),
            layers: Vec::new(),
            config,
            properties: Properties::new(),
            background_color: None,
            infinite: false,
        }
    }

    /// Tile layers created from now on store their tiles in chunks.
    pub fn into_infinite(mut self) -> Self {
        self.infinite = true;
        self
    }

    /// Load a Tiled JSON map with the default configuration.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with_config(path, MapConfig::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: MapConfig) -> anyhow::Result<Self> {
        let path = path.as_ref();
        decode_map_file(path, config).with_context(|| format!("Loading map {}", path.display()))
    }

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// Shared handle to the geometry, for building layers.
    pub fn geometry_handle(&self) -> Arc<MapGeometry> {
        self.geometry.clone()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Option<Color>) {
        self.background_color = color;
    }

    /// Map size in screen space.
    pub fn size_in_points(&self) -> Vec2 {
        self.geometry.size_in_points()
    }

    // -- tilesets

    pub fn tilesets(&self) -> &TilesetRegistry {
        &self.tilesets
    }

    /// Register a tileset for `[first_gid, first_gid + tile_count)`.
    pub fn add_tileset(&mut self, tileset: Tileset, first_gid: u32) -> Result<Arc<Tileset>> {
        self.tilesets.register(tileset, first_gid)
    }

    pub fn tile_data(&self, gid: u32) -> Option<Arc<TileData>> {
        self.tilesets.resolve(gid)
    }

    // -- layer construction

    /// Tile layer from an attribute dictionary; chunked for infinite maps.
    pub fn new_tile_layer(&self, attributes: &HashMap<String, String>) -> Result<Layer> {
        let attrs = LayerAttributes::from_map(attributes)?;
        Ok(if self.infinite {
            Layer::chunked_tiles(self.geometry_handle(), attrs, self.config.infinite_chunk_size)
        } else {
            Layer::tiles(self.geometry_handle(), attrs)
        })
    }

    pub fn new_object_group(&self, attributes: &HashMap<String, String>) -> Result<Layer> {
        let attrs = LayerAttributes::from_map(attributes)?;
        Ok(Layer::objects(self.geometry_handle(), attrs))
    }

    pub fn new_image_layer(&self, attributes: &HashMap<String, String>) -> Result<Layer> {
        let attrs = LayerAttributes::from_map(attributes)?;
        Ok(Layer::image(self.geometry_handle(), attrs))
    }

    pub fn new_group_layer(&self, attributes: &HashMap<String, String>) -> Result<Layer> {
        let attrs = LayerAttributes::from_map(attributes)?;
        Ok(Layer::group(self.geometry_handle(), attrs))
    }

    /// Append a top-level layer.
    ///
    /// The layer and its descendants are numbered depth-first after the
    /// highest index already in the map; its z position is
    /// `index * z_delta`.
    pub fn add_layer(&mut self, mut layer: Layer) -> &mut Layer {
        let index = self.last_index().map_or(0, |i| i + 1);
        layer.reindex(index);
        layer.set_z_position(index as f32 * self.config.z_delta);
        layer.set_parent_path(None);
        layer.set_anchor(vec2(self.config.layer_anchor[0], self.config.layer_anchor[1]));
        debug!("added layer '{}' at index {index}", layer.name());
        let pos = self.layers.partition_point(|l| l.index() <= index);
        self.layers.insert(pos, layer);
        &mut self.layers[pos]
    }

    /// Append `layer` to the group layer named `group`.
    ///
    /// The whole tree is renumbered depth-first afterwards, so layers that
    /// come after the group move up by the size of the inserted subtree.
    pub fn add_layer_to_group(&mut self, group: &str, layer: Layer) -> Result<()> {
        let z_delta = self.config.z_delta;
        find_layer_mut(&mut self.layers, group)
            .ok_or_else(|| MapError::LayerNotFound(group.to_owned()))?
            .add_child(layer, z_delta)?;
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        let z_delta = self.config.z_delta;
        let mut next = 0;
        for layer in &mut self.layers {
            let last = layer.reindex(next);
            layer.set_z_position(next as f32 * z_delta);
            next = last + 1;
        }
    }

    /// Detach a layer (at any depth) and tear it down.
    pub fn remove_layer(&mut self, name: &str) -> Result<Layer> {
        let mut removed = match self.layers.iter().position(|l| l.name() == name) {
            Some(pos) => self.layers.remove(pos),
            None => self
                .layers
                .iter_mut()
                .find_map(|l| {
                    let parent = l.find_mut_by(&|p| {
                        p.as_group().is_some_and(|g| g.child(name).is_some())
                    })?;
                    parent.remove_child(name).ok().flatten()
                })
                .ok_or_else(|| MapError::LayerNotFound(name.to_owned()))?,
        };
        removed.tear_down();
        Ok(removed)
    }

    // -- layer queries

    /// Top-level layers in index order.
    pub fn top_level_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Every layer, groups flattened depth-first, sorted by index.
    pub fn layers(&self) -> Vec<&Layer> {
        let mut out: Vec<&Layer> = self.layers.iter().flat_map(Layer::layers).collect();
        out.sort_by_key(|l| l.index());
        out
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers().into_iter().map(Layer::name).collect()
    }

    pub fn layer_named(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find_map(|l| l.find(name))
    }

    pub fn layer_named_mut(&mut self, name: &str) -> Option<&mut Layer> {
        find_layer_mut(&mut self.layers, name)
    }

    pub fn layer_at_index(&self, index: u32) -> Option<&Layer> {
        self.layers().into_iter().find(|l| l.index() == index)
    }

    pub fn layer_at_index_mut(&mut self, index: u32) -> Option<&mut Layer> {
        self.layers
            .iter_mut()
            .find_map(|l| l.find_mut_by(&|c| c.index() == index))
    }

    /// Slash-separated path of a layer, e.g. `world/props/crates`.
    pub fn layer_path(&self, name: &str) -> Option<&str> {
        self.layer_named(name).map(Layer::path)
    }

    /// Highest layer index, `None` for a map without layers.
    pub fn last_index(&self) -> Option<u32> {
        self.layers.iter().map(Layer::last_index).max()
    }

    pub fn tile_layers(&self) -> Vec<&Layer> {
        self.layers()
            .into_iter()
            .filter(|l| l.as_tiles().is_some())
            .collect()
    }

    pub fn object_groups(&self) -> Vec<&Layer> {
        self.layers()
            .into_iter()
            .filter(|l| l.as_objects().is_some())
            .collect()
    }

    // -- tile data

    /// Decode raw tile ids into the tile layer named `layer`.
    pub fn set_layer_data(&mut self, layer: &str, data: &[u32]) -> Result<LoadReport> {
        let target = find_layer_mut(&mut self.layers, layer)
            .ok_or_else(|| MapError::LayerNotFound(layer.to_owned()))?;
        target.set_layer_data(data, &self.tilesets)
    }

    /// Same as [`set_layer_data`](Self::set_layer_data), addressing the
    /// layer by index.
    pub fn set_layer_data_at(&mut self, index: u32, data: &[u32]) -> Result<LoadReport> {
        let target = self
            .layers
            .iter_mut()
            .find_map(|l| l.find_mut_by(&|c| c.index() == index))
            .ok_or_else(|| MapError::LayerNotFound(format!("#{index}")))?;
        target.set_layer_data(data, &self.tilesets)
    }

    /// Load one chunk into an infinite tile layer.
    pub fn set_chunk_data(
        &mut self,
        layer: &str,
        origin: TileCoord,
        width: u32,
        height: u32,
        data: &[u32],
    ) -> Result<LoadReport> {
        let target = find_layer_mut(&mut self.layers, layer)
            .ok_or_else(|| MapError::LayerNotFound(layer.to_owned()))?;
        target.set_chunk_data(origin, width, height, data, &self.tilesets)
    }

    pub fn add_tile_at(&mut self, layer: &str, coord: TileCoord, id: TileId) -> Result<Option<&Tile>> {
        let target = find_layer_mut(&mut self.layers, layer)
            .ok_or_else(|| MapError::LayerNotFound(layer.to_owned()))?;
        target.add_tile_at(coord, id, &self.tilesets)
    }

    /// Tiles at a coordinate across all tile layers, lowest index first.
    pub fn tiles_at(&self, coord: TileCoord) -> Vec<&Tile> {
        self.tile_layers()
            .into_iter()
            .filter_map(|l| l.tile_at(coord))
            .collect()
    }

    pub fn tiles_of_type(&self, tile_type: &str) -> Vec<&Tile> {
        self.tile_layers()
            .into_iter()
            .flat_map(|l| l.tiles_of_type(tile_type))
            .collect()
    }

    pub fn tiles_with_property(&self, name: &str, value: &str) -> Vec<&Tile> {
        self.tile_layers()
            .into_iter()
            .flat_map(|l| l.tiles_with_property(name, value))
            .collect()
    }

    pub fn animated_tiles(&self) -> Vec<&Tile> {
        self.tile_layers()
            .into_iter()
            .flat_map(Layer::animated_tiles)
            .collect()
    }

    /// Tile data with the property across all registered tilesets.
    pub fn tile_data_with_property(&self, name: &str) -> Vec<Arc<TileData>> {
        self.tilesets
            .iter()
            .flat_map(|(_, ts)| ts.tiles())
            .filter(|d| d.has_property(name))
            .cloned()
            .collect()
    }

    // -- objects

    pub fn objects_named(&self, name: &str) -> Vec<&TileObject> {
        self.object_groups()
            .into_iter()
            .filter_map(Layer::as_objects)
            .flat_map(|g| g.objects_named(name))
            .collect()
    }

    pub fn objects_of_type(&self, object_type: &str) -> Vec<&TileObject> {
        self.object_groups()
            .into_iter()
            .filter_map(Layer::as_objects)
            .flat_map(|g| g.objects_of_type(object_type))
            .collect()
    }

    pub fn object(&self, id: u32) -> Option<&TileObject> {
        self.object_groups()
            .into_iter()
            .filter_map(Layer::as_objects)
            .find_map(|g| g.object(id))
    }

    // -- coordinates

    /// Screen point at the center of a tile, without any layer offset.
    pub fn point_for_coordinate(&self, coord: TileCoord) -> Vec2 {
        self.geometry.tile_center(coord).floor()
    }

    pub fn coordinate_for_point(&self, point: Vec2) -> TileCoord {
        self.geometry.screen_to_tile(point)
    }

    // -- rendering

    /// Mark every layer as rendered. Returns how many changed state.
    pub fn finish_rendering(&mut self) -> usize {
        let mut changed = 0;
        visit_mut(&mut self.layers, &mut |l| {
            if l.finish_rendering() {
                changed += 1;
            }
        });
        changed
    }

    /// Statistics for every layer, in index order.
    pub fn render_statistics(&self) -> Vec<RenderStatistics> {
        self.layers()
            .into_iter()
            .map(Layer::render_statistics)
            .collect()
    }

    /// Debug overlay of a layer, created with the map's grid opacity on
    /// first use.
    pub fn ensure_debug_overlay(&mut self, layer: &str) -> Result<&mut DebugOverlay> {
        let opacity = self.config.grid_opacity;
        let target = find_layer_mut(&mut self.layers, layer)
            .ok_or_else(|| MapError::LayerNotFound(layer.to_owned()))?;
        let fresh = target.debug_overlay().is_none();
        let overlay = target.ensure_debug_overlay();
        if fresh {
            overlay.grid_opacity = opacity;
        }
        Ok(overlay)
    }
}

fn find_layer_mut<'a>(layers: &'a mut [Layer], name: &str) -> Option<&'a mut Layer> {
    layers.iter_mut().find_map(|l| l.find_mut(name))
}

fn visit_mut(layers: &mut [Layer], f: &mut dyn FnMut(&mut Layer)) {
    for layer in layers {
        f(layer);
        if let Some(group) = layer.as_group_mut() {
            visit_mut(group.children_mut(), f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::layer::{LayerState, ObjectShape};
    use crate::spatial::Orientation;

    fn attrs(name: &str) -> HashMap<String, String> {
        HashMap::from([("name".to_owned(), name.to_owned())])
    }

    fn map() -> Map {
        let geo = MapGeometry::new(Orientation::Orthogonal, 3, 3, 16, 16).unwrap();
        let mut map = Map::new(geo, MapConfig::default());
        let mut ts = Tileset::new("terrain", 16, 16, 4, 2).unwrap();
        ts.tile_mut(0).unwrap().set_tile_type("grass");
        map.add_tileset(ts, 1).unwrap();
        map
    }

    #[test]
    fn indices_follow_declaration_order_depth_first() {
        let mut map = map();
        let ground = map.new_tile_layer(&attrs("ground")).unwrap();
        map.add_layer(ground);

        let mut group = map.new_group_layer(&attrs("props")).unwrap();
        group.add_child(map.new_object_group(&attrs("crates")).unwrap(), 1.0).unwrap();
        map.add_layer(group);
        let decals = map.new_image_layer(&attrs("decals")).unwrap();
        map.add_layer_to_group("props", decals).unwrap();
        let top = map.new_tile_layer(&attrs("roof")).unwrap();
        map.add_layer(top);

        let order: Vec<_> = map.layers().iter().map(|l| (l.index(), l.name())).collect();
        assert_eq!(
            order,
            vec![(0, "ground"), (1, "props"), (2, "crates"), (3, "decals"), (4, "roof")]
        );
        assert_eq!(map.layer_path("decals"), Some("props/decals"));
        assert_eq!(map.layer_named("roof").unwrap().z_position(), 4.0);
        assert_eq!(map.layer_at_index(2).unwrap().name(), "crates");
    }

    #[test]
    fn adding_to_an_earlier_group_shifts_later_layers() {
        let mut map = map();
        let props = map.new_group_layer(&attrs("props")).unwrap();
        map.add_layer(props);
        let roof = map.new_tile_layer(&attrs("roof")).unwrap();
        map.add_layer(roof);
        let decals = map.new_image_layer(&attrs("decals")).unwrap();
        map.add_layer_to_group("props", decals).unwrap();

        let order: Vec<_> = map.layers().iter().map(|l| (l.index(), l.name())).collect();
        assert_eq!(order, vec![(0, "props"), (1, "decals"), (2, "roof")]);
        assert_eq!(map.layer_at_index(2).unwrap().name(), "roof");
        assert_eq!(map.layer_named("roof").unwrap().z_position(), 2.0);
        assert_eq!(map.last_index(), Some(2));
    }

    #[test]
    fn missing_name_attribute_is_rejected() {
        let map = map();
        let err = map.new_tile_layer(&HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn layer_data_by_name_and_index() {
        let mut map = map();
        let l = map.new_tile_layer(&attrs("ground")).unwrap();
        map.add_layer(l);
        let report = map.set_layer_data("ground", &[1, 0, 0, 0, 2, 0, 0, 0, 1]).unwrap();
        assert_eq!(report.placed, 3);
        assert_eq!(map.tiles_of_type("grass").len(), 2);

        let err = map.set_layer_data_at(0, &[1; 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeMismatch);
        assert_eq!(map.tiles_at(TileCoord::new(1, 1)).len(), 1);
        assert!(matches!(
            map.set_layer_data("nope", &[]),
            Err(MapError::LayerNotFound(_))
        ));
    }

    #[test]
    fn removal_tears_down_nested_layers() {
        let mut map = map();
        let mut group = map.new_group_layer(&attrs("props")).unwrap();
        group.add_child(map.new_object_group(&attrs("crates")).unwrap(), 1.0).unwrap();
        map.add_layer(group);

        let removed = map.remove_layer("crates").unwrap();
        assert_eq!(removed.state(), LayerState::TornDown);
        assert!(map.layer_named("crates").is_none());
        assert!(map.remove_layer("crates").is_err());
    }

    #[test]
    fn finish_rendering_reaches_every_layer_once() {
        let mut map = map();
        let mut group = map.new_group_layer(&attrs("props")).unwrap();
        let mut crates = map.new_object_group(&attrs("crates")).unwrap();
        crates
            .add_object(TileObject::new(1, vec2(0.0, 0.0), ObjectShape::Point))
            .unwrap();
        group.add_child(crates, 1.0).unwrap();
        group.add_child(map.new_object_group(&attrs("empty")).unwrap(), 1.0).unwrap();
        map.add_layer(group);

        // an object group without objects has nothing to draw yet
        assert_eq!(map.finish_rendering(), 2);
        assert_eq!(map.finish_rendering(), 0);
        assert_eq!(map.layer_named("empty").unwrap().state(), LayerState::Constructed);
    }

    #[test]
    fn debug_overlay_takes_the_configured_opacity() {
        let mut map = map();
        let l = map.new_tile_layer(&attrs("ground")).unwrap();
        map.add_layer(l);
        assert_eq!(map.ensure_debug_overlay("ground").unwrap().grid_opacity, 0.2);
        assert!(map.layer_named("ground").unwrap().debug_overlay().is_some());
    }
}
