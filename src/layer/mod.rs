//! Map layers.
//!
//! Every layer shares a set of common attributes (name, index, offset, ...)
//! and carries one of four payloads: tiles, free-form objects, an image, or
//! child layers. A layer moves through a small lifecycle:
//!
//! ```text
//! Constructed --(data attached)--> Populated --(finish_rendering)--> Rendered
//!      \_____________________________\______________________________\--> TornDown
//! ```
//!
//! Observers register a callback with [`Layer::subscribe`] and receive a
//! [`LayerEvent`] on every transition.

mod attributes;
mod group;
mod object_group;
mod tile_layer;

use std::fmt;
use std::sync::Arc;

use log::debug;
use macroquad::prelude::{vec2, Color, Vec2, GRAY};

use crate::error::{MapError, Result};
use crate::properties::Properties;
use crate::render::DebugOverlay;
use crate::spatial::{MapGeometry, TileAnchor, TileCoord, TileId};
use crate::tileset::{TileData, TilesetRegistry};

pub use attributes::{parse_hex_color, LayerAttributes};
pub use group::{GroupLayer, ImageLayer};
pub use object_group::{ObjectGroup, ObjectShape, TileObject};
pub use tile_layer::{LoadReport, Tile, TileLayer};

/// Lifecycle state of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerState {
    Constructed,
    Populated,
    Rendered,
    TornDown,
}

/// Notification sent to layer subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Populated,
    Rendered,
    TornDown,
    ChildAdded { name: String, index: u32 },
    ChildRemoved { name: String },
}

/// Callback registered with [`Layer::subscribe`].
pub type LayerListener = Box<dyn FnMut(&LayerEvent) + Send>;

/// Payload of a layer.
#[derive(Debug)]
pub enum LayerKind {
    Tiles(TileLayer),
    Objects(ObjectGroup),
    Image(ImageLayer),
    Group(GroupLayer),
}

impl LayerKind {
    /// Short lowercase name: `tile`, `object`, `image` or `group`.
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerKind::Tiles(_) => "tile",
            LayerKind::Objects(_) => "object",
            LayerKind::Image(_) => "image",
            LayerKind::Group(_) => "group",
        }
    }
}

/// Read-only diagnostics snapshot of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStatistics {
    pub index: u32,
    pub layer_type: &'static str,
    pub path: String,
    pub z_position: f32,
    /// Map size in tiles.
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub offset: Vec2,
    pub anchor: Vec2,
    pub tile_count: usize,
    pub object_count: usize,
    pub visible: bool,
}

/// A map layer. See the [module docs](self).
pub struct Layer {
    name: String,
    path: String,
    index: u32,
    z_position: f32,
    offset: Vec2,
    opacity: f32,
    visible: bool,
    color: Color,
    anchor: Vec2,
    properties: Properties,
    kind: LayerKind,
    state: LayerState,
    geometry: Arc<MapGeometry>,
    listeners: Vec<LayerListener>,
    debug: Option<DebugOverlay>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Layer {
    pub fn new(geometry: Arc<MapGeometry>, attributes: LayerAttributes, kind: LayerKind) -> Self {
        Self {
            path: attributes.name.clone(),
            name: attributes.name,
            index: 0,
            z_position: 0.0,
            offset: attributes.offset,
            opacity: attributes.opacity,
            visible: attributes.visible,
            color: attributes.color.unwrap_or(GRAY),
            anchor: vec2(0.5, 0.5),
            properties: Properties::new(),
            kind,
            state: LayerState::Constructed,
            geometry,
            listeners: Vec::new(),
            debug: None,
        }
    }

    /// Empty tile layer covering the whole map.
    pub fn tiles(geometry: Arc<MapGeometry>, attributes: LayerAttributes) -> Self {
        let tiles = TileLayer::finite(geometry.columns(), geometry.rows());
        Self::new(geometry, attributes, LayerKind::Tiles(tiles))
    }

    /// Empty tile layer of an infinite map.
    pub fn chunked_tiles(
        geometry: Arc<MapGeometry>,
        attributes: LayerAttributes,
        chunk_size: u32,
    ) -> Self {
        Self::new(geometry, attributes, LayerKind::Tiles(TileLayer::chunked(chunk_size)))
    }

    pub fn objects(geometry: Arc<MapGeometry>, attributes: LayerAttributes) -> Self {
        Self::new(geometry, attributes, LayerKind::Objects(ObjectGroup::new()))
    }

    pub fn image(geometry: Arc<MapGeometry>, attributes: LayerAttributes) -> Self {
        Self::new(geometry, attributes, LayerKind::Image(ImageLayer::new()))
    }

    pub fn group(geometry: Arc<MapGeometry>, attributes: LayerAttributes) -> Self {
        Self::new(geometry, attributes, LayerKind::Group(GroupLayer::new()))
    }

    // -- common attributes

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-separated names from the top-level ancestor down to this layer.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Draw-order key; lower indices draw first.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Z position relative to the parent (or the map for top-level layers).
    pub fn z_position(&self) -> f32 {
        self.z_position
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn geometry(&self) -> &Arc<MapGeometry> {
        &self.geometry
    }

    /// Number this layer and its descendants depth-first from `start`.
    /// Returns the last index used.
    pub(crate) fn reindex(&mut self, start: u32) -> u32 {
        self.index = start;
        let mut last = start;
        if let LayerKind::Group(group) = &mut self.kind {
            for child in group.children_mut() {
                last = child.reindex(last + 1);
            }
        }
        last
    }

    pub(crate) fn set_z_position(&mut self, z: f32) {
        self.z_position = z;
    }

    pub(crate) fn set_anchor(&mut self, anchor: Vec2) {
        self.anchor = anchor;
        if let LayerKind::Group(group) = &mut self.kind {
            for child in group.children_mut() {
                child.set_anchor(anchor);
            }
        }
    }

    pub(crate) fn set_parent_path(&mut self, parent: Option<&str>) {
        self.path = match parent {
            Some(p) => format!("{p}/{}", self.name),
            None => self.name.clone(),
        };
        if let LayerKind::Group(group) = &mut self.kind {
            let path = self.path.clone();
            for child in group.children_mut() {
                child.set_parent_path(Some(&path));
            }
        }
    }

    // -- payload access

    pub fn as_tiles(&self) -> Option<&TileLayer> {
        match &self.kind {
            LayerKind::Tiles(t) => Some(t),
            _ => None,
        }
    }

    /// Per-tile flags (visibility, highlight, flip) can be edited through
    /// the returned layer; bulk changes go through [`Layer`] methods.
    pub fn as_tiles_mut(&mut self) -> Option<&mut TileLayer> {
        match &mut self.kind {
            LayerKind::Tiles(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&ObjectGroup> {
        match &self.kind {
            LayerKind::Objects(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_objects_mut(&mut self) -> Option<&mut ObjectGroup> {
        match &mut self.kind {
            LayerKind::Objects(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.kind {
            LayerKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupLayer> {
        match &self.kind {
            LayerKind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupLayer> {
        match &mut self.kind {
            LayerKind::Group(g) => Some(g),
            _ => None,
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.state == LayerState::TornDown {
            return Err(MapError::LayerTornDown(self.name.clone()));
        }
        Ok(())
    }

    fn tiles_for_update(&mut self) -> Result<&mut TileLayer> {
        self.ensure_alive()?;
        match &mut self.kind {
            LayerKind::Tiles(t) => Ok(t),
            other => Err(wrong_type(&self.name, other, "tile")),
        }
    }

    fn objects_for_update(&mut self) -> Result<&mut ObjectGroup> {
        self.ensure_alive()?;
        match &mut self.kind {
            LayerKind::Objects(o) => Ok(o),
            other => Err(wrong_type(&self.name, other, "object")),
        }
    }

    fn group_for_update(&mut self) -> Result<&mut GroupLayer> {
        self.ensure_alive()?;
        match &mut self.kind {
            LayerKind::Group(g) => Ok(g),
            other => Err(wrong_type(&self.name, other, "group")),
        }
    }

    // -- lifecycle

    /// Register a callback for this layer's events. It lives as long as the
    /// layer and is dropped on tear-down.
    pub fn subscribe(&mut self, listener: impl FnMut(&LayerEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: LayerEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    fn mark_populated(&mut self) {
        if self.state == LayerState::Constructed {
            self.state = LayerState::Populated;
            self.emit(LayerEvent::Populated);
        }
    }

    /// Record that the layer's content was drawn for the first time.
    ///
    /// Only a populated layer moves to Rendered. Returns `true` on that
    /// transition; a layer still waiting for data, an already rendered layer
    /// and a torn-down layer are left alone.
    pub fn finish_rendering(&mut self) -> bool {
        match self.state {
            LayerState::Populated => {
                self.state = LayerState::Rendered;
                self.emit(LayerEvent::Rendered);
                true
            }
            LayerState::Constructed | LayerState::Rendered | LayerState::TornDown => false,
        }
    }

    /// Release all tiles, objects and children. Returns `false` if the
    /// layer was already torn down.
    pub fn tear_down(&mut self) -> bool {
        if self.state == LayerState::TornDown {
            return false;
        }
        match &mut self.kind {
            LayerKind::Tiles(t) => t.clear(),
            LayerKind::Objects(o) => o.clear(),
            LayerKind::Image(i) => i.clear(),
            LayerKind::Group(g) => {
                for mut child in g.take_all() {
                    child.tear_down();
                }
            }
        }
        self.debug = None;
        self.state = LayerState::TornDown;
        self.emit(LayerEvent::TornDown);
        self.listeners.clear();
        true
    }

    // -- tile data

    /// Decode a full row-major array of raw tile ids into this layer.
    ///
    /// Fails with a size mismatch (leaving the layer untouched) when the
    /// array length differs from `columns * rows`. Ids no tileset claims are
    /// skipped and listed in the returned report.
    pub fn set_layer_data(&mut self, data: &[u32], registry: &TilesetRegistry) -> Result<LoadReport> {
        let name = self.name.clone();
        let report = self.tiles_for_update()?.set_data(&name, data, registry)?;
        debug!("layer '{name}' populated with {} tiles", report.placed);
        self.mark_populated();
        Ok(report)
    }

    /// Load one chunk of an infinite tile layer.
    pub fn set_chunk_data(
        &mut self,
        origin: TileCoord,
        width: u32,
        height: u32,
        data: &[u32],
        registry: &TilesetRegistry,
    ) -> Result<LoadReport> {
        let name = self.name.clone();
        let report = self
            .tiles_for_update()?
            .set_chunk_data(&name, origin, width, height, data, registry)?;
        debug!(
            "layer '{name}' chunk at {origin} populated with {} tiles",
            report.placed
        );
        self.mark_populated();
        Ok(report)
    }

    /// Place a tile by global id. `Ok(None)` if the id does not resolve.
    pub fn add_tile_at(
        &mut self,
        coord: TileCoord,
        id: TileId,
        registry: &TilesetRegistry,
    ) -> Result<Option<&Tile>> {
        let added = self
            .tiles_for_update()?
            .add_tile_at(coord, id, registry)?
            .is_some();
        if added {
            self.mark_populated();
        }
        Ok(self.tile_at(coord).filter(|_| added))
    }

    pub fn remove_tile_at(&mut self, coord: TileCoord) -> Result<Option<Tile>> {
        Ok(self.tiles_for_update()?.remove_tile_at(coord))
    }

    /// Put an existing tile at `coord` (or clear it with `None`).
    pub fn set_tile(&mut self, coord: TileCoord, tile: Option<Tile>) -> Result<Option<Tile>> {
        self.tiles_for_update()?.set_tile(coord, tile)
    }

    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        self.as_tiles().and_then(|t| t.tile_at(coord))
    }

    pub fn tiles_of_type(&self, tile_type: &str) -> Vec<&Tile> {
        self.as_tiles()
            .map(|t| t.tiles_of_type(tile_type))
            .unwrap_or_default()
    }

    pub fn tiles_with_global_id(&self, gid: u32) -> Vec<&Tile> {
        self.as_tiles()
            .map(|t| t.tiles_with_global_id(gid))
            .unwrap_or_default()
    }

    pub fn tiles_with_property(&self, name: &str, value: &str) -> Vec<&Tile> {
        self.as_tiles()
            .map(|t| t.tiles_with_property(name, value))
            .unwrap_or_default()
    }

    pub fn animated_tiles(&self) -> Vec<&Tile> {
        self.as_tiles().map(TileLayer::animated_tiles).unwrap_or_default()
    }

    pub fn tile_data_with_property(&self, name: &str) -> Vec<Arc<TileData>> {
        self.as_tiles()
            .map(|t| t.tile_data_with_property(name))
            .unwrap_or_default()
    }

    // -- objects

    /// Add an object. `Ok(None)` if an object with the same id exists.
    pub fn add_object(&mut self, object: TileObject) -> Result<Option<&TileObject>> {
        let id = object.id;
        let added = self.objects_for_update()?.add_object(object).is_some();
        if added {
            self.mark_populated();
        }
        Ok(self
            .as_objects()
            .and_then(|o| o.object(id))
            .filter(|_| added))
    }

    pub fn remove_object(&mut self, id: u32) -> Result<Option<TileObject>> {
        Ok(self.objects_for_update()?.remove_object(id))
    }

    /// Color used to draw an object: its own `color` property, else the
    /// layer color.
    pub fn object_color(&self, object: &TileObject) -> Color {
        object.color_override().unwrap_or(self.color)
    }

    // -- image

    pub fn set_image(&mut self, image: impl Into<String>, width: u32, height: u32) -> Result<()> {
        self.ensure_alive()?;
        match &mut self.kind {
            LayerKind::Image(i) => i.set_image(image, width, height),
            other => return Err(wrong_type(&self.name, other, "image")),
        }
        self.mark_populated();
        Ok(())
    }

    // -- groups

    /// Append a child. It gets the next free index in this subtree and a z
    /// position of `z_delta / 2` per existing sibling. The first child
    /// populates the group.
    pub fn add_child(&mut self, mut child: Layer, z_delta: f32) -> Result<()> {
        let index = self.last_index() + 1;
        let path = self.path.clone();
        let anchor = self.anchor;
        let group = self.group_for_update()?;
        let z = (z_delta / 2.0) * group.len() as f32;

        child.reindex(index);
        child.set_z_position(z);
        child.set_parent_path(Some(&path));
        child.set_anchor(anchor);
        let name = child.name.clone();
        group.push(child);
        debug!("added layer '{name}' to group '{}' at index {index}", self.name);
        self.emit(LayerEvent::ChildAdded { name, index });
        self.mark_populated();
        Ok(())
    }

    /// Detach a direct child by name.
    pub fn remove_child(&mut self, name: &str) -> Result<Option<Layer>> {
        let removed = self.group_for_update()?.remove(name).map(|mut child| {
            child.set_parent_path(None);
            child
        });
        if removed.is_some() {
            self.emit(LayerEvent::ChildRemoved {
                name: name.to_owned(),
            });
        }
        Ok(removed)
    }

    /// This layer and all descendants, sorted by index.
    pub fn layers(&self) -> Vec<&Layer> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out.sort_by_key(|l| l.index);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Layer>) {
        out.push(self);
        if let LayerKind::Group(group) = &self.kind {
            for child in group.children() {
                child.collect(out);
            }
        }
    }

    /// Highest index in this layer's subtree.
    pub fn last_index(&self) -> u32 {
        self.layers().iter().map(|l| l.index).max().unwrap_or(self.index)
    }

    /// Find a layer in this subtree by name.
    pub fn find(&self, name: &str) -> Option<&Layer> {
        if self.name == name {
            return Some(self);
        }
        self.as_group()?.children().iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.find_mut_by(&|l| l.name == name)
    }

    /// First layer in this subtree (depth-first) matching `pred`.
    pub fn find_mut_by(&mut self, pred: &dyn Fn(&Layer) -> bool) -> Option<&mut Layer> {
        if pred(self) {
            return Some(self);
        }
        match &mut self.kind {
            LayerKind::Group(g) => g
                .children_mut()
                .iter_mut()
                .find_map(|c| c.find_mut_by(pred)),
            _ => None,
        }
    }

    // -- coordinates

    /// True if the coordinate holds (or could hold) a tile of this layer.
    pub fn is_valid(&self, coord: TileCoord) -> bool {
        match &self.kind {
            LayerKind::Tiles(t) => t.is_valid(coord),
            _ => self.geometry.is_valid(coord),
        }
    }

    /// Screen point at the center of a tile, with the layer offset applied.
    pub fn point_for_coordinate(&self, coord: TileCoord) -> Vec2 {
        self.point_for_coordinate_anchored(coord, TileAnchor::Center)
    }

    pub fn point_for_coordinate_anchored(&self, coord: TileCoord, anchor: TileAnchor) -> Vec2 {
        self.geometry.tile_anchor(coord, anchor).floor() + self.offset
    }

    /// Where a tile is drawn: its center with the layer offset and the
    /// owning tileset's tile offset applied.
    pub fn tile_position(&self, tile: &Tile) -> Vec2 {
        self.point_for_coordinate(tile.coord()) + tile.data().tile_offset()
    }

    /// Tile under a screen point, with the layer offset removed.
    pub fn coordinate_for_point(&self, point: Vec2) -> TileCoord {
        self.geometry.screen_to_tile(point - self.offset)
    }

    // -- diagnostics

    pub fn render_statistics(&self) -> RenderStatistics {
        RenderStatistics {
            index: self.index,
            layer_type: self.kind.type_name(),
            path: self.path.clone(),
            z_position: self.z_position,
            width: self.geometry.columns(),
            height: self.geometry.rows(),
            tile_width: self.geometry.tile_width(),
            tile_height: self.geometry.tile_height(),
            offset: self.offset,
            anchor: self.anchor,
            tile_count: self.as_tiles().map_or(0, TileLayer::tile_count),
            object_count: self.as_objects().map_or(0, ObjectGroup::len),
            visible: self.visible,
        }
    }

    /// Debug overlay for this layer, created on the first call.
    pub fn ensure_debug_overlay(&mut self) -> &mut DebugOverlay {
        self.debug.get_or_insert_with(DebugOverlay::default)
    }

    pub fn debug_overlay(&self) -> Option<&DebugOverlay> {
        self.debug.as_ref()
    }
}

fn wrong_type(layer: &str, kind: &LayerKind, expected: &'static str) -> MapError {
    MapError::WrongLayerType {
        layer: layer.to_owned(),
        expected,
        actual: kind.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spatial::Orientation;
    use crate::tileset::Tileset;
    use std::sync::Mutex;

    fn geometry() -> Arc<MapGeometry> {
        Arc::new(MapGeometry::new(Orientation::Orthogonal, 4, 4, 16, 16).unwrap())
    }

    fn registry() -> TilesetRegistry {
        let mut reg = TilesetRegistry::new();
        reg.register(Tileset::new("terrain", 16, 16, 4, 2).unwrap(), 1).unwrap();
        reg
    }

    #[test]
    fn lifecycle_events_fire_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut layer = Layer::tiles(geometry(), LayerAttributes::named("ground"));
        layer.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        assert_eq!(layer.state(), LayerState::Constructed);
        layer.set_layer_data(&[1; 16], &registry()).unwrap();
        layer.set_layer_data(&[2; 16], &registry()).unwrap();
        assert_eq!(layer.state(), LayerState::Populated);

        assert!(layer.finish_rendering());
        assert!(!layer.finish_rendering());
        assert_eq!(layer.state(), LayerState::Rendered);

        assert!(layer.tear_down());
        assert!(!layer.tear_down());
        assert_eq!(
            *events.lock().unwrap(),
            vec![LayerEvent::Populated, LayerEvent::Rendered, LayerEvent::TornDown]
        );
    }

    #[test]
    fn torn_down_layers_refuse_mutation() {
        let mut layer = Layer::tiles(geometry(), LayerAttributes::named("ground"));
        layer.set_layer_data(&[1; 16], &registry()).unwrap();
        layer.tear_down();
        assert_eq!(layer.as_tiles().unwrap().tile_count(), 0);

        let err = layer.set_layer_data(&[1; 16], &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lifecycle);
        assert!(layer.remove_tile_at(TileCoord::new(0, 0)).is_err());
        assert!(!layer.finish_rendering());
    }

    #[test]
    fn rendering_waits_for_data() {
        let mut layer = Layer::tiles(geometry(), LayerAttributes::named("ground"));
        assert!(!layer.finish_rendering());
        assert_eq!(layer.state(), LayerState::Constructed);

        layer.set_layer_data(&[0; 16], &registry()).unwrap();
        assert!(layer.finish_rendering());
        assert_eq!(layer.state(), LayerState::Rendered);
    }

    #[test]
    fn first_child_populates_a_group() {
        let geo = geometry();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut group = Layer::group(geo.clone(), LayerAttributes::named("world"));
        group.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        group
            .add_child(Layer::image(geo.clone(), LayerAttributes::named("sky")), 1.0)
            .unwrap();
        group
            .add_child(Layer::image(geo, LayerAttributes::named("hills")), 1.0)
            .unwrap();

        assert_eq!(group.state(), LayerState::Populated);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                LayerEvent::ChildAdded { name: "sky".into(), index: 1 },
                LayerEvent::Populated,
                LayerEvent::ChildAdded { name: "hills".into(), index: 2 },
            ]
        );
    }

    #[test]
    fn wrong_payload_is_a_configuration_error() {
        let mut layer = Layer::objects(geometry(), LayerAttributes::named("things"));
        let err = layer.set_layer_data(&[0; 16], &registry()).unwrap_err();
        assert!(matches!(
            err,
            MapError::WrongLayerType { expected: "tile", actual: "object", .. }
        ));
        assert_eq!(layer.state(), LayerState::Constructed);
    }

    #[test]
    fn groups_index_children_and_flatten() {
        let geo = geometry();
        let mut group = Layer::group(geo.clone(), LayerAttributes::named("world"));
        group.reindex(1);
        let mut inner = Layer::group(geo.clone(), LayerAttributes::named("props"));
        inner
            .add_child(Layer::objects(geo.clone(), LayerAttributes::named("crates")), 1.0)
            .unwrap();
        group
            .add_child(Layer::tiles(geo.clone(), LayerAttributes::named("floor")), 1.0)
            .unwrap();
        group.add_child(inner, 1.0).unwrap();

        let names: Vec<_> = group.layers().iter().map(|l| (l.index(), l.path().to_owned())).collect();
        assert_eq!(
            names,
            vec![
                (1, "world".to_owned()),
                (2, "world/floor".to_owned()),
                (3, "world/props".to_owned()),
                (4, "world/props/crates".to_owned()),
            ]
        );
        assert_eq!(group.find("props").unwrap().z_position(), 0.5);
        assert_eq!(group.last_index(), 4);

        let removed = group.remove_child("floor").unwrap().unwrap();
        assert_eq!(removed.path(), "floor");
        assert!(group.remove_child("floor").unwrap().is_none());
    }

    #[test]
    fn point_and_coordinate_apply_the_offset() {
        let mut attrs = LayerAttributes::named("ground");
        attrs.offset = vec2(4.0, -8.0);
        let layer = Layer::tiles(geometry(), attrs);
        let c = TileCoord::new(2, 3);
        let p = layer.point_for_coordinate(c);
        assert_eq!(p, vec2(44.0, 48.0));
        assert_eq!(layer.coordinate_for_point(p), c);
        assert_eq!(
            layer.point_for_coordinate_anchored(c, TileAnchor::TopLeft),
            vec2(36.0, 40.0)
        );
    }

    #[test]
    fn tile_position_adds_the_tileset_offset() {
        let mut reg = TilesetRegistry::new();
        reg.register(
            Tileset::new("tall", 16, 16, 4, 2)
                .unwrap()
                .with_tile_offset(vec2(0.0, 8.0)),
            1,
        )
        .unwrap();
        let mut layer = Layer::tiles(geometry(), LayerAttributes::named("ground"));
        let mut data = [0; 16];
        data[0] = 1;
        layer.set_layer_data(&data, &reg).unwrap();

        let tile = layer.tile_at(TileCoord::new(0, 0)).unwrap();
        assert_eq!(layer.point_for_coordinate(tile.coord()), vec2(8.0, 8.0));
        assert_eq!(layer.tile_position(tile), vec2(8.0, 16.0));
    }

    #[test]
    fn render_statistics_snapshot() {
        let mut layer = Layer::tiles(geometry(), LayerAttributes::named("ground"));
        let mut data = [0; 16];
        data[0] = 1;
        data[5] = 3;
        layer.set_layer_data(&data, &registry()).unwrap();
        let stats = layer.render_statistics();
        assert_eq!(stats.tile_count, 2);
        assert_eq!(stats.object_count, 0);
        assert_eq!((stats.width, stats.height), (4, 4));
        assert_eq!(stats.layer_type, "tile");
        assert!(stats.visible);
    }

    #[test]
    fn debug_overlay_is_created_on_request() {
        let mut layer = Layer::image(geometry(), LayerAttributes::named("sky"));
        assert!(layer.debug_overlay().is_none());
        layer.ensure_debug_overlay().show_grid = true;
        assert!(layer.debug_overlay().unwrap().show_grid);
    }
}
