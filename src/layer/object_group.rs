use std::collections::BTreeMap;

use macroquad::prelude::{Color, Vec2};

use crate::layer::attributes::parse_hex_color;
use crate::properties::Properties;
use crate::spatial::{decode, MapGeometry, TileId};

/// Geometry of a free-form object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Rectangle,
    Ellipse,
    Point,
    /// Points relative to the object position.
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Text(String),
    /// Tile object referencing a global tile id (flip bits kept).
    Tile(TileId),
}

/// An object of an object group, positioned in map space.
#[derive(Debug, Clone, PartialEq)]
pub struct TileObject {
    pub id: u32,
    pub name: String,
    pub object_type: String,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl TileObject {
    pub fn new(id: u32, position: Vec2, shape: ObjectShape) -> Self {
        Self {
            id,
            name: String::new(),
            object_type: String::new(),
            position,
            size: Vec2::ZERO,
            rotation: 0.0,
            visible: true,
            shape,
            properties: Properties::new(),
        }
    }

    pub fn gid(&self) -> Option<TileId> {
        match self.shape {
            ObjectShape::Tile(id) => Some(id),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.shape {
            ObjectShape::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Color from the object's own `color` property.
    pub fn color_override(&self) -> Option<Color> {
        self.properties.get_string("color").and_then(parse_hex_color)
    }
}

/// Free-form objects keyed by their unique id.
#[derive(Debug, Clone, Default)]
pub struct ObjectGroup {
    objects: BTreeMap<u32, TileObject>,
}

impl ObjectGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object. Returns `None` if an object with the same id exists.
    pub(crate) fn add_object(&mut self, object: TileObject) -> Option<&TileObject> {
        use std::collections::btree_map::Entry;
        match self.objects.entry(object.id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => Some(slot.insert(object)),
        }
    }

    pub(crate) fn remove_object(&mut self, id: u32) -> Option<TileObject> {
        self.objects.remove(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &TileObject> + '_ {
        self.objects.values()
    }

    pub fn object(&self, id: u32) -> Option<&TileObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: u32) -> Option<&mut TileObject> {
        self.objects.get_mut(&id)
    }

    pub fn object_named(&self, name: &str) -> Option<&TileObject> {
        self.objects().find(|o| o.name == name)
    }

    pub fn objects_named(&self, name: &str) -> Vec<&TileObject> {
        self.objects().filter(|o| o.name == name).collect()
    }

    pub fn objects_of_type(&self, object_type: &str) -> Vec<&TileObject> {
        self.objects().filter(|o| o.object_type == object_type).collect()
    }

    pub fn objects_with_text(&self, text: &str) -> Vec<&TileObject> {
        self.objects().filter(|o| o.text() == Some(text)).collect()
    }

    pub fn text_objects(&self) -> Vec<&TileObject> {
        self.objects().filter(|o| o.text().is_some()).collect()
    }

    pub fn tile_objects(&self) -> Vec<&TileObject> {
        self.objects().filter(|o| o.gid().is_some()).collect()
    }

    /// Tile objects using this global id; flip bits are ignored on both sides.
    pub fn tile_objects_with_gid(&self, gid: u32) -> Vec<&TileObject> {
        let gid = decode(gid).gid;
        self.objects()
            .filter(|o| o.gid().map(TileId::clean) == Some(gid))
            .collect()
    }

    /// Non-empty object names, in id order.
    pub fn object_names(&self) -> Vec<&str> {
        self.objects()
            .map(|o| o.name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Where the object lands on screen (its map position projected).
    pub fn screen_position(&self, geometry: &MapGeometry, id: u32) -> Option<Vec2> {
        self.object(id).map(|o| geometry.pixel_to_screen(o.position))
    }
}
