// Tiled JSON (.tmj / .json) -> Map
use crate::config::MapConfig;
use crate::error::MapError;
use crate::layer::{parse_hex_color, Layer, LayerAttributes, ObjectShape, TileObject};
use crate::map::Map;
use crate::properties::Properties;
use crate::spatial::{MapGeometry, Orientation, StaggerAxis, StaggerParity, TileCoord, TileId};
use crate::tileset::{AnimationFrame, Tileset};
use log::{info, warn};
use macroquad::prelude::vec2;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLayerData {
    Ids(Vec<u32>),
    Encoded(String),
}

#[derive(Deserialize)]
struct JsonChunk {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    data: JsonLayerData,
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default = "default_layer_type")]
    kind: String,
    #[serde(default)]
    data: Option<JsonLayerData>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    chunks: Vec<JsonChunk>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    repeatx: bool,
    #[serde(default)]
    repeaty: bool,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

fn default_layer_type() -> String {
    "tilelayer".to_owned()
}
fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    embedded: JsonTileset,
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    orientation: Orientation,
    #[serde(default)]
    staggeraxis: Option<StaggerAxis>,
    #[serde(default)]
    staggerindex: Option<StaggerParity>,
    #[serde(default)]
    hexsidelength: u32,
    #[serde(default)]
    infinite: bool,
    #[serde(default)]
    backgroundcolor: Option<String>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize, Default)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tilewidth: u32,
    #[serde(default)]
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    tileoffset: Option<JsonObjectPoint>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    ellipse: bool,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    text: Option<JsonText>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct JsonText {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
}

/// Typed Tiled properties are flattened to strings; [`Properties`] parses
/// them back on access.
fn json_property_to_string(prop: JsonProperty) -> Result<Option<(String, String)>, MapError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(|b| b.to_string()),
        Some("int") | Some("object") => value.as_i64().map(|n| n.to_string()),
        Some("float") => value.as_f64().map(|n| n.to_string()),
        Some("string") | Some("file") | Some("color") => value.as_str().map(str::to_owned),
        Some("class") => Some(value.to_string()),
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => match &value {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Bool(_) | JsonValue::Number(_) => Some(value.to_string()),
            _ => None,
        },
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(
    props: Vec<JsonProperty>,
    config: &MapConfig,
) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    if config.ignore_properties {
        return Ok(out);
    }
    for p in props {
        if let Some((name, value)) = json_property_to_string(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

fn object_from_json(obj: JsonObject, config: &MapConfig) -> Result<TileObject, MapError> {
    let shape = if let Some(gid) = obj.gid {
        ObjectShape::Tile(TileId(gid))
    } else if obj.point {
        ObjectShape::Point
    } else if obj.ellipse {
        ObjectShape::Ellipse
    } else if let Some(text) = obj.text {
        ObjectShape::Text(text.text)
    } else if !obj.polygon.is_empty() {
        ObjectShape::Polygon(obj.polygon.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else if !obj.polyline.is_empty() {
        ObjectShape::Polyline(obj.polyline.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else {
        ObjectShape::Rectangle
    };

    let object_type = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    let mut out = TileObject::new(obj.id, vec2(obj.x, obj.y), shape);
    out.name = obj.name;
    out.object_type = object_type;
    out.size = vec2(obj.width, obj.height);
    out.rotation = obj.rotation;
    out.visible = obj.visible;
    out.properties = properties_from_json(obj.properties, config)?;
    Ok(out)
}

fn tileset_from_json(
    ts: JsonTileset,
    fallback_name: &str,
    config: &MapConfig,
) -> Result<Tileset, MapError> {
    let name = if ts.name.is_empty() {
        fallback_name.to_owned()
    } else {
        ts.name
    };
    let mut out = Tileset::new(name, ts.tilewidth, ts.tileheight, ts.tilecount, ts.columns)?
        .with_layout(ts.spacing, ts.margin);
    if let Some(image) = ts.image {
        out = out.with_image(image);
    }
    if let Some(off) = ts.tileoffset {
        out = out.with_tile_offset(vec2(off.x, off.y));
    }
    *out.properties_mut() = properties_from_json(ts.properties, config)?;

    for tile in ts.tiles {
        let properties = properties_from_json(tile.properties, config)?;
        let set_name = out.name().to_owned();
        let Some(data) = out.tile_mut(tile.id) else {
            warn!("tileset '{set_name}': metadata for tile {} is outside the tile count", tile.id);
            continue;
        };
        if let Some(kind) = tile.class.or(tile.kind).filter(|k| !k.is_empty()) {
            data.set_tile_type(kind);
        }
        *data.properties_mut() = properties;
        if !tile.animation.is_empty() {
            data.set_animation(
                tile.animation
                    .into_iter()
                    .map(|f| AnimationFrame {
                        tile_id: f.tileid,
                        duration_ms: f.duration,
                    })
                    .collect(),
            );
        }
        if let Some(image) = tile.image {
            data.set_image(image, tile.imagewidth, tile.imageheight);
        }
    }
    Ok(out)
}

fn layer_attributes(l: &JsonLayer) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    if let Some(name) = &l.name {
        attrs.insert("name".to_owned(), name.clone());
    }
    attrs.insert("offsetx".to_owned(), l.offsetx.to_string());
    attrs.insert("offsety".to_owned(), l.offsety.to_string());
    attrs.insert(
        "visible".to_owned(),
        if l.visible { "1" } else { "0" }.to_owned(),
    );
    attrs.insert("opacity".to_owned(), l.opacity.to_string());
    if let Some(color) = &l.color {
        attrs.insert("color".to_owned(), color.clone());
    }
    attrs
}

fn layer_ids(layer: &str, data: JsonLayerData) -> Result<Vec<u32>, MapError> {
    match data {
        JsonLayerData::Ids(ids) => Ok(ids),
        JsonLayerData::Encoded(_) => Err(MapError::InvalidMap(format!(
            "layer '{layer}' uses encoded data; save the map with CSV layer format"
        ))),
    }
}

fn layer_from_json(map: &Map, l: JsonLayer) -> Result<Option<Layer>, MapError> {
    let attrs = layer_attributes(&l);
    let config = map.config();
    let mut layer = match l.kind.as_str() {
        "tilelayer" => {
            let name = l.name.clone().unwrap_or_default();
            if l.encoding.as_deref().is_some_and(|e| e != "csv") {
                return Err(MapError::InvalidMap(format!(
                    "layer '{name}' uses encoded data; save the map with CSV layer format"
                )));
            }
            if map.is_infinite() {
                let chunk_size = l
                    .chunks
                    .iter()
                    .map(|c| c.width.max(c.height))
                    .max()
                    .unwrap_or(config.infinite_chunk_size);
                let mut layer = Layer::chunked_tiles(
                    map.geometry_handle(),
                    LayerAttributes::from_map(&attrs)?,
                    chunk_size,
                );
                for chunk in l.chunks {
                    let ids = layer_ids(&name, chunk.data)?;
                    layer.set_chunk_data(
                        TileCoord::new(chunk.x, chunk.y),
                        chunk.width,
                        chunk.height,
                        &ids,
                        map.tilesets(),
                    )?;
                }
                layer
            } else {
                let mut layer = map.new_tile_layer(&attrs)?;
                if let Some(data) = l.data {
                    let ids = layer_ids(&name, data)?;
                    layer.set_layer_data(&ids, map.tilesets())?;
                }
                layer
            }
        }
        "objectgroup" => {
            let mut layer = map.new_object_group(&attrs)?;
            for obj in l.objects {
                let obj = object_from_json(obj, config)?;
                let id = obj.id;
                if layer.add_object(obj)?.is_none() {
                    warn!("layer '{}': duplicate object id {id} skipped", layer.name());
                }
            }
            layer
        }
        "imagelayer" => {
            let mut layer = map.new_image_layer(&attrs)?;
            if let Some(image) = l.image.filter(|i| !i.is_empty()) {
                layer.set_image(image, l.imagewidth, l.imageheight)?;
            }
            if let Some(image) = layer.as_image_mut() {
                image.wrap_x = l.repeatx;
                image.wrap_y = l.repeaty;
            }
            layer
        }
        "group" => {
            let mut layer = map.new_group_layer(&attrs)?;
            for child in l.layers {
                if let Some(child) = layer_from_json(map, child)? {
                    layer.add_child(child, config.z_delta)?;
                }
            }
            layer
        }
        other => {
            warn!(
                "skipping layer '{}' of unsupported type '{other}'",
                l.name.as_deref().unwrap_or_default()
            );
            return Ok(None);
        }
    };
    *layer.properties_mut() = properties_from_json(l.properties, config)?;
    Ok(Some(layer))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a Tiled JSON map file. External tilesets are resolved relative to
/// the map's directory.
pub fn decode_map_file(path: &Path, config: MapConfig) -> Result<Map, MapError> {
    if !matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("tmj")
    ) {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {}",
            path.display()
        )));
    }
    let j: JsonMap = read_json(path)?;
    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));
    let map = build_map(j, &map_dir, config)?;
    info!(
        "loaded map {} ({}x{} {}, {} layers, {} tilesets)",
        path.display(),
        map.geometry().columns(),
        map.geometry().rows(),
        map.geometry().orientation().as_str(),
        map.layers().len(),
        map.tilesets().len()
    );
    Ok(map)
}

/// Decode a map from a JSON string. `base_dir` is where external tilesets
/// are looked up.
pub fn decode_map_str(json: &str, base_dir: &Path, config: MapConfig) -> Result<Map, MapError> {
    let j: JsonMap = serde_json::from_str(json).map_err(|source| MapError::Json {
        path: PathBuf::from("<string>"),
        source,
    })?;
    build_map(j, base_dir, config)
}

fn build_map(j: JsonMap, map_dir: &Path, config: MapConfig) -> Result<Map, MapError> {
    let geometry = MapGeometry::new(j.orientation, j.width, j.height, j.tilewidth, j.tileheight)?
        .with_stagger(
            j.staggeraxis.unwrap_or_default(),
            j.staggerindex.unwrap_or_default(),
        )
        .with_hex_side_length(j.hexsidelength);

    let mut map = Map::new(geometry, config);
    if j.infinite {
        map = map.into_infinite();
    }
    *map.properties_mut() = properties_from_json(j.properties, map.config())?;
    if let Some(bg) = j.backgroundcolor {
        match parse_hex_color(&bg) {
            Some(color) => map.set_background_color(Some(color)),
            None => warn!("ignoring malformed background color '{bg}'"),
        }
    }

    for ts in j.tilesets {
        let tileset = match ts.source {
            Some(source) => {
                if !source.ends_with(".json") && !source.ends_with(".tsj") {
                    return Err(MapError::InvalidMap(format!(
                        "External tileset must be JSON: {source}"
                    )));
                }
                let ts_path = map_dir.join(&source);
                let ext: JsonTileset = read_json(&ts_path)?;
                let stem = ts_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_owned();
                tileset_from_json(ext, &stem, map.config())?
            }
            None => tileset_from_json(ts.embedded, "", map.config())?,
        };
        map.add_tileset(tileset, ts.firstgid)?;
    }

    for l in j.layers {
        if let Some(layer) = layer_from_json(&map, l)? {
            map.add_layer(layer);
        }
    }
    Ok(map)
}
