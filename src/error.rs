use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Broad category of a [`MapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid map setup: overlapping tilesets, missing or malformed attributes.
    Configuration,
    /// Tile data length does not match the declared grid size.
    SizeMismatch,
    /// Grid access outside of its bounds.
    Index,
    /// Mutation of a layer that was already torn down.
    Lifecycle,
    /// File system failure.
    Io,
    /// Malformed map source.
    Parse,
}

/// Error type for map loading and layer manipulation.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("invalid map geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid tileset: {0}")]
    InvalidTileset(String),

    #[error("tileset '{name}' gid range {first_gid}..{end_gid} overlaps tileset '{other}' ({other_first_gid}..{other_end_gid})")]
    OverlappingTileset {
        name: String,
        first_gid: u32,
        end_gid: u32,
        other: String,
        other_first_gid: u32,
        other_end_gid: u32,
    },

    #[error("tileset '{0}' must start at a gid of 1 or greater")]
    ZeroFirstGid(String),

    #[error("layer is missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("invalid value '{value}' for layer attribute '{attribute}'")]
    InvalidAttribute { attribute: String, value: String },

    #[error("layer '{layer}' is a {actual} layer, expected a {expected} layer")]
    WrongLayerType {
        layer: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("layer '{layer}' data has {actual} tiles, expected {expected}")]
    SizeMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("coordinate ({x}, {y}) is out of bounds for a {columns}x{rows} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        columns: usize,
        rows: usize,
    },

    #[error("layer '{0}' was torn down")]
    LayerTornDown(String),

    #[error("no layer named '{0}'")]
    LayerNotFound(String),

    #[error("unsupported property type '{kind}' for property '{name}'")]
    UnsupportedPropertyType { name: String, kind: String },
}

impl MapError {
    /// Category used by callers to decide how to report the failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Io { .. } => ErrorKind::Io,
            MapError::Json { .. }
            | MapError::InvalidMap(_)
            | MapError::UnsupportedPropertyType { .. } => ErrorKind::Parse,
            MapError::InvalidGeometry(_)
            | MapError::InvalidTileset(_)
            | MapError::OverlappingTileset { .. }
            | MapError::ZeroFirstGid(_)
            | MapError::MissingAttribute(_)
            | MapError::InvalidAttribute { .. }
            | MapError::WrongLayerType { .. }
            | MapError::LayerNotFound(_) => ErrorKind::Configuration,
            MapError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            MapError::OutOfBounds { .. } => ErrorKind::Index,
            MapError::LayerTornDown(_) => ErrorKind::Lifecycle,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let overlap = MapError::OverlappingTileset {
            name: "b".into(),
            first_gid: 5,
            end_gid: 15,
            other: "a".into(),
            other_first_gid: 1,
            other_end_gid: 10,
        };
        assert_eq!(overlap.kind(), ErrorKind::Configuration);
        assert_eq!(MapError::MissingAttribute("name").kind(), ErrorKind::Configuration);
        assert_eq!(
            MapError::OutOfBounds { x: 10, y: 0, columns: 10, rows: 5 }.kind(),
            ErrorKind::Index
        );
        assert_eq!(
            MapError::SizeMismatch { layer: "l".into(), expected: 100, actual: 80 }.kind(),
            ErrorKind::SizeMismatch
        );
    }

    #[test]
    fn messages_name_the_layer() {
        let err = MapError::SizeMismatch {
            layer: "ground".into(),
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "layer 'ground' data has 3 tiles, expected 4");
    }
}
