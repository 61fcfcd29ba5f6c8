use std::collections::HashMap;

use macroquad::prelude::{vec2, Color, Vec2};

use crate::error::{MapError, Result};

/// Common layer settings parsed from a Tiled attribute dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAttributes {
    pub name: String,
    pub offset: Vec2,
    pub visible: bool,
    pub opacity: f32,
    pub color: Option<Color>,
}

impl LayerAttributes {
    /// Attributes with every optional value at its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: Vec2::ZERO,
            visible: true,
            opacity: 1.0,
            color: None,
        }
    }

    /// Parse `name`, `offsetx`, `offsety`, `visible`, `opacity` and `color`.
    ///
    /// Only `name` is required. `visible` must be `"0"` or `"1"`; opacity is
    /// clamped into `0..=1`. Unknown keys are ignored.
    pub fn from_map(attributes: &HashMap<String, String>) -> Result<Self> {
        let name = attributes
            .get("name")
            .ok_or(MapError::MissingAttribute("name"))?;
        let mut out = Self::named(name.as_str());

        let offset_x = parse_f32(attributes, "offsetx")?.unwrap_or(0.0);
        let offset_y = parse_f32(attributes, "offsety")?.unwrap_or(0.0);
        out.offset = vec2(offset_x, offset_y);

        if let Some(v) = attributes.get("visible") {
            out.visible = match v.as_str() {
                "1" => true,
                "0" => false,
                _ => return Err(invalid("visible", v)),
            };
        }
        if let Some(opacity) = parse_f32(attributes, "opacity")? {
            out.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(hex) = attributes.get("color") {
            out.color = Some(parse_hex_color(hex).ok_or_else(|| invalid("color", hex))?);
        }
        Ok(out)
    }
}

fn invalid(attribute: &str, value: &str) -> MapError {
    MapError::InvalidAttribute {
        attribute: attribute.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_f32(attributes: &HashMap<String, String>, key: &str) -> Result<Option<f32>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(key, v)),
    }
}

/// Parse a Tiled color string: `#RRGGBB` or `#AARRGGBB`, `#` optional.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let (a, r, g, b) = match hex.len() {
        6 => (255, byte(0)?, byte(2)?, byte(4)?),
        8 => (byte(0)?, byte(2)?, byte(4)?, byte(6)?),
        _ => return None,
    };
    Some(Color::from_rgba(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_all_known_keys() {
        let a = LayerAttributes::from_map(&attrs(&[
            ("name", "Ground"),
            ("offsetx", "4.5"),
            ("offsety", "-8"),
            ("visible", "0"),
            ("opacity", "1.7"),
            ("color", "#80ff0000"),
            ("locked", "1"),
        ]))
        .unwrap();
        assert_eq!(a.name, "Ground");
        assert_eq!(a.offset, vec2(4.5, -8.0));
        assert!(!a.visible);
        assert_eq!(a.opacity, 1.0);
        let c = a.color.unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn defaults_when_only_name_is_given() {
        let a = LayerAttributes::from_map(&attrs(&[("name", "Objects")])).unwrap();
        assert_eq!(a, LayerAttributes::named("Objects"));
    }

    #[test]
    fn missing_name_is_a_configuration_error() {
        let err = LayerAttributes::from_map(&attrs(&[("opacity", "0.5")])).unwrap_err();
        assert!(matches!(err, MapError::MissingAttribute("name")));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for (key, value) in [
            ("offsetx", "left"),
            ("visible", "true"),
            ("opacity", "NaN"),
            ("color", "#12345"),
        ] {
            let err = LayerAttributes::from_map(&attrs(&[("name", "L"), (key, value)])).unwrap_err();
            assert!(matches!(err, MapError::InvalidAttribute { ref attribute, .. } if attribute == key));
        }
    }

    #[test]
    fn hex_colors() {
        let c = parse_hex_color("00ff00").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0.0, 1.0, 0.0, 1.0));
        assert!(parse_hex_color("#gg0000").is_none());
        assert!(parse_hex_color("").is_none());
    }
}
