use std::collections::BTreeMap;

/// Custom properties attached to maps, layers, tilesets, tiles and objects.
///
/// Values are kept as the strings found in the source; the typed getters parse
/// on access and return `None` when the value does not fit the requested type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Returns true if a property with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw string value.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Accepts `true`/`false` and `1`/`0`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get_string(name)?.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_string(name)?.trim().parse().ok()
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_string(name)?.trim().parse().ok()
    }

    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get_string(name)?.trim().parse().ok()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Properties::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_parse_strings() {
        let props: Properties = [
            ("solid", "true"),
            ("legacy", "0"),
            ("damage", "10"),
            ("big", "5000000000"),
            ("speed", "1.5"),
            ("kind", "food"),
        ]
        .into_iter()
        .collect();

        assert_eq!(props.get_bool("solid"), Some(true));
        assert_eq!(props.get_bool("legacy"), Some(false));
        assert_eq!(props.get_i32("damage"), Some(10));
        assert_eq!(props.get_i64("big"), Some(5_000_000_000));
        assert_eq!(props.get_i32("big"), None);
        assert_eq!(props.get_f32("speed"), Some(1.5));
        assert_eq!(props.get_string("kind"), Some("food"));
        assert_eq!(props.get_bool("kind"), None);
        assert_eq!(props.get_string("missing"), None);
    }
}
