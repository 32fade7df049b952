//! Namespaced key-value configuration objects
//!
//! Sprite, sprite group and tile sheet definitions are written in a hierarchical text
//! format where each block carries a namespace tag and an optional id. Values are kept
//! as raw strings and interpreted by the typed accessors on [`Properties`].

mod parser;

pub use parser::PropertiesParser;

use std::cell::Cell;

use thiserror::Error;

use super::{AssetError, AssetSource};
use crate::foundation::math::{Vec2, Vec3, Vec4};

/// Errors raised while reading properties files
#[derive(Error, Debug)]
pub enum PropertiesError {
    /// Malformed text
    #[error("Syntax error on line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A `#ns/ns` fragment did not match any nested namespace
    #[error("Namespace path '{fragment}' not found in '{file}'")]
    NamespaceNotFound {
        /// File part of the URL
        file: String,
        /// Fragment part of the URL
        fragment: String,
    },

    /// The backing file could not be read
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Interpreted type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// The property does not exist
    None,
    /// Free text
    String,
    /// A single number
    Number,
    /// Two comma separated numbers
    Vector2,
    /// Three comma separated numbers
    Vector3,
    /// Four comma separated numbers
    Vector4,
}

/// A single `name = value` pair
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Raw property value
    pub value: String,
}

/// A namespace block with its properties and nested namespaces
#[derive(Debug, Clone)]
pub struct Properties {
    namespace: String,
    id: String,
    parent_id: Option<String>,
    properties: Vec<Property>,
    namespaces: Vec<Properties>,
    cursor: Cell<usize>,
}

impl Properties {
    /// Create an empty block
    pub fn new(namespace: &str, id: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            id: id.to_string(),
            parent_id: None,
            properties: Vec::new(),
            namespaces: Vec::new(),
            cursor: Cell::new(0),
        }
    }

    /// Parse properties text
    pub fn parse(contents: &str) -> Result<Self, PropertiesError> {
        PropertiesParser::parse(contents)
    }

    /// Load the properties object addressed by `url`
    ///
    /// The URL has the form `<file-path>#<namespace-id>/<namespace-id>/...`; the fragment
    /// is optional and walks nested namespaces by id.
    pub fn load(url: &str, source: &dyn AssetSource) -> Result<Self, PropertiesError> {
        let (file, fragment) = match url.split_once('#') {
            Some((file, fragment)) => (file, Some(fragment)),
            None => (url, None),
        };

        let contents = source.read_text(file)?;
        let root = PropertiesParser::parse(&contents)?;

        let Some(fragment) = fragment.filter(|f| !f.is_empty()) else {
            return Ok(root);
        };

        let mut current = &root;
        for segment in fragment.split('/').filter(|s| !s.is_empty()) {
            current = current
                .namespaces
                .iter()
                .find(|ns| ns.id == segment)
                .ok_or_else(|| PropertiesError::NamespaceNotFound {
                    file: file.to_string(),
                    fragment: fragment.to_string(),
                })?;
        }

        let mut found = current.clone();
        found.rewind();
        Ok(found)
    }

    /// The object a factory should read: itself when it has a namespace, otherwise its
    /// first nested namespace
    pub fn definition(&self) -> Option<&Self> {
        if self.namespace.is_empty() {
            self.namespaces.first()
        } else {
            Some(self)
        }
    }

    /// Namespace tag of this block
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Id of this block, empty when none was given
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the block this one inherits from
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Add or replace a property
    pub fn set_string(&mut self, name: &str, value: &str) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.properties.push(Property {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Append a nested namespace
    pub fn add_namespace(&mut self, namespace: Self) {
        self.namespaces.push(namespace);
    }

    /// Check whether a property exists
    pub fn exists(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// All properties in document order
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Raw string value of a property
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Non-empty string value of a property
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get_string(name).filter(|v| !v.is_empty())
    }

    /// Boolean value; `true`, `1` and `yes` are true, anything else false
    pub fn get_bool(&self, name: &str) -> bool {
        matches!(
            self.get_string(name).map(str::trim),
            Some("true" | "1" | "yes")
        )
    }

    /// Single float value
    pub fn get_float(&self, name: &str) -> Option<f32> {
        let value = self.get_string(name)?;
        match value.trim().parse::<f32>() {
            Ok(f) => Some(f),
            Err(_) => {
                log::error!("Error attempting to parse property '{}' as a float ('{}').", name, value);
                None
            }
        }
    }

    /// Two component vector value
    pub fn get_vector2(&self, name: &str) -> Option<Vec2> {
        self.get_floats::<2>(name).map(|v| Vec2::new(v[0], v[1]))
    }

    /// Three component vector value
    pub fn get_vector3(&self, name: &str) -> Option<Vec3> {
        self.get_floats::<3>(name).map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    /// Four component vector value
    pub fn get_vector4(&self, name: &str) -> Option<Vec4> {
        self.get_floats::<4>(name).map(|v| Vec4::new(v[0], v[1], v[2], v[3]))
    }

    /// Color value written as `#RRGGBB` or `#RRGGBBAA`
    pub fn get_color(&self, name: &str) -> Option<Vec4> {
        let value = self.get_string(name)?;
        let color = parse_hex_color(value);
        if color.is_none() {
            log::error!("Error attempting to parse property '{}' as a color ('{}').", name, value);
        }
        color
    }

    /// Interpreted type of a property
    pub fn property_type(&self, name: &str) -> PropertyType {
        let Some(value) = self.get_string(name) else {
            return PropertyType::None;
        };
        match numeric_components(value) {
            Some(1) => PropertyType::Number,
            Some(2) => PropertyType::Vector2,
            Some(3) => PropertyType::Vector3,
            Some(4) => PropertyType::Vector4,
            _ => PropertyType::String,
        }
    }

    /// Reset the namespace cursor to the first nested namespace
    pub fn rewind(&self) {
        self.cursor.set(0);
    }

    /// Advance the namespace cursor, returning the next nested namespace
    pub fn next_namespace(&self) -> Option<&Self> {
        let index = self.cursor.get();
        let next = self.namespaces.get(index)?;
        self.cursor.set(index + 1);
        next.rewind();
        Some(next)
    }

    /// Iterate nested namespaces in document order without touching the cursor
    pub fn namespaces(&self) -> impl Iterator<Item = &Self> {
        self.namespaces.iter()
    }

    /// Iterate nested namespaces carrying the given tag
    pub fn namespaces_named<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a Self> {
        self.namespaces.iter().filter(move |ns| ns.namespace == namespace)
    }

    fn get_floats<const N: usize>(&self, name: &str) -> Option<[f32; N]> {
        let value = self.get_string(name)?;
        let parsed = parse_floats::<N>(value);
        if parsed.is_none() {
            log::error!(
                "Error attempting to parse property '{}' as a {}-dimensional vector ('{}').",
                name,
                N,
                value
            );
        }
        parsed
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.id == other.id
            && self.parent_id == other.parent_id
            && self.properties == other.properties
            && self.namespaces == other.namespaces
    }
}

/// Parse exactly `N` comma separated floats
fn parse_floats<const N: usize>(value: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = value.split(',');
    for slot in &mut out {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// Count comma separated components when every one of them is numeric
fn numeric_components(value: &str) -> Option<usize> {
    let mut count = 0;
    for part in value.split(',') {
        part.trim().parse::<f32>().ok()?;
        count += 1;
    }
    Some(count)
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into normalized RGBA
fn parse_hex_color(value: &str) -> Option<Vec4> {
    let hex = value.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| -> Option<f32> {
        u8::from_str_radix(&hex[i..i + 2], 16).ok().map(|c| f32::from(c) / 255.0)
    };
    let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
    Some(Vec4::new(channel(0)?, channel(2)?, channel(4)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetSource;
    use approx::assert_relative_eq;

    fn sample() -> Properties {
        let text = r#"
sprite hero
{
    tilesheet = res/hero.sheet
    size = 32, 48
    tint = 1, 0.5, 0.25
    tintHex = #FF800040
    scale = 2
    visible = true
    flip = HORZ
    animation walk { path = res/hero.animation }
    animation idle { path = res/hero.animation }
}
"#;
        Properties::parse(text).unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let root = sample();
        let sprite = root.definition().unwrap();
        assert_eq!(sprite.get_vector2("size"), Some(Vec2::new(32.0, 48.0)));
        assert_eq!(sprite.get_vector3("tint"), Some(Vec3::new(1.0, 0.5, 0.25)));
        assert_eq!(sprite.get_float("scale"), Some(2.0));
        assert!(sprite.get_bool("visible"));
        assert!(!sprite.get_bool("hidden"));
        assert_eq!(sprite.get_vector2("tint"), None);

        let color = sprite.get_color("tintHex").unwrap();
        assert_relative_eq!(color.x, 1.0);
        assert_relative_eq!(color.y, 128.0 / 255.0);
        assert_relative_eq!(color.w, 64.0 / 255.0);
    }

    #[test]
    fn test_property_types() {
        let root = sample();
        let sprite = root.definition().unwrap();
        assert_eq!(sprite.property_type("size"), PropertyType::Vector2);
        assert_eq!(sprite.property_type("tint"), PropertyType::Vector3);
        assert_eq!(sprite.property_type("scale"), PropertyType::Number);
        assert_eq!(sprite.property_type("flip"), PropertyType::String);
        assert_eq!(sprite.property_type("missing"), PropertyType::None);
    }

    #[test]
    fn test_namespace_cursor() {
        let root = sample();
        let sprite = root.definition().unwrap();

        let first = sprite.next_namespace().unwrap();
        assert_eq!(first.id(), "walk");
        let second = sprite.next_namespace().unwrap();
        assert_eq!(second.id(), "idle");
        assert!(sprite.next_namespace().is_none());

        sprite.rewind();
        assert_eq!(sprite.next_namespace().unwrap().id(), "walk");
        assert_eq!(sprite.namespaces_named("animation").count(), 2);
    }

    #[test]
    fn test_load_with_fragment() {
        let mut source = MemoryAssetSource::new();
        source.add_text(
            "res/world.scene",
            "scene world\n{\n  spritegroup map\n  {\n    groupSize = 4,4\n  }\n}\n",
        );

        let map = Properties::load("res/world.scene#world/map", &source).unwrap();
        assert_eq!(map.namespace(), "spritegroup");
        assert_eq!(map.get_string("groupSize"), Some("4,4"));

        let err = Properties::load("res/world.scene#world/missing", &source).unwrap_err();
        assert!(matches!(err, PropertiesError::NamespaceNotFound { .. }));

        let err = Properties::load("res/none.scene", &source).unwrap_err();
        assert!(matches!(err, PropertiesError::Asset(AssetError::NotFound(_))));
    }

    #[test]
    fn test_definition_of_root() {
        let root = sample();
        assert_eq!(root.namespace(), "");
        assert_eq!(root.definition().unwrap().namespace(), "sprite");
        assert!(Properties::new("", "").definition().is_none());
    }
}
