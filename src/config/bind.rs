//! Typed binding of flat string configuration.
//!
//! Keys are folded back into a tree of sections. Scalars stay strings until
//! the target type asks for something else, at which point they are parsed.
//! Sections whose children are exactly `0..n` bind as sequences, and struct
//! fields match section keys ignoring ASCII case.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, SeqAccess,
    Visitor,
};

use super::snapshot::{combine_key, normalize_key, ConfigSnapshot, KEY_DELIMITER};
use super::ConfigError;

/// Binds the whole snapshot, or the section at `section`, to `T`.
pub(crate) fn bind<T: DeserializeOwned>(
    snapshot: &ConfigSnapshot,
    section: Option<&str>,
) -> Result<T, ConfigError> {
    let mut root = Node::Section(BTreeMap::new());
    for (key, value) in snapshot.iter() {
        let path: Vec<&str> = key.split(KEY_DELIMITER).collect();
        root.insert(&path, value);
    }

    let (node, path) = match section {
        Some(section) => (root.take_section(section), section.to_string()),
        None => (root, String::new()),
    };

    T::deserialize(NodeDeserializer { node, path }).map_err(|e| ConfigError::Bind(e.0))
}

#[derive(Debug)]
pub(crate) struct BindError(String);

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BindError {}

impl de::Error for BindError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        BindError(msg.to_string())
    }
}

#[derive(Debug)]
enum Node {
    Value(Option<String>),
    /// Children keyed by normalized segment, keeping the original segment.
    Section(BTreeMap<String, (String, Node)>),
}

impl Node {
    fn insert(&mut self, path: &[&str], value: Option<&str>) {
        let Some((first, rest)) = path.split_first() else {
            // A key that is also a section keeps its children.
            if let Node::Value(_) = self {
                *self = Node::Value(value.map(str::to_string));
            }
            return;
        };

        if !matches!(self, Node::Section(_)) {
            *self = Node::Section(BTreeMap::new());
        }
        if let Node::Section(children) = self {
            let (_, child) = children
                .entry(normalize_key(first))
                .or_insert_with(|| (first.to_string(), Node::Value(None)));
            child.insert(rest, value);
        }
    }

    fn take_section(self, section: &str) -> Node {
        section
            .split(KEY_DELIMITER)
            .try_fold(self, |node, segment| match node {
                Node::Section(mut children) => children
                    .remove(&normalize_key(segment))
                    .map(|(_, child)| child),
                Node::Value(_) => None,
            })
            .unwrap_or(Node::Value(None))
    }
}

struct NodeDeserializer {
    node: Node,
    path: String,
}

impl NodeDeserializer {
    fn error(&self, msg: impl fmt::Display) -> BindError {
        if self.path.is_empty() {
            BindError(msg.to_string())
        } else {
            BindError(format!("{}: {}", self.path, msg))
        }
    }

    fn scalar(self) -> Result<String, BindError> {
        match self.node {
            Node::Value(Some(raw)) => Ok(raw),
            Node::Value(None) => Err(self.error("expected a value, found null")),
            Node::Section(_) => Err(self.error("expected a value, found a section")),
        }
    }

    fn children(
        children: BTreeMap<String, (String, Node)>,
        path: &str,
    ) -> Vec<(String, NodeDeserializer)> {
        children
            .into_values()
            .map(|(segment, node)| {
                let path = combine_key(path, &segment);
                (segment, NodeDeserializer { node, path })
            })
            .collect()
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
                let path = self.path.clone();
                let raw = self.scalar()?;
                let parsed = raw.trim().parse::<$ty>().map_err(|e| {
                    BindError(format!("{}: invalid {} '{}': {}", path, stringify!($ty), raw, e))
                })?;
                visitor.$visit(parsed)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for NodeDeserializer {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if let Node::Section(_) = self.node {
            return if self.is_sequence() {
                self.deserialize_seq(visitor)
            } else {
                self.deserialize_map(visitor)
            };
        }
        match self.node {
            Node::Value(Some(raw)) => visitor.visit_string(raw),
            _ => visitor.visit_none(),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let path = self.path.clone();
        let raw = self.scalar()?;
        match raw.trim() {
            s if s.eq_ignore_ascii_case("true") => visitor.visit_bool(true),
            s if s.eq_ignore_ascii_case("false") => visitor.visit_bool(false),
            _ => Err(BindError(format!("{path}: invalid bool '{raw}'"))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let path = self.path.clone();
        let raw = self.scalar()?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(BindError(format!("{path}: expected a single character, found '{raw}'"))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_string(self.scalar()?)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.node {
            Node::Value(None) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if !self.is_sequence() {
            return Err(self.error("expected a sequence"));
        }
        let items = match self.node {
            Node::Section(children) => {
                let mut items = NodeDeserializer::children(children, &self.path);
                items.sort_by_key(|(segment, _)| segment.parse::<usize>().unwrap_or(usize::MAX));
                items.into_iter().map(|(_, item)| item).collect()
            }
            Node::Value(_) => Vec::new(),
        };
        visitor.visit_seq(Items(items.into_iter()))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.node {
            Node::Section(children) => {
                let entries = NodeDeserializer::children(children, &self.path);
                visitor.visit_map(Entries::new(entries))
            }
            Node::Value(None) => visitor.visit_map(Entries::new(Vec::new())),
            Node::Value(Some(_)) => Err(self.error("expected a section, found a value")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self.node {
            Node::Section(children) => {
                let entries = NodeDeserializer::children(children, &self.path)
                    .into_iter()
                    .map(|(segment, node)| {
                        let key = fields
                            .iter()
                            .find(|field| field.eq_ignore_ascii_case(&segment))
                            .map_or(segment, |field| field.to_string());
                        (key, node)
                    })
                    .collect();
                visitor.visit_map(Entries::new(entries))
            }
            Node::Value(None) => visitor.visit_map(Entries::new(Vec::new())),
            Node::Value(Some(_)) => Err(self.error("expected a section, found a value")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let raw = self.scalar()?;
        let variant = variants
            .iter()
            .find(|variant| variant.eq_ignore_ascii_case(raw.trim()))
            .map_or(raw, |variant| variant.to_string());
        visitor.visit_enum(variant.into_deserializer())
    }

    serde::forward_to_deserialize_any! {
        i128 u128 bytes byte_buf unit_struct tuple tuple_struct identifier ignored_any
    }
}

impl NodeDeserializer {
    fn is_sequence(&self) -> bool {
        match &self.node {
            Node::Section(children) => {
                let mut indices: Vec<usize> = Vec::with_capacity(children.len());
                for segment in children.keys() {
                    match segment.parse() {
                        Ok(index) => indices.push(index),
                        Err(_) => return false,
                    }
                }
                indices.sort_unstable();
                indices.iter().enumerate().all(|(position, index)| position == *index)
            }
            Node::Value(value) => value.is_none(),
        }
    }
}

struct Items(std::vec::IntoIter<NodeDeserializer>);

impl<'de> SeqAccess<'de> for Items {
    type Error = BindError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, BindError> {
        self.0.next().map(|item| seed.deserialize(item)).transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

struct Entries {
    entries: std::vec::IntoIter<(String, NodeDeserializer)>,
    pending: Option<NodeDeserializer>,
}

impl Entries {
    fn new(entries: Vec<(String, NodeDeserializer)>) -> Self {
        Self {
            entries: entries.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for Entries {
    type Error = BindError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, BindError> {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BindError> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| BindError("map value requested before its key".into()))?;
        seed.deserialize(value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use std::collections::HashMap;

    fn snapshot(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        pairs
            .iter()
            .map(|(key, value)| (*key, Some(value.to_string())))
            .collect()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        host: String,
        port: u16,
        #[serde(default)]
        pool: Option<u32>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        Debug,
        Info,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct AppConfig {
        name: String,
        debug: bool,
        level: Level,
        database: Database,
        servers: Vec<String>,
        labels: HashMap<String, String>,
    }

    #[test]
    fn test_binds_nested_struct_ignoring_key_case() {
        let snapshot = snapshot(&[
            ("Name", "demo"),
            ("Debug", "True"),
            ("Level", "INFO"),
            ("Database:Host", "db"),
            ("Database:Port", " 5432 "),
            ("Servers:0", "a"),
            ("Servers:1", "b"),
            ("Servers:10", "k"),
            ("Servers:2", "c"),
            ("Servers:3", "d"),
            ("Servers:4", "e"),
            ("Servers:5", "f"),
            ("Servers:6", "g"),
            ("Servers:7", "h"),
            ("Servers:8", "i"),
            ("Servers:9", "j"),
            ("Labels:Team", "core"),
        ]);

        let config: AppConfig = bind(&snapshot, None).unwrap();

        assert_eq!(
            config,
            AppConfig {
                name: "demo".into(),
                debug: true,
                level: Level::Info,
                database: Database {
                    host: "db".into(),
                    port: 5432,
                    pool: None,
                },
                servers: "abcdefghijk".chars().map(String::from).collect(),
                labels: HashMap::from([("Team".to_string(), "core".to_string())]),
            }
        );
    }

    #[test]
    fn test_binds_section() {
        let snapshot = snapshot(&[("App:Database:Host", "db"), ("App:Database:Port", "1")]);

        let database: Database = bind(&snapshot, Some("app:database")).unwrap();

        assert_eq!(database.host, "db");
        assert_eq!(database.port, 1);
    }

    #[test]
    fn test_invalid_scalar_names_key() {
        let snapshot = snapshot(&[("Database:Host", "db"), ("Database:Port", "${environment:PORT}")]);

        let result = bind::<Database>(&snapshot, Some("Database"));

        match result {
            Err(ConfigError::Bind(message)) => {
                assert!(message.contains("Database:Port"), "{message}");
                assert!(message.contains("${environment:PORT}"), "{message}");
            }
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_field() {
        let snapshot = snapshot(&[("Database:Host", "db")]);

        let result = bind::<Database>(&snapshot, Some("Database"));

        assert!(matches!(result, Err(ConfigError::Bind(_))));
    }

    #[test]
    fn test_null_binds_as_none_and_empty_sequence() {
        #[derive(Debug, Deserialize)]
        struct Optional {
            value: Option<String>,
            items: Vec<String>,
        }

        let snapshot: ConfigSnapshot = [("Value", None), ("Items", None)].into_iter().collect();

        let bound: Optional = bind(&snapshot, None).unwrap();

        assert_eq!(bound.value, None);
        assert!(bound.items.is_empty());
    }
}
