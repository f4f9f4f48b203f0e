//! Flat key/value view of configuration.
//!
//! Hierarchical data is addressed with colon-delimited keys such as
//! `Database:ConnectionString`. Lookups ignore ASCII case; enumeration keeps
//! the casing the key was inserted with.

use std::collections::BTreeMap;

use toml::{Table, Value};

/// Separator between the segments of a configuration key.
pub const KEY_DELIMITER: char = ':';

/// Joins a parent path and a child segment into one key.
pub fn combine_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{KEY_DELIMITER}{segment}")
    }
}

pub(crate) fn normalize_key(key: &str) -> String {
    key.to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: Option<String>,
}

/// An ordered mapping from configuration key to raw, nullable string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    entries: BTreeMap<String, Entry>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value at `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        self.entries.insert(normalize_key(&key), Entry { key, value });
    }

    /// Returns the value at `key`, treating a null value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(key))
            .and_then(|entry| entry.value.as_deref())
    }

    /// Returns `true` if `key` is present, even with a null value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.entries
            .values()
            .map(|entry| (entry.key.as_str(), entry.value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlays `other` onto `self`; keys present in both take `other`'s value.
    ///
    /// A null in `other` never hides a value already in `self`, matching
    /// layered lookups where null counts as absent.
    pub fn merge(&mut self, other: &ConfigSnapshot) {
        for entry in other.entries.values() {
            self.insert_layered(entry.key.clone(), entry.value.clone());
        }
    }

    /// Inserts `value` as if from a higher layer: null only fills in missing keys.
    pub(crate) fn insert_layered(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        if value.is_none() && self.contains_key(&key) {
            return;
        }
        self.insert(key, value);
    }

    /// Flattens a TOML table into colon-delimited keys.
    ///
    /// Arrays are addressed by index (`servers:0:host`). Empty tables and
    /// arrays are kept as keys with a null value.
    pub fn from_toml(table: &Table) -> Self {
        let mut snapshot = Self::new();
        flatten_table(&mut snapshot, "", table);
        snapshot
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for ConfigSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        snapshot.extend(iter);
        snapshot
    }
}

impl<K: Into<String>> Extend<(K, Option<String>)> for ConfigSnapshot {
    fn extend<I: IntoIterator<Item = (K, Option<String>)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

fn flatten_table(out: &mut ConfigSnapshot, prefix: &str, table: &Table) {
    if table.is_empty() && !prefix.is_empty() {
        out.insert(prefix, None);
    }
    for (segment, value) in table {
        flatten_value(out, &combine_key(prefix, segment), value);
    }
}

fn flatten_value(out: &mut ConfigSnapshot, key: &str, value: &Value) {
    match value {
        Value::Table(table) => flatten_table(out, key, table),
        Value::Array(items) => {
            if items.is_empty() {
                out.insert(key, None);
            }
            for (index, item) in items.iter().enumerate() {
                flatten_value(out, &combine_key(key, &index.to_string()), item);
            }
        }
        Value::String(s) => out.insert(key, Some(s.clone())),
        Value::Integer(i) => out.insert(key, Some(i.to_string())),
        Value::Float(f) => out.insert(key, Some(f.to_string())),
        Value::Boolean(b) => out.insert(key, Some(b.to_string())),
        Value::Datetime(dt) => out.insert(key, Some(dt.to_string())),
    }
}
