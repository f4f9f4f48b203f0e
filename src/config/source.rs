use super::snapshot::ConfigSnapshot;
use super::ConfigError;

/// Loads one layer of configuration.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError>;
}

/// A read-only configuration layer consulted by [`ConfigRoot`](super::ConfigRoot).
pub trait ConfigProvider: Send + Sync + std::fmt::Debug {
    /// Returns the value this layer holds for `key`, or `None` to defer to lower layers.
    fn try_get(&self, key: &str) -> Option<&str>;

    /// Enumerates every key this layer can supply.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Option<&str>)> + '_>;
}

impl ConfigProvider for ConfigSnapshot {
    fn try_get(&self, key: &str) -> Option<&str> {
        self.get(key)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Option<&str>)> + '_> {
        Box::new(self.iter())
    }
}

/// A configuration source backed by explicit key/value pairs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    values: ConfigSnapshot,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key, Some(value.into()));
        self
    }

    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.values.insert(key, None);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |source, (key, value)| source.with(key, value))
    }
}

impl ConfigSource for MemorySource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        Ok(self.values.clone())
    }
}
