use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::bind::bind;
use super::builder::EvaluatorSpec;
use super::snapshot::ConfigSnapshot;
use super::source::{ConfigProvider, ConfigSource};
use super::ConfigError;
use crate::placeholder::{EvaluatorRegistry, ResolvedOverlay, Resolver, ResolverOptions};

/// Layered configuration store.
///
/// Each source contributes one layer; later layers override earlier ones.
/// When evaluators are configured, a [`ResolvedOverlay`] sits on top of all
/// source layers and supplies resolved values for keys holding placeholders.
///
/// Built by [`Config::build_root`](super::Config::build_root).
#[derive(Debug)]
pub struct ConfigRoot {
    sources: Vec<Box<dyn ConfigSource>>,
    evaluators: Vec<EvaluatorSpec>,
    options: ResolverOptions,
    layers: Vec<ConfigSnapshot>,
    raw: Arc<ConfigSnapshot>,
    overlay: Option<ResolvedOverlay>,
}

impl ConfigRoot {
    pub(crate) fn load(
        sources: Vec<Box<dyn ConfigSource>>,
        evaluators: Vec<EvaluatorSpec>,
        options: ResolverOptions,
    ) -> Result<Self, ConfigError> {
        let mut root = Self {
            sources,
            evaluators,
            options,
            layers: Vec::new(),
            raw: Arc::default(),
            overlay: None,
        };
        root.reload()?;
        Ok(root)
    }

    /// Re-reads every source and rebuilds the placeholder overlay.
    ///
    /// Candidates are selected again from the new values and previously
    /// resolved values are discarded. On error the previous state is kept.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let layers = self
            .sources
            .iter()
            .map(|source| source.load())
            .collect::<Result<Vec<_>, _>>()?;

        let mut merged = ConfigSnapshot::new();
        for layer in &layers {
            merged.merge(layer);
        }
        let raw = Arc::new(merged);

        let overlay = if self.evaluators.is_empty() {
            None
        } else {
            let mut registry = EvaluatorRegistry::new();
            for spec in &self.evaluators {
                registry.register(spec.instantiate(&raw))?;
            }
            Some(ResolvedOverlay::new(
                &raw,
                Resolver::new(registry, self.options),
            ))
        };

        tracing::debug!(layers = layers.len(), keys = raw.len(), "loaded configuration");

        self.layers = layers;
        self.raw = raw;
        self.overlay = overlay;
        Ok(())
    }

    /// Looks up `key`, consulting the most recently added layer first.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.providers().rev().find_map(|provider| provider.try_get(key))
    }

    /// The merged source layers, before placeholder resolution.
    pub fn raw_snapshot(&self) -> &ConfigSnapshot {
        &self.raw
    }

    /// The effective configuration with resolved values applied.
    pub fn snapshot(&self) -> ConfigSnapshot {
        let mut snapshot = ConfigSnapshot::new();
        for provider in self.providers() {
            for (key, value) in provider.entries() {
                snapshot.insert_layered(key, value.map(str::to_string));
            }
        }
        snapshot
    }

    pub fn overlay(&self) -> Option<&ResolvedOverlay> {
        self.overlay.as_ref()
    }

    /// Deserializes the effective configuration into `T`.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        bind(&self.snapshot(), None)
    }

    /// Deserializes the section at `section` (e.g. `Database` or `App:Database`) into `T`.
    ///
    /// A missing section binds like an empty one.
    pub fn bind_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
        bind(&self.snapshot(), Some(section))
    }

    fn providers(&self) -> impl DoubleEndedIterator<Item = &dyn ConfigProvider> + '_ {
        self.layers
            .iter()
            .map(|layer| layer as &dyn ConfigProvider)
            .chain(
                self.overlay
                    .iter()
                    .map(|overlay| overlay as &dyn ConfigProvider),
            )
    }
}
