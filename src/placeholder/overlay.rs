use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::resolver::{Resolution, Resolver};
use super::scanner::scan;
use crate::config::{normalize_key, ConfigProvider, ConfigSnapshot};

#[derive(Debug)]
struct Slot {
    key: String,
    raw: String,
    resolved: OnceLock<Option<String>>,
}

/// A configuration layer publishing resolved placeholder values.
///
/// Candidates are selected once, when the overlay is built from a snapshot.
/// Each candidate is resolved on first read and memoized; keys whose values
/// could not be rewritten are reported as absent so lower layers show through.
#[derive(Debug)]
pub struct ResolvedOverlay {
    resolver: Resolver,
    slots: BTreeMap<String, Slot>,
}

impl ResolvedOverlay {
    pub fn new(snapshot: &ConfigSnapshot, resolver: Resolver) -> Self {
        let slots: BTreeMap<_, _> = scan(snapshot, resolver.registry())
            .into_iter()
            .map(|candidate| {
                let slot = Slot {
                    key: candidate.key,
                    raw: candidate.raw,
                    resolved: OnceLock::new(),
                };
                (normalize_key(&slot.key), slot)
            })
            .collect();

        tracing::debug!(
            candidates = slots.len(),
            evaluators = resolver.registry().len(),
            "selected placeholder candidates"
        );

        Self { resolver, slots }
    }

    /// Keys whose raw values mention a registered placeholder tag.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.values().map(|slot| slot.key.as_str())
    }

    /// Resolves every candidate up front instead of on first read.
    pub fn resolve_all(&self) {
        for slot in self.slots.values() {
            self.resolved(slot);
        }
    }

    fn resolved<'a>(&self, slot: &'a Slot) -> Option<&'a str> {
        slot.resolved
            .get_or_init(|| match self.resolver.resolve(&slot.raw) {
                Resolution::Exhausted(value) => {
                    tracing::warn!(
                        key = %slot.key,
                        max_passes = self.resolver.options().max_passes,
                        value = %value,
                        "placeholder resolution did not settle, using partially resolved value"
                    );
                    Some(value)
                }
                resolution => {
                    tracing::debug!(key = %slot.key, resolved = resolution.value().is_some(), "resolved placeholders");
                    resolution.into_value()
                }
            })
            .as_deref()
    }
}

impl ConfigProvider for ResolvedOverlay {
    fn try_get(&self, key: &str) -> Option<&str> {
        let slot = self.slots.get(&normalize_key(key))?;
        self.resolved(slot)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Option<&str>)> + '_> {
        Box::new(self.slots.values().filter_map(|slot| {
            self.resolved(slot)
                .map(|value| (slot.key.as_str(), Some(value)))
        }))
    }
}
