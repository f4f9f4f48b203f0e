//! Candidate selection.
//!
//! A value is a candidate when it contains `${tag:` for some registered tag.
//! This is a containment test only; whether the placeholder is terminated is
//! left to the resolver.

use super::EvaluatorRegistry;
use crate::config::ConfigSnapshot;

/// A configuration entry that may hold placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub raw: String,
}

/// Selects every non-null entry of `snapshot` mentioning a registered tag.
pub fn scan(snapshot: &ConfigSnapshot, registry: &EvaluatorRegistry) -> Vec<Candidate> {
    let openers: Vec<String> = registry.names().map(opener).collect();

    snapshot
        .iter()
        .filter_map(|(key, value)| Some((key, value?)))
        .filter(|(_, value)| {
            openers
                .iter()
                .any(|opener| find_ignore_ascii_case(value, opener).is_some())
        })
        .map(|(key, value)| Candidate {
            key: key.to_string(),
            raw: value.to_string(),
        })
        .collect()
}

/// The text that opens a placeholder for `tag`: `${tag:`.
pub(crate) fn opener(tag: &str) -> String {
    format!("${{{tag}:")
}

/// Byte offset of the first occurrence of `needle` in `haystack`, ignoring ASCII case.
pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let (haystack, needle) = (haystack.as_bytes(), needle.as_bytes());
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
