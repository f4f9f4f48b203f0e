//! Fixed-point rewriting of placeholder values.
//!
//! Each pass walks the registry in order and rewrites the first placeholder
//! it can evaluate. Passes repeat until one leaves the value unchanged, the
//! value is replaced wholesale, or the pass ceiling is reached.

use super::scanner::{find_ignore_ascii_case, opener};
use super::EvaluatorRegistry;

/// Default ceiling on rewriting passes per value.
pub const DEFAULT_MAX_PASSES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Maximum number of passes that may rewrite a single value.
    pub max_passes: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Outcome of resolving one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No placeholder could be evaluated; the raw value stands.
    Unchanged,
    /// The value reached a fixed point.
    Resolved(String),
    /// The pass ceiling was hit; carries the value as of the last pass.
    Exhausted(String),
}

impl Resolution {
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Unchanged => None,
            Resolution::Resolved(value) | Resolution::Exhausted(value) => Some(value.as_str()),
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Resolution::Unchanged => None,
            Resolution::Resolved(value) | Resolution::Exhausted(value) => Some(value),
        }
    }
}

/// Result of a single pass over `current`.
enum Pass {
    /// The placeholder spanned the whole raw value; this is the final value.
    Replaced(String),
    Rewritten(String),
    Stuck,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    registry: EvaluatorRegistry,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(registry: EvaluatorRegistry, options: ResolverOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &EvaluatorRegistry {
        &self.registry
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Rewrites `raw` until no pass changes it.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let mut current = raw.to_string();
        let mut rewrites = 0;

        loop {
            match self.pass(raw, &current) {
                Pass::Replaced(value) => return settle(raw, value),
                Pass::Rewritten(next) if next != current => {
                    if rewrites == self.options.max_passes {
                        return exhaust(raw, current);
                    }
                    rewrites += 1;
                    current = next;
                }
                Pass::Rewritten(_) | Pass::Stuck => return settle(raw, current),
            }
        }
    }

    fn pass(&self, raw: &str, current: &str) -> Pass {
        for evaluator in self.registry.iter() {
            let opener = opener(evaluator.name());
            let Some(start) = find_ignore_ascii_case(current, &opener) else {
                continue;
            };
            let expression_start = start + opener.len();
            // Unterminated: leave it for the remaining evaluators.
            let Some(length) = current[expression_start..].find('}') else {
                continue;
            };
            let close = expression_start + length;

            let Some(value) = evaluator.try_evaluate(&current[expression_start..close]) else {
                continue;
            };

            // Span is checked against the raw value, not the partially rewritten one.
            if start == 0 && close + 1 == raw.len() {
                return Pass::Replaced(value);
            }

            let mut next = String::with_capacity(current.len() + value.len());
            next.push_str(&current[..start]);
            next.push_str(&value);
            next.push_str(&current[close + 1..]);
            return Pass::Rewritten(next);
        }
        Pass::Stuck
    }
}

fn settle(raw: &str, value: String) -> Resolution {
    if value == raw {
        Resolution::Unchanged
    } else {
        Resolution::Resolved(value)
    }
}

fn exhaust(raw: &str, value: String) -> Resolution {
    if value == raw {
        Resolution::Unchanged
    } else {
        Resolution::Exhausted(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::testing::{registry, Fixed};
    use pretty_assertions::assert_eq;

    fn env() -> Fixed {
        Fixed::new("environment")
            .with("PATH", "/usr/bin")
            .with("A", "x")
            .with("B", "y")
    }

    fn resolve(resolver: &Resolver, raw: &str) -> Resolution {
        resolver.resolve(raw)
    }

    #[test]
    fn test_full_value_replacement() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:PATH}"),
            Resolution::Resolved("/usr/bin".into())
        );
    }

    #[test]
    fn test_full_value_replacement_is_final() {
        let evaluator = Fixed::new("environment")
            .with("OUTER", "${environment:INNER}")
            .with("INNER", "never");
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:OUTER}"),
            Resolution::Resolved("${environment:INNER}".into())
        );
    }

    #[test]
    fn test_embedded_replacement() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "prefix-${environment:PATH}-suffix"),
            Resolution::Resolved("prefix-/usr/bin-suffix".into())
        );
    }

    #[test]
    fn test_multiple_placeholders_take_one_pass_each() {
        let evaluator = env();
        let calls = evaluator.calls();
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:A}/${environment:B}"),
            Resolution::Resolved("x/y".into())
        );
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unresolvable_placeholder_is_unchanged() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:DOES_NOT_EXIST}"),
            Resolution::Unchanged
        );
    }

    #[test]
    fn test_unterminated_placeholder_is_unchanged() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(resolve(&resolver, "${environment:PATH"), Resolution::Unchanged);
    }

    #[test]
    fn test_unterminated_tag_does_not_block_other_evaluators() {
        let config = Fixed::new("configurationValue").with("k", "v");
        let resolver = Resolver::new(registry(vec![env(), config]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${configurationValue:k} ${environment:PATH"),
            Resolution::Resolved("v ${environment:PATH".into())
        );
    }

    #[test]
    fn test_failed_placeholder_stays_while_others_resolve() {
        let config = Fixed::new("configurationValue").with("k", "v");
        let resolver = Resolver::new(registry(vec![env(), config]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:MISSING}-${configurationValue:k}"),
            Resolution::Resolved("${environment:MISSING}-v".into())
        );
    }

    #[test]
    fn test_only_first_occurrence_of_a_tag_is_tried() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${environment:MISSING}-${environment:A}"),
            Resolution::Unchanged
        );
    }

    #[test]
    fn test_tag_match_ignores_case() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${ENVIRONMENT:PATH}"),
            Resolution::Resolved("/usr/bin".into())
        );
    }

    #[test]
    fn test_nested_expansion() {
        let outer = Fixed::new("environment").with("A", "${configurationValue:k}");
        let inner = Fixed::new("configurationValue").with("k", "v");
        let resolver = Resolver::new(registry(vec![outer, inner]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "x${environment:A}"),
            Resolution::Resolved("xv".into())
        );
    }

    #[test]
    fn test_first_closing_brace_ends_expression() {
        let evaluator = Fixed::new("configurationValue").with("{a", "v");
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions::default());

        assert_eq!(
            resolve(&resolver, "${configurationValue:{a}}"),
            Resolution::Resolved("v}".into())
        );
    }

    #[test]
    fn test_whole_span_check_uses_raw_length() {
        let evaluator = Fixed::new("e")
            .with("A", "")
            .with("B", "${e:C}")
            .with("C", "z");
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions::default());

        // After the first pass `${e:B}` is the whole current value, but it is
        // spliced rather than returned, so its result is expanded further.
        assert_eq!(
            resolve(&resolver, "${e:A}${e:B}"),
            Resolution::Resolved("z".into())
        );
    }

    #[test]
    fn test_registry_order_decides_which_tag_goes_first() {
        let first = Fixed::new("a").with("1", "A");
        let second = Fixed::new("b").with("2", "B");
        let options = ResolverOptions { max_passes: 1 };
        let resolver = Resolver::new(registry(vec![second, first]), options);

        assert_eq!(
            resolve(&resolver, "${a:1}${b:2}"),
            Resolution::Exhausted("${a:1}B".into())
        );
    }

    #[test]
    fn test_idempotent() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions::default());
        let raw = "${environment:A}-${environment:B}";

        let first = resolve(&resolver, raw);
        let second = resolve(&resolver, raw);

        assert_eq!(first, second);
        assert_eq!(resolve(&resolver, first.value().unwrap()), Resolution::Unchanged);
    }

    #[test]
    fn test_self_expanding_value_hits_pass_ceiling() {
        let evaluator = Fixed::new("grow").with("x", "${grow:x}!");
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions { max_passes: 5 });

        assert_eq!(
            resolve(&resolver, "a${grow:x}"),
            Resolution::Exhausted("a${grow:x}!!!!!".into())
        );
    }

    #[test]
    fn test_zero_pass_ceiling_leaves_raw_unchanged() {
        let resolver = Resolver::new(registry(vec![env()]), ResolverOptions { max_passes: 0 });

        assert_eq!(resolve(&resolver, "a${environment:A}"), Resolution::Unchanged);
        // A whole-value replacement needs no rewriting pass.
        assert_eq!(
            resolve(&resolver, "${environment:A}"),
            Resolution::Resolved("x".into())
        );
    }

    #[test]
    fn test_cyclic_evaluators_terminate() {
        let a = Fixed::new("a").with("x", "${b:x}");
        let b = Fixed::new("b").with("x", "${a:x}");
        let resolver = Resolver::new(registry(vec![a, b]), ResolverOptions::default());

        assert!(matches!(
            resolve(&resolver, "pre ${a:x}"),
            Resolution::Exhausted(_)
        ));
    }

    #[test]
    fn test_evaluator_echoing_its_placeholder_settles() {
        let evaluator = Fixed::new("echo").with("x", "${echo:x}");
        let resolver = Resolver::new(registry(vec![evaluator]), ResolverOptions::default());

        assert_eq!(resolve(&resolver, "a ${echo:x}"), Resolution::Unchanged);
        assert_eq!(resolve(&resolver, "${echo:x}"), Resolution::Unchanged);
    }
}
