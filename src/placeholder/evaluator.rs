//! Named resolvers for `${tag:expression}` placeholders.

use std::sync::Arc;

use crate::config::{ConfigSnapshot, KEY_DELIMITER};

/// Resolves the expression of one placeholder to a value.
///
/// Evaluators report failure by returning `None`; they must not panic on
/// expressions they cannot resolve.
pub trait Evaluator: Send + Sync + std::fmt::Debug {
    /// The placeholder tag this evaluator answers to, e.g. `environment`.
    fn name(&self) -> &str;

    fn try_evaluate(&self, expression: &str) -> Option<String>;
}

/// Resolves `${environment:VAR}` to the value of the environment variable `VAR`.
///
/// An unset variable fails. A variable set to the empty string succeeds with
/// an empty value.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentEvaluator;

impl EnvironmentEvaluator {
    pub const NAME: &'static str = "environment";

    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for EnvironmentEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn try_evaluate(&self, expression: &str) -> Option<String> {
        if expression.is_empty() {
            return None;
        }
        std::env::var_os(expression)?.into_string().ok()
    }
}

/// Resolves `${configurationValue:Section.Key}` against raw configuration.
///
/// Dots in the expression are read as key delimiters, so `Database.Host`
/// and `Database:Host` name the same key. The snapshot is the configuration
/// as loaded, before any placeholders were resolved.
#[derive(Debug, Clone)]
pub struct ConfigurationValueEvaluator {
    snapshot: Arc<ConfigSnapshot>,
}

impl ConfigurationValueEvaluator {
    pub const NAME: &'static str = "configurationValue";

    pub fn new(snapshot: Arc<ConfigSnapshot>) -> Self {
        Self { snapshot }
    }
}

impl Evaluator for ConfigurationValueEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn try_evaluate(&self, expression: &str) -> Option<String> {
        let key = expression.replace('.', &KEY_DELIMITER.to_string());
        self.snapshot.get(&key).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_set_and_unset() {
        std::env::set_var("KEYSTONE_EVAL_SET", "/usr/bin");
        std::env::remove_var("KEYSTONE_EVAL_UNSET");
        let evaluator = EnvironmentEvaluator::new();

        assert_eq!(evaluator.name(), "environment");
        assert_eq!(
            evaluator.try_evaluate("KEYSTONE_EVAL_SET").as_deref(),
            Some("/usr/bin")
        );
        assert_eq!(evaluator.try_evaluate("KEYSTONE_EVAL_UNSET"), None);
    }

    #[test]
    fn test_environment_empty_value_succeeds() {
        std::env::set_var("KEYSTONE_EVAL_EMPTY", "");

        assert_eq!(
            EnvironmentEvaluator.try_evaluate("KEYSTONE_EVAL_EMPTY").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_configuration_value_normalizes_dots() {
        let snapshot: ConfigSnapshot = [("Database:Host", Some("db.local".to_string()))]
            .into_iter()
            .collect();
        let evaluator = ConfigurationValueEvaluator::new(Arc::new(snapshot));

        assert_eq!(evaluator.name(), "configurationValue");
        assert_eq!(
            evaluator.try_evaluate("Database.Host").as_deref(),
            Some("db.local")
        );
        assert_eq!(
            evaluator.try_evaluate("Database:Host").as_deref(),
            Some("db.local")
        );
        assert_eq!(evaluator.try_evaluate("Database.Port"), None);
    }

    #[test]
    fn test_configuration_value_null_fails() {
        let snapshot: ConfigSnapshot = [("Section", None)].into_iter().collect();
        let evaluator = ConfigurationValueEvaluator::new(Arc::new(snapshot));

        assert_eq!(evaluator.try_evaluate("Section"), None);
    }
}
