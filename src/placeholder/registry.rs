use std::sync::Arc;

use super::Evaluator;
use crate::config::ConfigError;

/// An ordered set of evaluators, consulted in registration order.
///
/// Names must be unique by exact comparison. Placeholder tags are matched
/// against them ignoring ASCII case.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorRegistry {
    evaluators: Vec<Arc<dyn Evaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, evaluator: Arc<dyn Evaluator>) -> Result<(), ConfigError> {
        let name = evaluator.name();
        if name.is_empty() {
            return Err(ConfigError::EmptyEvaluatorName);
        }
        if self.evaluators.iter().any(|existing| existing.name() == name) {
            return Err(ConfigError::DuplicateEvaluator(name.to_string()));
        }
        self.evaluators.push(evaluator);
        Ok(())
    }

    /// Finds the evaluator answering to `tag`, ignoring ASCII case.
    pub fn find(&self, tag: &str) -> Option<&Arc<dyn Evaluator>> {
        self.evaluators
            .iter()
            .find(|evaluator| evaluator.name().eq_ignore_ascii_case(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Evaluator>> + '_ {
        self.evaluators.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.evaluators.iter().map(|evaluator| evaluator.name())
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}

impl TryFrom<Vec<Arc<dyn Evaluator>>> for EvaluatorRegistry {
    type Error = ConfigError;

    fn try_from(evaluators: Vec<Arc<dyn Evaluator>>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for evaluator in evaluators {
            registry.register(evaluator)?;
        }
        Ok(registry)
    }
}
