//! Configuration placeholder resolution.
//!
//! String values may embed `${tag:expression}` placeholders. Each tag names an
//! [`Evaluator`]; the [`Resolver`] rewrites values until they stop changing and
//! the [`ResolvedOverlay`] publishes the results as a configuration layer over
//! the raw values.
//!
//! There is no escape syntax: the first `}` after `${tag:` always ends the
//! expression.

mod evaluator;
mod overlay;
mod registry;
mod resolver;
mod scanner;

pub use evaluator::{ConfigurationValueEvaluator, EnvironmentEvaluator, Evaluator};
pub use overlay::ResolvedOverlay;
pub use registry::EvaluatorRegistry;
pub use resolver::{Resolution, Resolver, ResolverOptions, DEFAULT_MAX_PASSES};
pub use scanner::{scan, Candidate};
