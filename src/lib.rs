pub mod config;
pub mod context;
mod error;
pub mod logging;
pub mod placeholder;

pub use config::{Config, ConfigError, ConfigRoot};
pub use context::AppContext;
pub use error::Error;
pub use placeholder::{Evaluator, EvaluatorRegistry, ResolvedOverlay, Resolver};
