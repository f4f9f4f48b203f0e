use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the keystone library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("application context requires a configuration")]
    MissingConfig,

    #[error("invalid log filter '{directive}': {source}")]
    LogFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}
