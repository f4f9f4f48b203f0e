use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to bind config: {0}")]
    Bind(String),

    #[error("invalid command-line argument: {0}")]
    InvalidArgument(String),

    #[error("evaluator name must not be empty")]
    EmptyEvaluatorName,

    #[error("an evaluator named '{0}' is already registered")]
    DuplicateEvaluator(String),
}
