//! Configuration loading and management.

mod args;
mod bind;
mod builder;
mod env;
mod error;
mod file;
mod root;
mod snapshot;
mod source;

pub use args::ArgsSource;
pub use builder::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use root::ConfigRoot;
pub use snapshot::{combine_key, ConfigSnapshot, KEY_DELIMITER};
pub use source::{ConfigProvider, ConfigSource, MemorySource};

pub(crate) use snapshot::normalize_key;
