//! File-based configuration source.

use std::path::{Path, PathBuf};

use super::snapshot::ConfigSnapshot;
use super::source::ConfigSource;
use super::ConfigError;

/// A configuration source that loads from a TOML file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist contribute an empty layer.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, loading fails if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        match load_config_file(&self.path, self.required)? {
            Some(table) => Ok(ConfigSnapshot::from_toml(&table)),
            None => Ok(ConfigSnapshot::new()),
        }
    }
}

/// Loads and parses a TOML config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn load_config_file(path: &Path, required: bool) -> Result<Option<toml::Table>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
            tracing::debug!(path = %path.display(), "loaded config file");
            Ok(Some(table))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                tracing::debug!(path = %path.display(), "optional config file not found, skipping");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
