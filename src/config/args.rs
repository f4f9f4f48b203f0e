//! Command-line argument configuration source.

use super::snapshot::ConfigSnapshot;
use super::source::ConfigSource;
use super::ConfigError;

/// Loads configuration from command-line style arguments.
///
/// Accepted forms:
///
/// - `--Key=value`, `-Key=value`, `/Key=value`, `Key=value`
/// - `--Key value`, `/Key value` (the value is the next argument)
///
/// Dots are not treated specially; use `:` to address nested keys
/// (`--Database:Host=db`).
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    args: Vec<String>,
}

impl ArgsSource {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Uses the arguments of the current process, skipping the program name.
    pub fn from_process() -> Self {
        Self::new(std::env::args().skip(1))
    }
}

impl ConfigSource for ArgsSource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        let mut snapshot = ConfigSnapshot::new();
        let mut args = self.args.iter();

        while let Some(arg) = args.next() {
            let (flagged, body) = match strip_flag(arg) {
                Some(body) => (true, body),
                None => (false, arg.as_str()),
            };

            match body.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    snapshot.insert(key, Some(value.to_string()));
                }
                Some(_) => return Err(ConfigError::InvalidArgument(arg.clone())),
                // A bare positional argument carries no configuration.
                None if !flagged => continue,
                None => {
                    if body.is_empty() {
                        return Err(ConfigError::InvalidArgument(arg.clone()));
                    }
                    let value = args
                        .next()
                        .ok_or_else(|| ConfigError::InvalidArgument(arg.clone()))?;
                    snapshot.insert(body, Some(value.clone()));
                }
            }
        }

        Ok(snapshot)
    }
}

fn strip_flag(arg: &str) -> Option<&str> {
    arg.strip_prefix("--")
        .or_else(|| arg.strip_prefix('-'))
        .or_else(|| arg.strip_prefix('/'))
}
