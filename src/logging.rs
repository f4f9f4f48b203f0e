//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ConfigRoot;
use crate::Error;

/// Configuration key holding the default log filter, e.g. `debug` or `keystone=trace`.
pub const LEVEL_KEY: &str = "Logging:Level";

const DEFAULT_LEVEL: &str = "info";

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence when set. Otherwise the filter comes from
/// [`LEVEL_KEY`], falling back to `info`. Fails if a global subscriber is
/// already installed.
pub fn init(root: &ConfigRoot) -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_from(root.get(LEVEL_KEY).unwrap_or(DEFAULT_LEVEL))?,
    };

    let fmt_layer = fmt::layer().with_target(true).with_level(true).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

fn filter_from(directive: &str) -> Result<EnvFilter, Error> {
    EnvFilter::try_new(directive).map_err(|source| Error::LogFilter {
        directive: directive.to_string(),
        source,
    })
}
