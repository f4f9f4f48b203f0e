//! Application context: the bootstrapped configuration and shared state.

use serde::de::DeserializeOwned;

use crate::config::{Config, ConfigRoot};
use crate::{logging, Error};

/// Central application context holding configuration.
///
/// Generic over the configuration type `C`, which is bound once at build
/// time from the resolved configuration. The layered [`ConfigRoot`] stays
/// available for direct key lookups.
///
/// ## Example
///
/// ```no_run
/// use keystone::{AppContext, Config};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let ctx = AppContext::builder()
///     .with_config(
///         Config::builder()
///             .with_file("config.toml", true)
///             .with_env("MYAPP", "__")
///             .with_environment_evaluator(),
///     )
///     .with_logging(true)
///     .build::<MyConfig>()?;
///
/// let config = ctx.config();
/// let raw = ctx.root().get("Database:Host");
/// # Ok::<(), keystone::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext<C> {
    config: C,
    root: ConfigRoot,
}

impl<C> AppContext<C> {
    /// Returns a reference to the bound configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Returns the layered configuration store.
    pub fn root(&self) -> &ConfigRoot {
        &self.root
    }

    /// Splits the context into the bound configuration and the store.
    pub fn into_parts(self) -> (C, ConfigRoot) {
        (self.config, self.root)
    }
}

impl AppContext<()> {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }
}

/// Builder for constructing an [`AppContext`].
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    config: Option<Config>,
    logging: bool,
}

impl AppContextBuilder {
    /// Sets the configuration pipeline to run at build time.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Installs the global tracing subscriber during build.
    ///
    /// The filter is read from the resolved configuration; see [`logging::init`].
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Loads the configuration, optionally starts logging, and binds `C`.
    ///
    /// Returns an error if no configuration was provided.
    pub fn build<C: DeserializeOwned>(self) -> Result<AppContext<C>, Error> {
        let root = self.config.ok_or(Error::MissingConfig)?.build_root()?;

        if self.logging {
            logging::init(&root)?;
        }

        let config = root.bind()?;
        tracing::debug!(keys = root.raw_snapshot().len(), "application context ready");

        Ok(AppContext { config, root })
    }
}
