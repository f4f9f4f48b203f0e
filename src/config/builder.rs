use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::args::ArgsSource;
use super::env::EnvSource;
use super::file::FileSource;
use super::root::ConfigRoot;
use super::snapshot::ConfigSnapshot;
use super::source::{ConfigSource, MemorySource};
use super::ConfigError;
use crate::placeholder::{
    ConfigurationValueEvaluator, EnvironmentEvaluator, Evaluator, ResolverOptions,
};

/// An evaluator requested on the builder, instantiated on every (re)load.
#[derive(Debug, Clone)]
pub(crate) enum EvaluatorSpec {
    Environment,
    ConfigurationValue,
    Custom(Arc<dyn Evaluator>),
}

impl EvaluatorSpec {
    pub(crate) fn instantiate(&self, raw: &Arc<ConfigSnapshot>) -> Arc<dyn Evaluator> {
        match self {
            EvaluatorSpec::Environment => Arc::new(EnvironmentEvaluator::new()),
            EvaluatorSpec::ConfigurationValue => {
                Arc::new(ConfigurationValueEvaluator::new(Arc::clone(raw)))
            }
            EvaluatorSpec::Custom(evaluator) => Arc::clone(evaluator),
        }
    }
}

/// Builder for layered configuration with placeholder resolution.
///
/// Sources are applied in registration order, with later sources overriding
/// earlier ones. TOML tables are flattened into colon-delimited keys
/// (`[database] host` becomes `database:host`).
///
/// ## Placeholders
///
/// Once an evaluator is registered, string values may embed
/// `${tag:expression}` placeholders:
///
/// ```toml
/// [database]
/// host = "localhost"
/// password = "${environment:DB_PASSWORD}"
/// url = "postgres://${configurationValue:database.host}/app"
/// ```
///
/// Placeholders that cannot be evaluated are left as written.
///
/// ## Example
///
/// ```no_run
/// use keystone::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let config: MyConfig = Config::builder()
///     .with_file("config/default.toml", true)
///     .with_file("config/local.toml", false)
///     .with_env("MYAPP", "__")
///     .with_environment_evaluator()
///     .build()?;
/// # Ok::<(), keystone::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
    evaluators: Vec<EvaluatorSpec>,
    options: ResolverOptions,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads environment variables named `{prefix}{separator}...`.
    ///
    /// Remaining separators become key delimiters, so with prefix `MYAPP` and
    /// separator `__`, `MYAPP__Database__Host` sets `Database:Host`.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Loads `--Key=value` style command-line arguments.
    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_source(ArgsSource::new(args))
    }

    /// Adds explicit key/value pairs.
    pub fn with_values<K, V>(self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.with_source(values.into_iter().collect::<MemorySource>())
    }

    /// Adds any [`ConfigSource`] as the next layer.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Registers the `environment` evaluator.
    pub fn with_environment_evaluator(mut self) -> Self {
        self.evaluators.push(EvaluatorSpec::Environment);
        self
    }

    /// Registers the `configurationValue` evaluator, reading the loaded
    /// values as they were before placeholder resolution.
    pub fn with_configuration_value_evaluator(mut self) -> Self {
        self.evaluators.push(EvaluatorSpec::ConfigurationValue);
        self
    }

    /// Registers a custom evaluator. Evaluators are consulted in registration order.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluators.push(EvaluatorSpec::Custom(evaluator));
        self
    }

    /// Caps the number of rewriting passes spent on a single value.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.options.max_passes = max_passes;
        self
    }

    /// Loads every source and assembles the layered store.
    pub fn build_root(self) -> Result<ConfigRoot, ConfigError> {
        ConfigRoot::load(self.sources, self.evaluators, self.options)
    }

    /// Builds the store and deserializes the effective configuration into `T`.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        self.build_root()?.bind()
    }
}
