use super::snapshot::{ConfigSnapshot, KEY_DELIMITER};
use super::source::ConfigSource;
use super::ConfigError;

/// Loads configuration from environment variables sharing a prefix.
///
/// `MYAPP__Database__Host=db` with prefix `MYAPP` and separator `__` becomes
/// the key `Database:Host`. Segment casing is kept as written; key lookups
/// ignore case anyway.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn key_for(&self, var: &str) -> Option<String> {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let path = var.strip_prefix(&prefix_with_sep)?;
        if path.is_empty() {
            return None;
        }
        Some(path.replace(self.separator.as_str(), &KEY_DELIMITER.to_string()))
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        let mut snapshot = ConfigSnapshot::new();

        for (var, value) in std::env::vars_os() {
            let (Some(var), Ok(value)) = (var.to_str(), value.into_string()) else {
                continue;
            };
            if let Some(key) = self.key_for(var) {
                snapshot.insert(key, Some(value));
            }
        }

        tracing::debug!(prefix = %self.prefix, count = snapshot.len(), "loaded environment variables");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let source = EnvSource::new("MYAPP", "__");

        assert_eq!(
            source.key_for("MYAPP__Database__Host").as_deref(),
            Some("Database:Host")
        );
        assert_eq!(source.key_for("MYAPP__"), None);
        assert_eq!(source.key_for("OTHER__Database"), None);
    }

    #[test]
    fn test_env_source_loads_prefixed_vars() {
        std::env::set_var("KEYSTONE_ENV_TEST__Server__Port", "8080");
        std::env::set_var("KEYSTONE_ENV_TEST_UNRELATED", "x");

        let snapshot = EnvSource::new("KEYSTONE_ENV_TEST", "__").load().unwrap();

        assert_eq!(snapshot.get("server:port"), Some("8080"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    #[should_panic(expected = "separator must not be empty")]
    fn test_empty_separator_panics() {
        let _ = EnvSource::new("MYAPP", "");
    }
}
