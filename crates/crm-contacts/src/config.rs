//! Directory configuration.
//!
//! Configuration can be loaded from:
//! - TOML files
//! - Environment variables (CRM_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use crm_contacts::config::DirectoryConfig;
//!
//! let config = DirectoryConfig::from_env();
//! let config = DirectoryConfig::from_file(std::path::Path::new("contacts.toml")).expect("Failed to load");
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crm_core::defaults;

/// Environment variable overriding [`DirectoryConfig::load_delay_ms`].
pub const ENV_FIXTURE_DELAY_MS: &str = "CRM_FIXTURE_DELAY_MS";

/// Environment variable overriding [`DirectoryConfig::event_capacity`].
pub const ENV_EVENT_CAPACITY: &str = "CRM_EVENT_CAPACITY";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for crm_core::Error {
    fn from(e: ConfigError) -> Self {
        crm_core::Error::Config(e.to_string())
    }
}

/// Settings for a [`ContactsHook`](crate::hook::ContactsHook).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Artificial latency of the fixture source, in milliseconds. Zero
    /// disables it.
    pub load_delay_ms: u64,
    /// Buffer size of the directory event bus.
    pub event_capacity: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            load_delay_ms: defaults::FIXTURE_LOAD_DELAY_MS,
            event_capacity: defaults::EVENT_BUS_CAPACITY,
        }
    }
}

impl DirectoryConfig {
    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Read overrides from the environment, falling back to defaults for
    /// unset or unusable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = parse_env(ENV_FIXTURE_DELAY_MS) {
            config.load_delay_ms = ms;
        }
        if let Some(capacity) = parse_env(ENV_EVENT_CAPACITY) {
            config.event_capacity = capacity;
        }
        if let Err(e) = config.validate() {
            warn!(
                key = ENV_EVENT_CAPACITY,
                error = %e,
                "Invalid directory config in environment, using default event capacity"
            );
            config.event_capacity = defaults::EVENT_BUS_CAPACITY;
        }
        debug!(
            load_delay_ms = config.load_delay_ms,
            event_capacity = config.event_capacity,
            "Directory config loaded from environment"
        );
        config
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Directory config loaded from file");
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.event_capacity == 0 {
            return Err(ConfigError::Validation(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serializes tests that mutate process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::default();
        assert_eq!(config.load_delay(), Duration::from_millis(500));
        assert_eq!(config.event_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var(ENV_FIXTURE_DELAY_MS, "0");
        env::set_var(ENV_EVENT_CAPACITY, "16");

        let config = DirectoryConfig::from_env();
        assert_eq!(config.load_delay(), Duration::ZERO);
        assert_eq!(config.event_capacity, 16);

        env::remove_var(ENV_FIXTURE_DELAY_MS);
        env::remove_var(ENV_EVENT_CAPACITY);
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var(ENV_FIXTURE_DELAY_MS, "soon");

        let config = DirectoryConfig::from_env();
        assert_eq!(config.load_delay_ms, defaults::FIXTURE_LOAD_DELAY_MS);

        env::remove_var(ENV_FIXTURE_DELAY_MS);
    }

    #[test]
    fn test_from_env_rejects_zero_capacity() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var(ENV_EVENT_CAPACITY, "0");

        let config = DirectoryConfig::from_env();
        assert_eq!(config.event_capacity, defaults::EVENT_BUS_CAPACITY);
        assert!(config.validate().is_ok());

        env::remove_var(ENV_EVENT_CAPACITY);
    }

    #[test]
    fn test_from_file_with_partial_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "load_delay_ms = 25").unwrap();

        let config = DirectoryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.load_delay_ms, 25);
        assert_eq!(config.event_capacity, defaults::EVENT_BUS_CAPACITY);
    }

    #[test]
    fn test_from_file_rejects_zero_capacity() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "event_capacity = 0").unwrap();

        let err = DirectoryConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = DirectoryConfig::from_file(Path::new("/nonexistent/contacts.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }

    #[test]
    fn test_with_load_delay() {
        let config = DirectoryConfig::default().with_load_delay(Duration::from_millis(10));
        assert_eq!(config.load_delay_ms, 10);
    }
}
