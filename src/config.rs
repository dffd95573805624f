//! Router and application configuration.
//!
//! Configuration is read from YAML; every field has a default so an empty
//! file (or no file at all) is valid. Environment variables override file
//! values:
//!
//! - `Q_DIGEST_ALGORITHM` - digest used for `_hash` augmentation
//! - `Q_LOG` - tracing filter directive for the CLI
//!
//! ```yaml
//! router:
//!   digest_algorithm: SHA-256
//! logging:
//!   filter: info
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::runtime::hashing::DEFAULT_DIGEST_ALGORITHM;

pub const DIGEST_ALGORITHM_ENV: &str = "Q_DIGEST_ALGORITHM";
pub const LOG_FILTER_ENV: &str = "Q_LOG";

/// Settings that affect routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Digest algorithm name, resolved when a message needs hashing.
    pub digest_algorithm: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            digest_algorithm: DEFAULT_DIGEST_ALGORITHM.to_string(),
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(name) = std::env::var(DIGEST_ALGORITHM_ENV) {
            self.digest_algorithm = name;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info` or `q=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid YAML, or fails
    /// validation.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml(&contents)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from YAML text without environment overrides.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document for a struct
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        self.router.apply_env();
        if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.router.digest_algorithm.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "router.digest_algorithm cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
