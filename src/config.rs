//! Application configuration.
//!
//! Values come from an optional file (YAML, TOML or JSON, picked by
//! extension) overlaid by `POLICY_ENGINE_*` environment variables. Nested
//! keys are separated by a double underscore:
//!
//! ```text
//! POLICY_ENGINE_ENGINE__SEMANTICS=compat
//! POLICY_ENGINE_LOGGING__JSON=true
//! ```

use crate::core::Semantics;
use crate::{Error, Result};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "POLICY_ENGINE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How combinators treat derived values
    #[serde(default)]
    pub semantics: Semantics,
    /// Policy document loaded at startup
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::config_key(
                    format!("configuration file {} does not exist", path.display()),
                    "config",
                ));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::config_key(
                format!(
                    "unknown log level {:?}, expected one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
                "logging.level",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.semantics, Semantics::Strict);
        assert_eq!(config.engine.policy_file, None);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let path = write_temp(
            "policy-engine.yaml",
            "engine:\n  semantics: compat\n  policy_file: /etc/policies.yaml\nlogging:\n  level: debug\n",
        );
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.engine.semantics, Semantics::Compat);
        assert_eq!(
            config.engine.policy_file,
            Some(PathBuf::from("/etc/policies.yaml"))
        );
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_toml_partial() {
        let path = write_temp("policy-engine.toml", "[logging]\njson = true\n");
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.logging.json);
        assert_eq!(config.engine.semantics, Semantics::Strict);
    }

    #[test]
    fn test_invalid_values() {
        let path = write_temp("bad-semantics.yaml", "engine:\n  semantics: loose\n");
        let err = Config::load(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.is_configuration());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        match config.validate().unwrap_err() {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("logging.level")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/policy-engine.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
