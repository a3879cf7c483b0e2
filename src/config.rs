//! Engine configuration
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>`, else `surface-expr.toml` if present)
//! 3. `SURFACE_EXPR_*` environment variables (a `.env` file is loaded first)

use std::path::PathBuf;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default config file name, searched in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "surface-expr";

/// Prefix for environment overrides, e.g. `SURFACE_EXPR_MISSING_VARIABLE`
pub const ENV_PREFIX: &str = "SURFACE_EXPR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// What a variable lookup yielding `undefined` does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingVariablePolicy {
    /// The lookup evaluates to `undefined`
    #[default]
    Undefined,
    /// The lookup fails with `MissingVariableValue`
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub missing_variable: MissingVariablePolicy,
    /// Register the built-in function library
    pub stdlib: bool,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_variable: MissingVariablePolicy::Undefined,
            stdlib: true,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Layered loader for [`EngineConfig`]
#[derive(Debug)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    environment: bool,
    dotenv: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            environment: true,
            dotenv: true,
        }
    }
}

impl ConfigBuilder {
    /// Explicit config file; it must exist when set
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Read `SURFACE_EXPR_*` environment overrides (default on)
    pub fn environment(mut self, enabled: bool) -> Self {
        self.environment = enabled;
        self
    }

    /// Load a `.env` file before reading the environment (default on)
    pub fn dotenv(mut self, enabled: bool) -> Self {
        self.dotenv = enabled;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let mut builder = Config::builder();

        match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.clone()));
                }
                debug!(path = %path.display(), "loading config file");
                builder = builder.add_source(File::from(path.as_path()).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false));
            }
        }

        if self.environment {
            if self.dotenv {
                // a missing .env file is fine
                let _ = dotenvy::dotenv();
            }
            builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        }

        let config = builder.build()?.try_deserialize::<EngineConfig>()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "surface-expr-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.missing_variable, MissingVariablePolicy::Undefined);
        assert!(config.stdlib);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let path = write_temp_config(
            "load",
            "missing_variable = \"error\"\nstdlib = false\n",
        );
        let config = EngineConfig::builder()
            .config_path(Some(path.clone()))
            .environment(false)
            .build()
            .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.missing_variable, MissingVariablePolicy::Error);
        assert!(!config.stdlib);
        // unset keys keep their defaults
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = EngineConfig::builder()
            .config_path(Some(PathBuf::from("/nonexistent/surface-expr.toml")))
            .environment(false)
            .build();
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let path = write_temp_config("invalid", "missing_variable = \"explode\"\n");
        let result = EngineConfig::builder()
            .config_path(Some(path.clone()))
            .environment(false)
            .build();
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
