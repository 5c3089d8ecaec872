//! Configuration Loader
//!
//! Layers configuration sources in order:
//! 0. Loads a `.env` file if present (via dotenvy)
//! 1. Built-in defaults (`BatchConfig::default()`)
//! 2. Optional TOML file from `TASKER_BATCH_CONFIG_PATH`
//! 3. `TASKER_BATCH__*` environment variables (`__` separates nesting levels,
//!    e.g. `TASKER_BATCH__STORE__REDIS__URL`)
//!
//! The merged result is validated before it is returned.

use super::error::{ConfigResult, ConfigurationError};
use super::BatchConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the TOML file to load
pub const CONFIG_PATH_ENV: &str = "TASKER_BATCH_CONFIG_PATH";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "TASKER_BATCH";

/// Zero-state configuration loader
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the process environment
    pub fn load() -> ConfigResult<BatchConfig> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }

        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::build(path.as_deref(), None)
    }

    /// Load configuration from an explicit TOML file plus environment overrides
    pub fn load_from_path(path: &Path) -> ConfigResult<BatchConfig> {
        Self::build(Some(path), None)
    }

    /// Load with an explicit variable map instead of the process environment
    ///
    /// Useful for testing without modifying global environment variables.
    pub fn load_with_env(
        path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> ConfigResult<BatchConfig> {
        Self::build(path, Some(env))
    }

    fn build(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> ConfigResult<BatchConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let path_str = path.to_string_lossy();
            if !path.is_file() {
                return Err(ConfigurationError::load_error(
                    path_str,
                    "configuration file does not exist or is not a regular file",
                ));
            }
            builder = builder.add_source(
                config::File::new(&path_str, config::FileFormat::Toml).required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let merged = builder.build().map_err(|e| {
            let source_name = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "environment".to_string());
            ConfigurationError::load_error(source_name, e)
        })?;

        let config: BatchConfig = merged
            .try_deserialize()
            .map_err(|e| ConfigurationError::DeserializeError {
                error: e.to_string(),
            })?;

        config.validate()?;

        info!(
            backend = %config.store.backend,
            key_prefix = %config.store.key_prefix,
            completion_check = ?config.completion.check,
            cleanup_count_key = config.completion.cleanup_count_key,
            "Batch configuration loaded"
        );

        Ok(config)
    }
}
