//! # Batch Configuration
//!
//! Typed configuration for the shared store and the completion detector.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasker_batch::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // TASKER_BATCH_CONFIG_PATH (optional TOML file) + TASKER_BATCH__* env overrides
//! let config = ConfigLoader::load()?;
//! println!("store backend: {}", config.store.backend);
//! # Ok(())
//! # }
//! ```
//!
//! ## TOML layout
//!
//! ```toml
//! [store]
//! backend = "redis"        # "redis" | "dragonfly" | "memory" | "in-memory"
//! key_prefix = ""          # empty keeps keys as "<id>_count", "<id>_in_progress"
//!
//! [store.redis]
//! url = "redis://localhost:6379"
//! connection_timeout_seconds = 5
//!
//! [completion]
//! check = "racy"           # "racy" | "atomic"
//! cleanup_count_key = false
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Backends the store provider knows how to build
pub const REDIS_BACKENDS: &[&str] = &["redis", "dragonfly"];
pub const MEMORY_BACKENDS: &[&str] = &["memory", "in-memory"];

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub store: StoreConfig,
    pub completion: CompletionConfig,
}

impl BatchConfig {
    /// Validate backend selection and connection settings
    pub fn validate(&self) -> ConfigResult<()> {
        self.store.validate()
    }
}

/// Shared store selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: String,
    /// Namespace prepended to every derived key as `<prefix>:<key>`
    pub key_prefix: String,
    pub redis: Option<RedisConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            key_prefix: String::new(),
            redis: Some(RedisConfig::default()),
        }
    }
}

impl StoreConfig {
    /// In-process store, mostly for tests and single-process hosts
    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            key_prefix: String::new(),
            redis: None,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let backend = self.backend.as_str();

        if REDIS_BACKENDS.contains(&backend) {
            let redis = self.redis.as_ref().ok_or_else(|| {
                ConfigurationError::missing_required_field("store.redis", "redis store backend")
            })?;
            return redis.validate();
        }

        if MEMORY_BACKENDS.contains(&backend) {
            return Ok(());
        }

        Err(ConfigurationError::invalid_value(
            "store.backend",
            backend,
            "expected one of redis, dragonfly, memory, in-memory",
        ))
    }
}

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout_seconds: 5,
        }
    }
}

impl RedisConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.url.starts_with("redis://")
            || self.url.starts_with("rediss://")
            || self.url.starts_with("redis+unix://"))
        {
            return Err(ConfigurationError::invalid_value(
                "store.redis.url",
                self.url.clone(),
                "expected a redis://, rediss:// or redis+unix:// URL",
            ));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "store.redis.connection_timeout_seconds",
                "0",
                "timeout must be at least one second",
            ));
        }

        Ok(())
    }
}

/// How the completion detector reads the counter and the assembly flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCheck {
    /// Decrement, then read the in-progress flag in a separate round-trip.
    /// A concurrent assembly can close between the two and cause an early dispatch.
    #[default]
    Racy,
    /// Decrement and read the flag in one atomic store operation.
    Atomic,
}

/// Completion detector settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub check: CompletionCheck,
    /// Delete the count key after callbacks dispatch successfully
    pub cleanup_count_key: bool,
}
