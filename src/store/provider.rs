//! Store provider
//!
//! Uses enum dispatch for zero-cost abstraction over the store backends.
//! Coordination state cannot be faked, so construction failures surface as
//! errors instead of degrading to a no-op backend.

use super::errors::{StoreError, StoreResult};
use super::providers::MemoryBatchStore;
use super::traits::BatchStore;
use crate::config::{StoreConfig, MEMORY_BACKENDS, REDIS_BACKENDS};
use tracing::info;

#[cfg(feature = "store-redis")]
use super::providers::RedisBatchStore;

/// Internal store backend enum for zero-cost dispatch
#[derive(Debug, Clone)]
enum StoreBackend {
    /// Redis store provider (boxed to reduce enum size)
    #[cfg(feature = "store-redis")]
    Redis(Box<RedisBatchStore>),

    /// In-process store provider
    Memory(MemoryBatchStore),
}

/// Handle to the shared batch store
///
/// Cheap to clone; clones talk to the same backend. Pass one into each
/// component that needs the store rather than resolving it globally.
#[derive(Debug, Clone)]
pub struct StoreProvider {
    backend: StoreBackend,
}

impl StoreProvider {
    /// Build a provider from configuration
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let backend = config.backend.as_str();

        if REDIS_BACKENDS.contains(&backend) {
            return Self::create_redis_backend(config).await;
        }

        if MEMORY_BACKENDS.contains(&backend) {
            info!(backend = "memory", "Batch store initialized (not distributed)");
            return Ok(Self::memory(MemoryBatchStore::new()));
        }

        Err(StoreError::ConnectionError(format!(
            "Unknown store backend '{backend}'"
        )))
    }

    #[cfg(feature = "store-redis")]
    async fn create_redis_backend(config: &StoreConfig) -> StoreResult<Self> {
        let redis_config = config.redis.as_ref().ok_or_else(|| {
            StoreError::ConnectionError(
                "Redis store selected but no [store.redis] config found".to_string(),
            )
        })?;

        let store = RedisBatchStore::from_config(redis_config).await?;
        info!(
            backend = %config.backend,
            url = %super::providers::redis::redact_url(&redis_config.url),
            "Batch store initialized"
        );
        Ok(Self::redis(store))
    }

    #[cfg(not(feature = "store-redis"))]
    async fn create_redis_backend(config: &StoreConfig) -> StoreResult<Self> {
        Err(StoreError::ConnectionError(format!(
            "Store backend '{}' requested but 'store-redis' feature not enabled",
            config.backend
        )))
    }

    /// Wrap an existing in-memory store
    pub fn memory(store: MemoryBatchStore) -> Self {
        Self {
            backend: StoreBackend::Memory(store),
        }
    }

    /// Wrap an existing Redis store
    #[cfg(feature = "store-redis")]
    pub fn redis(store: RedisBatchStore) -> Self {
        Self {
            backend: StoreBackend::Redis(Box::new(store)),
        }
    }
}

impl BatchStore for StoreProvider {
    async fn increment(&self, key: &str) -> StoreResult<i64> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.increment(key).await,
            StoreBackend::Memory(s) => s.increment(key).await,
        }
    }

    async fn decrement(&self, key: &str) -> StoreResult<i64> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.decrement(key).await,
            StoreBackend::Memory(s) => s.decrement(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.set(key, value).await,
            StoreBackend::Memory(s) => s.set(key, value).await,
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.get(key).await,
            StoreBackend::Memory(s) => s.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.delete(key).await,
            StoreBackend::Memory(s) => s.delete(key).await,
        }
    }

    async fn decrement_and_probe(&self, count_key: &str, flag_key: &str) -> StoreResult<(i64, bool)> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.decrement_and_probe(count_key, flag_key).await,
            StoreBackend::Memory(s) => s.decrement_and_probe(count_key, flag_key).await,
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.health_check().await,
            StoreBackend::Memory(s) => s.health_check().await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.provider_name(),
            StoreBackend::Memory(s) => s.provider_name(),
        }
    }

    fn is_distributed(&self) -> bool {
        match &self.backend {
            #[cfg(feature = "store-redis")]
            StoreBackend::Redis(s) => s.is_distributed(),
            StoreBackend::Memory(s) => s.is_distributed(),
        }
    }
}
