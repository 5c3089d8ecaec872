//! In-process batch store
//!
//! Backs the batch protocol with a `DashMap` for single-process deployments
//! and tests. Each key operation is atomic through the map's shard locks.
//!
//! **Important**: This store is NOT distributed. Hooks running in other
//! processes will not observe its counters or flags.

use crate::store::errors::{StoreError, StoreResult};
use crate::store::traits::BatchStore;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// In-memory batch store
///
/// Clones share the same underlying map, so a clone handed to each hook sees
/// the same counters.
#[derive(Clone, Default)]
pub struct MemoryBatchStore {
    entries: Arc<DashMap<String, String>>,
    // Single-key ops take the read side; multi-key ops take the write side
    multi_key: Arc<RwLock<()>>,
}

impl std::fmt::Debug for MemoryBatchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBatchStore")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl MemoryBatchStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| "0".to_string());
        let current: i64 = entry.parse().map_err(|_| StoreError::InvalidValue {
            key: key.to_string(),
            reason: format!("value '{}' is not an integer", entry.value()),
        })?;
        let next = current.checked_add(delta).ok_or_else(|| StoreError::InvalidValue {
            key: key.to_string(),
            reason: "increment or decrement would overflow".to_string(),
        })?;
        *entry = next.to_string();
        Ok(next)
    }
}

impl BatchStore for MemoryBatchStore {
    async fn increment(&self, key: &str) -> StoreResult<i64> {
        let _shared = self.multi_key.read();
        let value = self.add(key, 1)?;
        debug!(key = key, value = value, "Store INCR (memory)");
        Ok(value)
    }

    async fn decrement(&self, key: &str) -> StoreResult<i64> {
        let _shared = self.multi_key.read();
        let value = self.add(key, -1)?;
        debug!(key = key, value = value, "Store DECR (memory)");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _shared = self.multi_key.read();
        self.entries.insert(key.to_string(), value.to_string());
        debug!(key = key, "Store SET (memory)");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _shared = self.multi_key.read();
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let _shared = self.multi_key.read();
        self.entries.remove(key);
        debug!(key = key, "Store DEL (memory)");
        Ok(())
    }

    async fn decrement_and_probe(&self, count_key: &str, flag_key: &str) -> StoreResult<(i64, bool)> {
        let _exclusive = self.multi_key.write();
        let value = self.add(count_key, -1)?;
        let flagged = self.entries.contains_key(flag_key);
        debug!(
            count_key = count_key,
            value = value,
            flag_key = flag_key,
            flagged = flagged,
            "Store DECR+EXISTS (memory)"
        );
        Ok((value, flagged))
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }

    fn is_distributed(&self) -> bool {
        false
    }
}
