//! Shared helpers for batch integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tasker_batch::batch::{callback_fn, BatchCoordinator, BatchId, CallbackRegistry, KeyNamespace};
use tasker_batch::config::CompletionConfig;
use tasker_batch::store::{BatchStore, MemoryBatchStore, StoreError, StoreResult};

/// One recorded callback invocation: (callback name, batch id, args)
pub type CallLog = Arc<Mutex<Vec<(String, BatchId, Vec<Value>)>>>;

/// Registry whose callbacks append to a shared log
pub fn recording_registry(names: &[&str]) -> (CallbackRegistry, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CallbackRegistry::new();
    for name in names {
        let sink = log.clone();
        let label = name.to_string();
        registry
            .register(
                *name,
                callback_fn(move |id, args| {
                    let sink = sink.clone();
                    let label = label.clone();
                    async move {
                        sink.lock().push((label, id, args));
                        Ok(())
                    }
                }),
            )
            .expect("valid callback name");
    }
    (registry, log)
}

pub fn memory_coordinator(
    registry: CallbackRegistry,
) -> (BatchCoordinator<MemoryBatchStore>, MemoryBatchStore) {
    let store = MemoryBatchStore::new();
    let coordinator = BatchCoordinator::new(
        store.clone(),
        KeyNamespace::default(),
        registry,
        CompletionConfig::default(),
    );
    (coordinator, store)
}

/// Memory store that can be told to fail specific operations
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryBatchStore,
    fail_decrement: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
    fail_set: Arc<AtomicBool>,
    stall_set: Arc<AtomicBool>,
    close_on_decrement: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryBatchStore {
        &self.inner
    }

    pub fn fail_decrement(&self, fail: bool) {
        self.fail_decrement.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    /// Write the value, then never reply, as a store whose reply is lost
    pub fn stall_set(&self, stall: bool) {
        self.stall_set.store(stall, Ordering::SeqCst);
    }

    /// Delete the batch's in-progress marker right after each decrement,
    /// as if assembly closed between the decrement and the flag read
    pub fn close_assembly_on_decrement(&self, close: bool) {
        self.close_on_decrement.store(close, Ordering::SeqCst);
    }

    async fn close_assembly_for(&self, count_key: &str) -> StoreResult<()> {
        if !self.close_on_decrement.load(Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(prefix) = count_key.strip_suffix("_count") {
            self.inner.delete(&format!("{prefix}_in_progress")).await?;
        }
        Ok(())
    }

    fn check(flag: &AtomicBool, op: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::ConnectionError(format!("{op} refused: store unreachable")))
        } else {
            Ok(())
        }
    }
}

impl BatchStore for FlakyStore {
    async fn increment(&self, key: &str) -> StoreResult<i64> {
        self.inner.increment(key).await
    }

    async fn decrement(&self, key: &str) -> StoreResult<i64> {
        Self::check(&self.fail_decrement, "DECR")?;
        let remaining = self.inner.decrement(key).await?;
        self.close_assembly_for(key).await?;
        Ok(remaining)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Self::check(&self.fail_set, "SET")?;
        self.inner.set(key, value).await?;
        if self.stall_set.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        Self::check(&self.fail_delete, "DEL")?;
        self.inner.delete(key).await
    }

    async fn decrement_and_probe(&self, count_key: &str, flag_key: &str) -> StoreResult<(i64, bool)> {
        Self::check(&self.fail_decrement, "DECR")?;
        let probed = self.inner.decrement_and_probe(count_key, flag_key).await?;
        self.close_assembly_for(count_key).await?;
        Ok(probed)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(!self.fail_decrement.load(Ordering::SeqCst))
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }

    fn is_distributed(&self) -> bool {
        false
    }
}
