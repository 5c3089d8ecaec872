//! Per-batch outstanding work counter
//!
//! One increment per unit of work enqueued, one decrement per unit finished.
//! Atomicity comes entirely from the store; nothing is locked locally.

use super::keys::{BatchId, KeyNamespace};
use crate::store::{BatchStore, StoreError, StoreProvider, StoreResult};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CompletionCounter<S = StoreProvider> {
    store: S,
    keys: KeyNamespace,
}

impl<S: BatchStore> CompletionCounter<S> {
    pub fn new(store: S, keys: KeyNamespace) -> Self {
        Self { store, keys }
    }

    /// Record one more unit of work in the batch, returning the new count
    pub async fn on_enqueue(&self, id: &BatchId) -> StoreResult<i64> {
        let key = self.keys.count_key(id);
        let count = self.store.increment(&key).await?;
        debug!(batch_id = %id, key = %key, count = count, "Incremented batch count");
        Ok(count)
    }

    /// Record one finished unit of work, returning the new count
    ///
    /// Success and failure of the unit are not distinguished.
    pub async fn on_complete(&self, id: &BatchId) -> StoreResult<i64> {
        let key = self.keys.count_key(id);
        let count = self.store.decrement(&key).await?;
        debug!(batch_id = %id, key = %key, count = count, "Decremented batch count");
        Ok(count)
    }

    /// Current count; a batch that was never enqueued reads as 0
    pub async fn current(&self, id: &BatchId) -> StoreResult<i64> {
        let key = self.keys.count_key(id);
        match self.store.get(&key).await? {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|_| StoreError::InvalidValue {
                key,
                reason: format!("value '{raw}' is not an integer"),
            }),
        }
    }

    /// Drop the count key
    ///
    /// Any increment racing with this starts a fresh count from zero.
    pub async fn reset(&self, id: &BatchId) -> StoreResult<()> {
        let key = self.keys.count_key(id);
        self.store.delete(&key).await?;
        debug!(batch_id = %id, key = %key, "Deleted batch count");
        Ok(())
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn keys(&self) -> &KeyNamespace {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBatchStore;

    fn counter() -> (CompletionCounter<MemoryBatchStore>, MemoryBatchStore) {
        let store = MemoryBatchStore::new();
        (
            CompletionCounter::new(store.clone(), KeyNamespace::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_enqueue_and_complete_track_outstanding_work() {
        let (counter, _) = counter();
        let id = BatchId::from("b1");

        assert_eq!(counter.on_enqueue(&id).await.unwrap(), 1);
        assert_eq!(counter.on_enqueue(&id).await.unwrap(), 2);
        assert_eq!(counter.on_complete(&id).await.unwrap(), 1);
        assert_eq!(counter.current(&id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_uses_count_key() {
        let (counter, store) = counter();
        let id = BatchId::from("b1");

        counter.on_enqueue(&id).await.unwrap();
        assert_eq!(store.get("b1_count").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_batch_reads_zero() {
        let (counter, _) = counter();
        assert_eq!(counter.current(&BatchId::from("missing")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_without_enqueue_is_not_validated() {
        let (counter, _) = counter();
        assert_eq!(counter.on_complete(&BatchId::from("b9")).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_reset_removes_count_key() {
        let (counter, store) = counter();
        let id = BatchId::from("b1");

        counter.on_enqueue(&id).await.unwrap();
        counter.reset(&id).await.unwrap();
        assert!(store.get("b1_count").await.unwrap().is_none());
        assert_eq!(counter.on_enqueue(&id).await.unwrap(), 1);
    }
}
