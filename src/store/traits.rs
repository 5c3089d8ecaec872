//! Batch store trait definition

use super::errors::StoreResult;

/// Atomic key-value operations the batch protocol relies on
///
/// Every operation is individually atomic across all processes sharing the
/// backend. Nothing is layered on top: callers compose these primitives and
/// accept that the composition is not atomic as a whole.
pub trait BatchStore: Send + Sync {
    /// Atomically increment an integer key, initializing absent keys to 0 first
    fn increment(&self, key: &str) -> impl std::future::Future<Output = StoreResult<i64>> + Send;

    /// Atomically decrement an integer key, initializing absent keys to 0 first
    ///
    /// The result may go negative; the store does not guard against misuse.
    fn decrement(&self, key: &str) -> impl std::future::Future<Output = StoreResult<i64>> + Send;

    /// Set a key to a string value
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Get a key's value, `Ok(None)` when absent
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = StoreResult<Option<String>>> + Send;

    /// Delete a key; deleting an absent key succeeds
    fn delete(&self, key: &str) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Decrement `count_key` and report whether `flag_key` exists, as one atomic step
    fn decrement_and_probe(
        &self,
        count_key: &str,
        flag_key: &str,
    ) -> impl std::future::Future<Output = StoreResult<(i64, bool)>> + Send;

    /// Check if the store backend is reachable
    fn health_check(&self) -> impl std::future::Future<Output = StoreResult<bool>> + Send;

    /// Get the name of the store provider
    fn provider_name(&self) -> &'static str;

    /// Whether state is shared across processes
    fn is_distributed(&self) -> bool;
}
