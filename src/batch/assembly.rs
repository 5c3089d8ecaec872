//! # Batch Assembly Guard
//!
//! Marks a batch as "still being assembled" for the duration of its enqueue
//! phase. While the in-progress key exists the completion detector will not
//! dispatch, even if the counter touches zero between two enqueues.
//!
//! The marker is released on every exit path of the assembly procedure:
//!
//! - the procedure returns `Ok` or `Err`
//! - the procedure panics (the key is cleared, then the panic resumes)
//! - the `assemble_batch` future is dropped mid-flight (the delete is
//!   spawned onto the current tokio runtime)
//!
//! A stuck marker would block completion detection for the batch forever.

use super::keys::{BatchId, KeyNamespace};
use crate::error::BatchError;
use crate::store::{BatchStore, StoreProvider, StoreResult};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

/// Value written to the in-progress key; any present value counts as "open"
const IN_PROGRESS_MARKER: &str = "1";

#[derive(Debug, Clone)]
pub struct AssemblyGuard<S = StoreProvider> {
    store: S,
    keys: KeyNamespace,
}

impl<S> AssemblyGuard<S>
where
    S: BatchStore + Clone + 'static,
{
    pub fn new(store: S, keys: KeyNamespace) -> Self {
        Self { store, keys }
    }

    /// Run `procedure` with the batch marked as in progress
    ///
    /// The procedure is expected to enqueue the batch's units of work, each of
    /// which reports through the enqueue hook. Its result is returned as-is;
    /// if it failed, a failure to clear the marker is logged rather than
    /// replacing the procedure's error.
    pub async fn assemble_batch<F, Fut, T, E>(&self, id: &BatchId, procedure: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BatchError>,
    {
        info!(batch_id = %id, "Assembling batch");
        // Armed before the SET: a write can land even if its reply never arrives
        let mut marker = MarkerRelease::armed(self.store.clone(), self.keys.in_progress_key(id));
        self.open(id)
            .await
            .map_err(|e| E::from(BatchError::from(e)))?;

        let outcome = AssertUnwindSafe(procedure()).catch_unwind().await;
        let cleared = self.close(id).await;
        marker.disarm();

        match outcome {
            Ok(Ok(value)) => {
                cleared.map_err(|e| E::from(BatchError::from(e)))?;
                debug!(batch_id = %id, "Batch assembly finished");
                Ok(value)
            }
            Ok(Err(procedure_error)) => {
                if let Err(e) = cleared {
                    error!(
                        batch_id = %id,
                        error = %e,
                        "Failed to clear in-progress marker after assembly error"
                    );
                }
                warn!(batch_id = %id, "Batch assembly procedure failed");
                Err(procedure_error)
            }
            Err(panic) => {
                if let Err(e) = cleared {
                    error!(
                        batch_id = %id,
                        error = %e,
                        "Failed to clear in-progress marker after assembly panic"
                    );
                }
                error!(batch_id = %id, "Batch assembly procedure panicked");
                std::panic::resume_unwind(panic)
            }
        }
    }

    /// Mark the batch as being assembled
    pub async fn open(&self, id: &BatchId) -> StoreResult<()> {
        let key = self.keys.in_progress_key(id);
        self.store.set(&key, IN_PROGRESS_MARKER).await?;
        debug!(batch_id = %id, key = %key, "Batch assembly opened");
        Ok(())
    }

    /// Clear the in-progress marker
    pub async fn close(&self, id: &BatchId) -> StoreResult<()> {
        let key = self.keys.in_progress_key(id);
        self.store.delete(&key).await?;
        debug!(batch_id = %id, key = %key, "Batch assembly closed");
        Ok(())
    }

    /// Live read of the in-progress marker
    pub async fn is_assembly_in_progress(&self, id: &BatchId) -> StoreResult<bool> {
        let key = self.keys.in_progress_key(id);
        Ok(self.store.get(&key).await?.is_some())
    }
}

/// Clears the marker from `Drop` when `assemble_batch` is cancelled or the
/// marker write failed
struct MarkerRelease<S: BatchStore + Clone + 'static> {
    pending: Option<(S, String)>,
}

impl<S: BatchStore + Clone + 'static> MarkerRelease<S> {
    fn armed(store: S, key: String) -> Self {
        Self {
            pending: Some((store, key)),
        }
    }

    fn disarm(&mut self) {
        self.pending = None;
    }
}

impl<S: BatchStore + Clone + 'static> Drop for MarkerRelease<S> {
    fn drop(&mut self) {
        let Some((store, key)) = self.pending.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(key = %key, "Batch assembly did not close, releasing in-progress marker");
                handle.spawn(async move {
                    if let Err(e) = store.delete(&key).await {
                        error!(key = %key, error = %e, "Failed to release in-progress marker");
                    }
                });
            }
            Err(_) => {
                error!(
                    key = %key,
                    "Batch assembly cancelled outside a tokio runtime, in-progress marker left set"
                );
            }
        }
    }
}
