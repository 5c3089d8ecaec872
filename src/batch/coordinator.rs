//! # Batch Coordinator
//!
//! Detects when a dynamically-sized batch has drained and fires its completion
//! callbacks. Wires the host runtime's per-unit hooks to the counter, the
//! assembly guard and the callback registry.
//!
//! ## Protocol
//!
//! ```text
//! assemble_batch(id) ──► set <id>_in_progress
//!   └── enqueue unit ──► after_enqueue_batch ──► INCR <id>_count
//! assembly ends ───────► DEL <id>_in_progress
//!
//! unit finishes ───────► after_perform_batch ──► DECR <id>_count
//!                          └── count == 0 && no <id>_in_progress ──► callbacks
//! ```
//!
//! ## Known race
//!
//! With [`CompletionCheck::Racy`] the decrement and the flag read are two
//! separate store round-trips. Between them an assembly can close while one
//! more enqueue is still in flight, so callbacks can fire before the last unit
//! is counted. [`CompletionCheck::Atomic`] performs both reads in one store
//! operation; it closes the window between decrement and flag read but not the
//! window between an enqueue and its increment.
//!
//! A batch whose counter reaches zero while assembly is still open is not
//! re-checked when assembly closes. Its callbacks fire only if a later
//! completion drives the counter to zero again.

use super::assembly::AssemblyGuard;
use super::callbacks::CallbackRegistry;
use super::counter::CompletionCounter;
use super::keys::{BatchId, KeyNamespace};
use crate::config::{BatchConfig, CompletionCheck, CompletionConfig};
use crate::error::{BatchError, BatchResult};
use crate::store::{BatchStore, StoreProvider, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, instrument, warn};

/// What a single completion report led to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// Units of work are still outstanding (negative under protocol misuse)
    Pending { remaining: i64 },
    /// The counter hit zero but the batch is still being assembled
    AssemblyOpen,
    /// This completion drained the batch and the callbacks ran
    Dispatched { callbacks: usize },
}

impl CompletionOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Coordinates batch completion for one subject
#[derive(Debug, Clone)]
pub struct BatchCoordinator<S = StoreProvider> {
    guard: AssemblyGuard<S>,
    counter: CompletionCounter<S>,
    callbacks: CallbackRegistry,
    completion: CompletionConfig,
}

impl BatchCoordinator<StoreProvider> {
    /// Connect to the configured store and build a coordinator for one subject
    pub async fn from_config(config: &BatchConfig, callbacks: CallbackRegistry) -> BatchResult<Self> {
        config.validate()?;
        let store = StoreProvider::from_config(&config.store).await?;
        Ok(Self::new(
            store,
            KeyNamespace::new(config.store.key_prefix.clone()),
            callbacks,
            config.completion,
        ))
    }
}

impl<S> BatchCoordinator<S>
where
    S: BatchStore + Clone + 'static,
{
    pub fn new(
        store: S,
        keys: KeyNamespace,
        callbacks: CallbackRegistry,
        completion: CompletionConfig,
    ) -> Self {
        if completion.check == CompletionCheck::Atomic {
            info!("Batch completion check uses atomic decrement-and-probe");
        }
        if !store.is_distributed() {
            debug!(
                provider = store.provider_name(),
                "Batch coordinator running on a non-distributed store"
            );
        }

        Self {
            guard: AssemblyGuard::new(store.clone(), keys.clone()),
            counter: CompletionCounter::new(store, keys),
            callbacks,
            completion,
        }
    }

    pub fn guard(&self) -> &AssemblyGuard<S> {
        &self.guard
    }

    pub fn counter(&self) -> &CompletionCounter<S> {
        &self.counter
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Run the enqueue phase of a batch with assembly marked in progress
    pub async fn assemble_batch<F, Fut, T, E>(&self, id: &BatchId, procedure: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BatchError>,
    {
        self.guard.assemble_batch(id, procedure).await
    }

    pub async fn is_assembly_in_progress(&self, id: &BatchId) -> BatchResult<bool> {
        Ok(self.guard.is_assembly_in_progress(id).await?)
    }

    /// Enqueue hook: count one more unit of work in the batch
    pub async fn on_enqueue(&self, id: &BatchId) -> BatchResult<i64> {
        Ok(self.counter.on_enqueue(id).await?)
    }

    /// Host enqueue hook; arguments are accepted for symmetry and not stored
    pub async fn after_enqueue_batch(&self, id: &BatchId, _args: &[Value]) -> BatchResult<i64> {
        self.on_enqueue(id).await
    }

    /// Host completion hook
    pub async fn after_perform_batch(
        &self,
        id: &BatchId,
        args: &[Value],
    ) -> BatchResult<CompletionOutcome> {
        self.after_complete(id, args).await
    }

    /// Count one finished unit and dispatch callbacks if the batch has drained
    ///
    /// Callbacks receive `args` of this triggering unit only. The first
    /// callback error stops dispatch and is returned; nothing is retried.
    #[instrument(skip(self, id, args), fields(batch_id = %id))]
    pub async fn after_complete(
        &self,
        id: &BatchId,
        args: &[Value],
    ) -> BatchResult<CompletionOutcome> {
        let (remaining, assembling) = self.decrement_and_check(id).await?;

        if remaining != 0 {
            if remaining < 0 {
                warn!(
                    batch_id = %id,
                    remaining = remaining,
                    "Batch count went negative, completions exceed enqueues"
                );
            }
            return Ok(CompletionOutcome::Pending { remaining });
        }

        if assembling {
            debug!(
                batch_id = %id,
                "Batch count reached zero while assembly is still in progress"
            );
            return Ok(CompletionOutcome::AssemblyOpen);
        }

        let dispatched = self.dispatch(id, args).await?;

        if self.completion.cleanup_count_key {
            self.counter.reset(id).await?;
        }

        Ok(CompletionOutcome::Dispatched {
            callbacks: dispatched,
        })
    }

    async fn decrement_and_check(&self, id: &BatchId) -> StoreResult<(i64, bool)> {
        match self.completion.check {
            CompletionCheck::Racy => {
                let remaining = self.counter.on_complete(id).await?;
                if remaining != 0 {
                    // Flag only matters at zero; skip the round-trip
                    return Ok((remaining, false));
                }
                let assembling = self.guard.is_assembly_in_progress(id).await?;
                Ok((remaining, assembling))
            }
            CompletionCheck::Atomic => {
                let keys = self.counter.keys();
                self.counter
                    .store()
                    .decrement_and_probe(&keys.count_key(id), &keys.in_progress_key(id))
                    .await
            }
        }
    }

    async fn dispatch(&self, id: &BatchId, args: &[Value]) -> BatchResult<usize> {
        info!(
            batch_id = %id,
            callbacks = self.callbacks.len(),
            "Batch complete, dispatching completion callbacks"
        );

        let mut dispatched = 0;
        for (name, callback) in self.callbacks.iter() {
            debug!(batch_id = %id, callback = name, "Invoking completion callback");
            callback
                .call(id, args)
                .await
                .map_err(|e| BatchError::CallbackFailed {
                    callback: name.to_string(),
                    message: format!("{e:#}"),
                })?;
            dispatched += 1;
        }

        Ok(dispatched)
    }
}
