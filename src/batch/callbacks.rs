//! # Completion Callbacks
//!
//! Handlers fired once a batch has drained. Subjects declare their callbacks
//! explicitly through [`BatchedJob`] when they are defined; the registry keeps
//! them ordered by identifier so dispatch order is reproducible across
//! processes.
//!
//! ## Example
//!
//! ```rust
//! use tasker_batch::batch::{callback_fn, BatchedJob, CallbackRegistry};
//! use tasker_batch::BatchResult;
//!
//! struct NightlyExport;
//!
//! impl BatchedJob for NightlyExport {
//!     fn register_batch_callbacks(registry: &mut CallbackRegistry) -> BatchResult<()> {
//!         registry.register(
//!             "after_batch_publish",
//!             callback_fn(|id, _args| async move {
//!                 println!("batch {id} finished");
//!                 Ok(())
//!             }),
//!         )
//!     }
//! }
//!
//! let registry = CallbackRegistry::for_subject::<NightlyExport>().unwrap();
//! assert_eq!(registry.after_batch_hooks(), vec!["after_batch_publish"]);
//! ```

use super::keys::BatchId;
use crate::error::{BatchError, BatchResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Identifier prefix every completion callback must carry
pub const CALLBACK_PREFIX: &str = "after_batch";

/// A handler invoked with the batch id and the triggering unit's arguments
#[async_trait]
pub trait BatchCallback: Send + Sync {
    async fn call(&self, id: &BatchId, args: &[Value]) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into a [`BatchCallback`]
struct FnCallback<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> BatchCallback for FnCallback<F>
where
    F: Fn(BatchId, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn call(&self, id: &BatchId, args: &[Value]) -> anyhow::Result<()> {
        (self.f)(id.clone(), args.to_vec()).await
    }
}

/// Wrap an async closure as a shareable callback
pub fn callback_fn<F, Fut>(f: F) -> Arc<dyn BatchCallback>
where
    F: Fn(BatchId, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnCallback { f })
}

/// A subject whose units of work are batched
///
/// Implementors register their completion callbacks once, at definition time.
pub trait BatchedJob {
    fn register_batch_callbacks(registry: &mut CallbackRegistry) -> BatchResult<()>;
}

/// Completion callbacks for one subject, ordered by identifier
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: BTreeMap<String, Arc<dyn BatchCallback>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.after_batch_hooks())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry a subject declares
    pub fn for_subject<J: BatchedJob>() -> BatchResult<Self> {
        let mut registry = Self::new();
        J::register_batch_callbacks(&mut registry)?;
        Ok(registry)
    }

    /// Register a callback under `name`
    ///
    /// Names must start with `after_batch` and be unique within the registry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        callback: Arc<dyn BatchCallback>,
    ) -> BatchResult<()> {
        let name = name.into();
        if !name.starts_with(CALLBACK_PREFIX) {
            return Err(BatchError::InvalidCallbackName { name });
        }
        if self.callbacks.contains_key(&name) {
            return Err(BatchError::DuplicateCallback { name });
        }
        self.callbacks.insert(name, callback);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_callback(
        mut self,
        name: impl Into<String>,
        callback: Arc<dyn BatchCallback>,
    ) -> BatchResult<Self> {
        self.register(name, callback)?;
        Ok(self)
    }

    /// Callback identifiers in dispatch (ascending lexical) order
    pub fn after_batch_hooks(&self) -> Vec<&str> {
        self.callbacks.keys().map(String::as_str).collect()
    }

    /// Callbacks in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn BatchCallback>)> {
        self.callbacks.iter().map(|(name, cb)| (name.as_str(), cb))
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
