#![allow(clippy::doc_markdown)] // Allow technical terms like Redis, DashMap in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Batch
//!
//! Completion detection for dynamically-sized batches of independently
//! scheduled units of work.
//!
//! ## Overview
//!
//! A batch is assembled by enqueuing units of work while an "assembly in
//! progress" marker is set. Every enqueue increments a shared counter and
//! every finished unit decrements it. The unit whose completion brings the
//! counter to zero, after assembly has closed, fires the batch's completion
//! callbacks exactly once.
//!
//! All coordination state lives in a shared atomic key-value store (Redis or
//! Dragonfly in production, an in-process map in tests), so the hooks can run
//! in any number of worker processes.
//!
//! ## Module Organization
//!
//! - [`batch`] - Key derivation, assembly guard, counter, callbacks and coordinator
//! - [`store`] - Store trait and the Redis / in-memory providers
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Console tracing setup
//!
//! ## Quick Start
//!
//! ```rust
//! use tasker_batch::batch::{callback_fn, BatchCoordinator, BatchId, CallbackRegistry, KeyNamespace};
//! use tasker_batch::config::CompletionConfig;
//! use tasker_batch::store::MemoryBatchStore;
//! use tasker_batch::BatchError;
//!
//! # async fn example() -> Result<(), BatchError> {
//! let callbacks = CallbackRegistry::new().with_callback(
//!     "after_batch_report",
//!     callback_fn(|id, _args| async move {
//!         println!("batch {id} done");
//!         Ok(())
//!     }),
//! )?;
//! let coordinator = BatchCoordinator::new(
//!     MemoryBatchStore::new(),
//!     KeyNamespace::default(),
//!     callbacks,
//!     CompletionConfig::default(),
//! );
//!
//! let id = BatchId::from("nightly-2024-01-01");
//! let inner = &coordinator;
//! let batch = &id;
//! coordinator
//!     .assemble_batch(&id, || async move {
//!         for _ in 0..3 {
//!             inner.after_enqueue_batch(batch, &[]).await?;
//!         }
//!         Ok::<_, BatchError>(())
//!     })
//!     .await?;
//!
//! for _ in 0..3 {
//!     coordinator.after_perform_batch(&id, &[]).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use batch::{BatchCoordinator, BatchId, CallbackRegistry, CompletionOutcome};
pub use config::BatchConfig;
pub use error::{BatchError, BatchResult};
pub use store::{BatchStore, StoreProvider};
