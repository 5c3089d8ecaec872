//! # Batch Completion Coordination
//!
//! Tracks a batch of independently scheduled units of work whose final size
//! is only known once enqueuing finishes, and fires the batch's completion
//! callbacks once the last unit reports back.
//!
//! State lives entirely in the shared store, so any number of processes can
//! run the hooks for the same batch.

pub mod assembly;
pub mod callbacks;
pub mod coordinator;
pub mod counter;
pub mod keys;

pub use assembly::AssemblyGuard;
pub use callbacks::{callback_fn, BatchCallback, BatchedJob, CallbackRegistry, CALLBACK_PREFIX};
pub use coordinator::{BatchCoordinator, CompletionOutcome};
pub use counter::CompletionCounter;
pub use keys::{batch_key, count_key, in_progress_key, BatchId, KeyNamespace};
