//! # Shared Batch Store
//!
//! The atomic key-value backend that batch coordination runs on.
//!
//! ## Architecture
//!
//! ```text
//! StoreProvider (enum)              <- Zero-cost dispatch, no vtable
//!   ├── Redis(RedisBatchStore)      <- ConnectionManager-based async Redis
//!   └── Memory(MemoryBatchStore)    <- In-process DashMap, single process only
//! ```
//!
//! Unlike a cache, this store carries protocol state. A backend that cannot be
//! reached is an error at construction time, never a silent fallback.

pub mod errors;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::{StoreError, StoreResult};
pub use provider::StoreProvider;
pub use providers::MemoryBatchStore;
pub use traits::BatchStore;

#[cfg(feature = "store-redis")]
pub use providers::RedisBatchStore;
