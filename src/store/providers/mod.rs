//! Batch store implementations

pub mod memory;

#[cfg(feature = "store-redis")]
pub mod redis;

pub use memory::MemoryBatchStore;

#[cfg(feature = "store-redis")]
pub use self::redis::RedisBatchStore;
