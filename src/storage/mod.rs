//! In-memory ledger storage
//!
//! The chain itself is a plain vector owned by `Blockchain`; this module holds
//! the memory pool of transactions waiting for a block.

pub mod memory_pool;

pub use memory_pool::MemoryPool;
