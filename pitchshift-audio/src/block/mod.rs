//! Fixed-size audio blocks and the global pool that backs them.
//!
//! A block is produced once per tick through an [`AudioBlockMut`], handed
//! downstream as an [`AudioBlockRef`], and released when the last consumer
//! drops it. Nothing here allocates from the heap.

pub mod pool;
mod ref_types;

pub use pool::{AudioBlockData, AudioBlockPool, POOL};
pub use ref_types::{AudioBlockMut, AudioBlockRef};
