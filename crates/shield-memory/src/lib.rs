//! Hash-indexed adaptive threat memory with LRU eviction and atomic,
//! byte-exact binary persistence.

mod error;
mod memory;
mod persist;

pub use error::{MemoryError, Result};
pub use memory::{hash_of, AdaptiveMemory, Hash, MemoryEntry, MemoryHit};
pub use persist::{decode, encode, load, save};
