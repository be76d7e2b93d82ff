//! Lock-free signature storage: an RCU double-buffer over compiled pattern
//! sets, plus the pattern compiler and its bounded LRU cache.

mod action;
mod cache;
mod error;
mod pattern;
mod rcu;

pub use action::Action;
pub use cache::PatternCache;
pub use error::{PatternError, Result};
pub use pattern::{CompiledPattern, Pattern, PatternKind, Severity, ThreatType};
pub use rcu::{ReadGuard, Rcu, UpdateGuard, RCU_MAX_READERS};

use std::sync::Arc;

/// The unit a signature update swaps in: an ordered, immutable vector of
/// compiled patterns. Cloning is cheap since each element is an `Arc`.
pub type PatternSet = Vec<Arc<CompiledPattern>>;

/// An RCU-guarded pattern set, the form the scanner and signature sync
/// driver share.
pub type PatternStore = Rcu<PatternSet>;

pub fn empty_store() -> PatternStore {
    Rcu::new(Vec::new())
}
