//! The four-way verdict shared by every component that can restrict traffic.
//!
//! Ordered so two verdicts can be combined with `std::cmp::max`: whichever
//! component wants to be more restrictive wins the composition.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    Allow,
    Log,
    Quarantine,
    Block,
}

impl Action {
    pub fn is_blocking(self) -> bool {
        matches!(self, Action::Block)
    }
}
