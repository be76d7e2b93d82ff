//! Bounded LRU cache of compiled patterns, keyed by their declarative form.
//!
//! Mirrors the shape of a bounded context buffer more than a general-purpose
//! cache crate: a `HashMap` for lookup and a `VecDeque` tracking recency,
//! with `get` promoting an entry to most-recently-used and insertion past
//! capacity evicting the oldest.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::Result;
use crate::pattern::{CompiledPattern, Pattern, PatternKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    bytes: Vec<u8>,
    kind: PatternKind,
    case_insensitive: bool,
}

impl CacheKey {
    fn from_pattern(p: &Pattern) -> Self {
        Self {
            bytes: p.bytes.clone(),
            kind: p.kind,
            case_insensitive: p.case_insensitive,
        }
    }
}

pub struct PatternCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<CompiledPattern>>,
    recency: VecDeque<CacheKey>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "pattern cache capacity must be positive");
        Self {
            capacity,
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a compiled pattern, compiling and inserting it on a cache miss.
    pub fn get_or_compile(&mut self, pattern: Pattern) -> Result<Arc<CompiledPattern>> {
        let key = CacheKey::from_pattern(&pattern);
        if let Some(hit) = self.entries.get(&key).cloned() {
            self.touch(&key);
            return Ok(hit);
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern)?);
        self.insert(key, compiled.clone());
        Ok(compiled)
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let k = self.recency.remove(pos).unwrap();
            self.recency.push_back(k);
        }
    }

    fn insert(&mut self, key: CacheKey, compiled: Arc<CompiledPattern>) {
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.recency.push_back(key.clone());
        self.entries.insert(key, compiled);
    }
}
