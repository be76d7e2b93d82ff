//! Hash-indexed adaptive threat memory.
//!
//! `learn` records a SHA-256 digest of a flagged payload; `recall` checks
//! whether a payload's digest is already known. The set is capped; once
//! full, the entry with the oldest `last_seen_ts` is evicted to make room,
//! same discipline as a capacity-bounded frame buffer, applied to hashes
//! instead of content frames.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use shield_pattern::{Severity, ThreatType};

use crate::error::{MemoryError, Result};

pub type Hash = [u8; 32];

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub hash: Hash,
    pub severity: Severity,
    pub threat_type: ThreatType,
    pub first_seen_ts: i64,
    pub last_seen_ts: i64,
    pub hit_count: u32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryHit {
    pub severity: Severity,
    pub threat_type: ThreatType,
    pub hit_count: u32,
}

pub fn hash_of(bytes: &[u8]) -> Hash {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

pub struct AdaptiveMemory {
    capacity: usize,
    entries: HashMap<Hash, MemoryEntry>,
}

impl AdaptiveMemory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "adaptive memory capacity must be positive");
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.values()
    }

    /// Records `bytes` as a learned threat, returning the digest used as key.
    /// If the set is at capacity and this is a new entry, the
    /// least-recently-seen entry is evicted first.
    pub fn learn(
        &mut self,
        bytes: &[u8],
        severity: Severity,
        threat_type: ThreatType,
        now: i64,
    ) -> Hash {
        let hash = hash_of(bytes);
        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.last_seen_ts = now;
            entry.hit_count += 1;
            entry.severity = entry.severity.max(severity);
            return hash;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            hash,
            MemoryEntry {
                hash,
                severity,
                threat_type,
                first_seen_ts: now,
                last_seen_ts: now,
                hit_count: 1,
                active: true,
            },
        );
        hash
    }

    /// Looks up `bytes` by digest; on hit, refreshes recency and returns the
    /// recorded severity/threat type so the caller can fold it into a verdict.
    pub fn recall(&mut self, bytes: &[u8], now: i64) -> Option<MemoryHit> {
        let hash = hash_of(bytes);
        let entry = self.entries.get_mut(&hash)?;
        if !entry.active {
            return None;
        }
        entry.last_seen_ts = now;
        entry.hit_count += 1;
        Some(MemoryHit {
            severity: entry.severity,
            threat_type: entry.threat_type,
            hit_count: entry.hit_count,
        })
    }

    fn evict_oldest(&mut self) {
        if let Some((&oldest, _)) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen_ts)
        {
            self.entries.remove(&oldest);
        }
    }

    pub fn load_entries(&mut self, entries: Vec<MemoryEntry>) -> Result<()> {
        if entries.len() > self.capacity {
            return Err(MemoryError::CapacityExceeded { cap: self.capacity });
        }
        self.entries = entries.into_iter().map(|e| (e.hash, e)).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learn_then_recall_hits() {
        let mut mem = AdaptiveMemory::new(8);
        mem.learn(b"evil", Severity::High, ThreatType::Malware, 100);
        let hit = mem.recall(b"evil", 200).unwrap();
        assert_eq!(hit.severity, Severity::High);
        assert_eq!(hit.hit_count, 2);
    }

    #[test]
    fn recall_miss_returns_none() {
        let mut mem = AdaptiveMemory::new(8);
        assert!(mem.recall(b"never seen", 1).is_none());
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut mem = AdaptiveMemory::new(2);
        mem.learn(b"a", Severity::Low, ThreatType::Injection, 1);
        mem.learn(b"b", Severity::Low, ThreatType::Injection, 2);
        mem.learn(b"c", Severity::Low, ThreatType::Injection, 3);
        assert_eq!(mem.len(), 2);
    }

    #[test]
    fn eviction_drops_oldest_last_seen() {
        let mut mem = AdaptiveMemory::new(2);
        mem.learn(b"a", Severity::Low, ThreatType::Injection, 1);
        mem.learn(b"b", Severity::Low, ThreatType::Injection, 2);
        mem.recall(b"a", 50); // "a" now fresher than "b"
        mem.learn(b"c", Severity::Low, ThreatType::Injection, 60);
        assert!(mem.recall(b"a", 61).is_some());
        assert!(mem.recall(b"b", 61).is_none());
        assert!(mem.recall(b"c", 61).is_some());
    }

    #[test]
    fn test_security_repeated_learn_does_not_duplicate_entry() {
        let mut mem = AdaptiveMemory::new(8);
        mem.learn(b"x", Severity::Medium, ThreatType::Injection, 1);
        mem.learn(b"x", Severity::Medium, ThreatType::Injection, 2);
        mem.learn(b"x", Severity::Medium, ThreatType::Injection, 3);
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn load_entries_rejects_oversized_set() {
        let mut mem = AdaptiveMemory::new(1);
        let entries = vec![
            MemoryEntry {
                hash: [0; 32],
                severity: Severity::Low,
                threat_type: ThreatType::Injection,
                first_seen_ts: 0,
                last_seen_ts: 0,
                hit_count: 1,
                active: true,
            },
            MemoryEntry {
                hash: [1; 32],
                severity: Severity::Low,
                threat_type: ThreatType::Injection,
                first_seen_ts: 0,
                last_seen_ts: 0,
                hit_count: 1,
                active: true,
            },
        ];
        assert!(mem.load_entries(entries).is_err());
    }
}
