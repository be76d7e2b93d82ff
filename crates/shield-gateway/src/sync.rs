//! Signature sync: a pull-model client that compares versions, downloads a
//! checksummed blob, and hot-swaps the live pattern set through the RCU
//! double-buffer (C1) once the checksum verifies. A checksum mismatch or
//! compile failure aborts before any `UpdateGuard` is even created, so the
//! active pattern set is never replaced with a partial one.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use shield_pattern::{CompiledPattern, Pattern, Rcu};
use shield_scanner::InnateScanner;

use crate::breaker::CircuitBreaker;
use crate::error::{GatewayError, Result};

pub type InnateStore = Rcu<Arc<InnateScanner>>;

pub fn empty_innate_store() -> InnateStore {
    Rcu::new(Arc::new(InnateScanner::new(Vec::new())))
}

pub struct SignatureInfo {
    pub version: u32,
    pub checksum: u32,
}

pub enum SyncOutcome {
    NoUpdate,
    Applied { new_version: u32 },
}

pub struct SignatureSyncClient {
    current_version: AtomicU32,
    breaker: CircuitBreaker,
}

impl SignatureSyncClient {
    pub fn new(initial_version: u32) -> Self {
        Self {
            current_version: AtomicU32::new(initial_version),
            breaker: CircuitBreaker::new(3, 60),
        }
    }

    pub fn current_version(&self) -> u32 {
        self.current_version.load(Ordering::Acquire)
    }

    /// Categorizes a remote advertisement against the locally held version.
    pub fn check_update(&self, remote: &SignatureInfo) -> bool {
        remote.version > self.current_version()
    }

    /// Verifies `blob`'s checksum, compiles it into a fresh pattern set, and
    /// swaps it in via the RCU. Returns `NoUpdate` without touching the
    /// breaker if the server had nothing newer; any verification failure is
    /// recorded as a breaker failure and surfaced as an error.
    pub fn apply_update(
        &self,
        store: &InnateStore,
        info: &SignatureInfo,
        blob: &[u8],
        patterns: Vec<Pattern>,
        now: i64,
    ) -> Result<SyncOutcome> {
        if !self.check_update(info) {
            return Ok(SyncOutcome::NoUpdate);
        }
        if !self.breaker.allow(now) {
            return Err(GatewayError::SyncRejected("circuit breaker open".to_string()));
        }

        let actual = crc32fast::hash(blob);
        if actual != info.checksum {
            self.breaker.record_failure(now);
            return Err(GatewayError::ChecksumMismatch { expected: info.checksum, actual });
        }

        let compiled: std::result::Result<Vec<Arc<CompiledPattern>>, _> =
            patterns.into_iter().map(|p| CompiledPattern::compile(p).map(Arc::new)).collect();
        let compiled = match compiled {
            Ok(c) => c,
            Err(e) => {
                self.breaker.record_failure(now);
                return Err(e.into());
            }
        };

        let scanner = Arc::new(InnateScanner::new(compiled));
        {
            let mut update = store.begin_update();
            *update = scanner;
            update.commit();
        }

        self.current_version.store(info.version, Ordering::Release);
        self.breaker.record_success();
        Ok(SyncOutcome::Applied { new_version: info.version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shield_pattern::{PatternKind, Severity, ThreatType};

    fn sample_pattern() -> Pattern {
        Pattern {
            id: 9001,
            bytes: b"evil-payload".to_vec(),
            kind: PatternKind::Contains,
            case_insensitive: true,
            threat_type: ThreatType::Malware,
            severity: Severity::High,
        }
    }

    #[test]
    fn newer_remote_version_triggers_update() {
        let client = SignatureSyncClient::new(1);
        assert!(client.check_update(&SignatureInfo { version: 2, checksum: 0 }));
        assert!(!client.check_update(&SignatureInfo { version: 1, checksum: 0 }));
    }

    #[test]
    fn checksum_mismatch_aborts_without_swap() {
        let client = SignatureSyncClient::new(1);
        let store = empty_innate_store();
        let blob = b"signature blob contents";
        let info = SignatureInfo { version: 2, checksum: crc32fast::hash(blob) ^ 0xFF };
        let result = client.apply_update(&store, &info, blob, vec![sample_pattern()], 0);
        assert!(result.is_err());
        assert_eq!(client.current_version(), 1);
        assert!(store.read().scan(b"evil-payload here").detected == false);
    }

    #[test]
    fn verified_update_is_visible_to_readers_after_commit() {
        let client = SignatureSyncClient::new(1);
        let store = empty_innate_store();
        let blob = b"signature blob contents";
        let info = SignatureInfo { version: 2, checksum: crc32fast::hash(blob) };
        let outcome = client.apply_update(&store, &info, blob, vec![sample_pattern()], 0).unwrap();
        assert!(matches!(outcome, SyncOutcome::Applied { new_version: 2 }));
        assert_eq!(client.current_version(), 2);
        assert!(store.read().scan(b"this has evil-payload inside").detected);
    }

    #[test]
    fn test_security_repeated_checksum_failures_open_the_breaker() {
        let client = SignatureSyncClient::new(1);
        let store = empty_innate_store();
        let blob = b"x";
        let bad = SignatureInfo { version: 2, checksum: 0 };
        for now in 0..3 {
            let _ = client.apply_update(&store, &bad, blob, vec![sample_pattern()], now);
        }
        let result = client.apply_update(&store, &bad, blob, vec![sample_pattern()], 3);
        assert!(result.is_err());
    }
}
