//! Static pattern scanning: nine pattern groups walked in a fixed order,
//! followed by structural heuristics that can only raise the verdict.

use std::sync::Arc;
use std::time::Instant;

use shield_pattern::{CompiledPattern, PatternSet, Severity, ThreatType};

use crate::error::ScannerError;
use crate::heuristics;
use crate::result::ScanResult;

/// Inputs larger than this are truncated, scanned, and flagged `Truncated`
/// rather than rejected.
pub const MAX_SCAN_BYTES: usize = 1024 * 1024;

/// Fixed evaluation order. A CRITICAL hit in any group stops the walk.
const GROUP_ORDER: [ThreatType; 9] = [
    ThreatType::Jailbreak,
    ThreatType::Injection,
    ThreatType::Malware,
    ThreatType::Sqli,
    ThreatType::Xss,
    ThreatType::PathTraversal,
    ThreatType::Ssti,
    ThreatType::Encoding,
    ThreatType::Shell,
];

fn group_index(t: ThreatType) -> usize {
    GROUP_ORDER.iter().position(|&g| g == t).expect("every ThreatType has a group")
}

pub struct InnateScanner {
    groups: [Vec<Arc<CompiledPattern>>; 9],
}

impl InnateScanner {
    pub fn new(patterns: PatternSet) -> Self {
        let mut groups: [Vec<Arc<CompiledPattern>>; 9] = std::array::from_fn(|_| Vec::new());
        for pattern in patterns {
            groups[group_index(pattern.pattern.threat_type)].push(pattern);
        }
        Self { groups }
    }

    pub fn scan(&self, bytes: &[u8]) -> ScanResult {
        let started = Instant::now();
        if bytes.is_empty() {
            return ScanResult::invalid_input(started.elapsed().as_nanos() as u64);
        }

        let request_len = bytes.len();
        let truncated = request_len > MAX_SCAN_BYTES;
        let bytes = if truncated { &bytes[..MAX_SCAN_BYTES] } else { bytes };

        let mut best: Option<(Severity, ThreatType, u64)> = None;
        'groups: for &group in &GROUP_ORDER {
            for compiled in &self.groups[group_index(group)] {
                if compiled.is_match(bytes) {
                    let severity = compiled.pattern.severity;
                    let better = best.map(|(s, ..)| severity > s).unwrap_or(true);
                    if better {
                        best = Some((severity, group, compiled.pattern.id));
                    }
                    if severity == Severity::Critical {
                        break 'groups;
                    }
                }
            }
        }

        let mut severity = best.map(|(s, ..)| s).unwrap_or(Severity::None);
        let pattern_confidence = if best.is_some() { 0.9 } else { 0.0 };

        let heuristic_severity = severity
            .max(heuristics::entropy_severity(bytes))
            .max(heuristics::invisible_severity(bytes))
            .max(heuristics::repetition_severity(bytes))
            .max(heuristics::hex_escape_severity(bytes))
            .max(heuristics::unicode_escape_severity(bytes));

        let heuristic_only = heuristic_severity > severity;
        severity = heuristic_severity;

        let confidence = if best.is_some() {
            pattern_confidence
        } else if heuristic_only {
            0.8
        } else {
            0.0
        };

        let (threat_type, pattern_id) = match best {
            Some((_, t, id)) => (Some(t), Some(id)),
            None => (None, None),
        };

        ScanResult {
            detected: severity != Severity::None,
            severity,
            threat_type,
            pattern_id,
            offset: 0,
            length: bytes.len(),
            confidence,
            scan_time_ns: started.elapsed().as_nanos() as u64,
            error: if truncated { Some(ScannerError::Truncated { original: request_len, limit: MAX_SCAN_BYTES }) } else { None },
        }
    }
}
