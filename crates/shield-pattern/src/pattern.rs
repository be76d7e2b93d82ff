//! Pattern compilation: literal/contains/prefix/suffix/regex/glob matchers
//! plus per-pattern evaluation statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Exact,
    Contains,
    Prefix,
    Suffix,
    Regex,
    /// Degrades to `Contains`; kept as its own variant so configuration and
    /// persisted pattern sets can still name it explicitly.
    Glob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatType {
    Jailbreak,
    Injection,
    Malware,
    Sqli,
    Xss,
    PathTraversal,
    Ssti,
    Encoding,
    Shell,
}

/// A declarative, not-yet-compiled pattern as it would arrive from
/// configuration or a signature update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: u64,
    pub bytes: Vec<u8>,
    pub kind: PatternKind,
    pub case_insensitive: bool,
    pub threat_type: ThreatType,
    pub severity: Severity,
}

/// A compiled pattern plus live evaluation counters. Counters use relaxed
/// atomics: they feed telemetry, not correctness.
pub struct CompiledPattern {
    pub pattern: Pattern,
    matcher: Matcher,
    pub eval_count: AtomicU64,
    pub match_count: AtomicU64,
}

impl std::fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("pattern", &self.pattern)
            .field("eval_count", &self.eval_count.load(Ordering::Relaxed))
            .field("match_count", &self.match_count.load(Ordering::Relaxed))
            .finish()
    }
}

enum Matcher {
    Exact(Vec<u8>),
    Contains(Vec<u8>),
    Prefix(Vec<u8>),
    Suffix(Vec<u8>),
    Regex(Box<Regex>),
}

fn normalize(bytes: &[u8], case_insensitive: bool) -> Vec<u8> {
    if !case_insensitive {
        return bytes.to_vec();
    }
    bytes
        .iter()
        .map(|b| if b.is_ascii_uppercase() { b.to_ascii_lowercase() } else { *b })
        .collect()
}

impl CompiledPattern {
    pub fn compile(pattern: Pattern) -> Result<Self> {
        if pattern.bytes.is_empty() {
            return Err(PatternError::InvalidInput);
        }
        let matcher = match pattern.kind {
            PatternKind::Exact => Matcher::Exact(normalize(&pattern.bytes, pattern.case_insensitive)),
            PatternKind::Contains | PatternKind::Glob => {
                Matcher::Contains(normalize(&pattern.bytes, pattern.case_insensitive))
            }
            PatternKind::Prefix => Matcher::Prefix(normalize(&pattern.bytes, pattern.case_insensitive)),
            PatternKind::Suffix => Matcher::Suffix(normalize(&pattern.bytes, pattern.case_insensitive)),
            PatternKind::Regex => {
                let needle = String::from_utf8_lossy(&pattern.bytes);
                let expr = if pattern.case_insensitive {
                    format!("(?i){needle}")
                } else {
                    needle.into_owned()
                };
                let re = Regex::new(&expr).map_err(|e| PatternError::ParseFailure {
                    kind: pattern.kind,
                    reason: e.to_string(),
                })?;
                Matcher::Regex(Box::new(re))
            }
        };
        Ok(Self {
            pattern,
            matcher,
            eval_count: AtomicU64::new(0),
            match_count: AtomicU64::new(0),
        })
    }

    /// Evaluates the matcher against `bytes`, recording stats as a side effect.
    pub fn is_match(&self, bytes: &[u8]) -> bool {
        self.eval_count.fetch_add(1, Ordering::Relaxed);
        let matched = match &self.matcher {
            Matcher::Exact(needle) => {
                let haystack = normalize(bytes, self.pattern.case_insensitive);
                &haystack == needle
            }
            Matcher::Contains(needle) => {
                let haystack = normalize(bytes, self.pattern.case_insensitive);
                contains_subslice(&haystack, needle)
            }
            Matcher::Prefix(needle) => {
                let haystack = normalize(bytes, self.pattern.case_insensitive);
                haystack.starts_with(needle.as_slice())
            }
            Matcher::Suffix(needle) => {
                let haystack = normalize(bytes, self.pattern.case_insensitive);
                haystack.ends_with(needle.as_slice())
            }
            Matcher::Regex(re) => {
                let text = String::from_utf8_lossy(bytes);
                re.is_match(&text)
            }
        };
        if matched {
            self.match_count.fetch_add(1, Ordering::Relaxed);
        }
        matched
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return needle.is_empty();
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
