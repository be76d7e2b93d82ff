//! Hash-bucketed, case-insensitive substring deny list.
//!
//! Entries persist as plain text: one `pattern [| reason]` per line, with
//! `#` or `!` prefixed lines treated as comments.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct BlocklistEntry {
    pub pattern: String,
    pub reason: String,
    pub hits: u64,
}

pub struct Blocklist {
    entries: HashMap<String, BlocklistEntry>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, pattern: &str, reason: &str) {
        let key = pattern.to_lowercase();
        self.entries.insert(
            key,
            BlocklistEntry { pattern: pattern.to_string(), reason: reason.to_string(), hits: 0 },
        );
    }

    pub fn remove(&mut self, pattern: &str) -> bool {
        self.entries.remove(&pattern.to_lowercase()).is_some()
    }

    /// Returns the matched entry's reason, if `content` contains any
    /// registered substring (case-insensitive), and records the hit.
    pub fn check(&mut self, content: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(content).to_lowercase();
        for entry in self.entries.values_mut() {
            if text.contains(entry.pattern.to_lowercase().as_str()) {
                entry.hits += 1;
                return Some(entry.reason.clone());
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut body = String::new();
        for entry in self.entries.values() {
            if entry.reason.is_empty() {
                body.push_str(&entry.pattern);
            } else {
                body.push_str(&format!("{} | {}", entry.pattern, entry.reason));
            }
            body.push('\n');
        }
        fs::write(path, body)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut list = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            match line.split_once('|') {
                Some((pattern, reason)) => list.add(pattern.trim(), reason.trim()),
                None => list.add(line, ""),
            }
        }
        Ok(list)
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new()
    }
}
