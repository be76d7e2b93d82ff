//! Typed security alerts, raised on canary hits, CRITICAL-severity scans,
//! and guard BLOCK verdicts, delivered to a pluggable sink. SIEM forwarding
//! is an external collaborator; the in-process sink is the only one built
//! here.

use std::collections::VecDeque;
use std::sync::Mutex;

use shield_pattern::Severity;

const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone)]
pub struct Alert {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub timestamp: i64,
}

pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: Alert);
}

/// Bounded in-memory ring; oldest alerts are dropped once full.
pub struct InProcessAlertSink {
    ring: Mutex<VecDeque<Alert>>,
    capacity: usize,
}

impl InProcessAlertSink {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "alert sink capacity must be positive");
        Self { ring: Mutex::new(VecDeque::new()), capacity }
    }

    pub fn recent(&self, n: usize) -> Vec<Alert> {
        let ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        ring.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InProcessAlertSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AlertSink for InProcessAlertSink {
    fn emit(&self, alert: Alert) {
        tracing::warn!(category = %alert.category, severity = ?alert.severity, "{}", alert.message);
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        if ring.len() >= self.capacity {
            ring.pop_front();
        }
        ring.push_back(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(msg: &str) -> Alert {
        Alert { severity: Severity::Critical, category: "canary".into(), message: msg.into(), timestamp: 1 }
    }

    #[test]
    fn recent_returns_newest_first() {
        let sink = InProcessAlertSink::new(8);
        sink.emit(alert("first"));
        sink.emit(alert("second"));
        let recent = sink.recent(2);
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[1].message, "first");
    }

    #[test]
    fn test_security_ring_never_grows_past_capacity() {
        let sink = InProcessAlertSink::new(3);
        for i in 0..10 {
            sink.emit(alert(&format!("alert-{i}")));
        }
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.recent(1)[0].message, "alert-9");
    }
}
