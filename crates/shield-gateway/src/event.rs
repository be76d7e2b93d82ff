//! Append-only ring of recent pipeline decisions, used by the health/status
//! surface and by tests that want to assert on pipeline behavior without
//! re-deriving it from metrics counters.

use std::collections::VecDeque;
use std::sync::Mutex;

use shield_pattern::Action;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub timestamp: i64,
    pub zone: String,
    pub action: Action,
    pub reason: String,
}

pub struct EventLog {
    ring: Mutex<VecDeque<PipelineEvent>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "event log capacity must be positive");
        Self { ring: Mutex::new(VecDeque::new()), capacity }
    }

    pub fn record(&self, event: PipelineEvent) {
        let mut ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        if ring.len() >= self.capacity {
            ring.pop_front();
        }
        ring.push_back(event);
    }

    pub fn recent(&self, n: usize) -> Vec<PipelineEvent> {
        let ring = self.ring.lock().unwrap_or_else(|e| e.into_inner());
        ring.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
