//! Three-state circuit breaker guarding the signature-download path:
//! repeated failures open the circuit for a cooldown window, then a single
//! probe is allowed through to decide whether to close again.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<i64>,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown_secs: i64,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown_secs: i64) -> Self {
        Self {
            failure_threshold,
            cooldown_secs,
            state: Mutex::new(BreakerState { state: CircuitState::Closed, consecutive_failures: 0, opened_at: None }),
        }
    }

    /// Whether an attempt should be let through right now. Transitions
    /// `Open` to `HalfOpen` once the cooldown window has elapsed.
    pub fn allow(&self, now: i64) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match guard.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = guard.opened_at.unwrap_or(now);
                if now - opened_at >= self.cooldown_secs {
                    guard.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.state = CircuitState::Closed;
        guard.consecutive_failures = 0;
        guard.opened_at = None;
    }

    pub fn record_failure(&self, now: i64) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        guard.consecutive_failures += 1;
        if guard.state == CircuitState::HalfOpen || guard.consecutive_failures >= self.failure_threshold {
            guard.state = CircuitState::Open;
            guard.opened_at = Some(now);
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).state
    }
}
