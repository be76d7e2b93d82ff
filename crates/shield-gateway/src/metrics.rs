//! Prometheus-style text exposition: monotonic counters, gauges, and a
//! fixed-bucket latency histogram.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const BUCKET_BOUNDS_US: [f64; 9] = [1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0];

struct HistogramState {
    buckets: [u64; 9],
    sum_us: f64,
    count: u64,
}

impl HistogramState {
    fn new() -> Self {
        Self { buckets: [0; 9], sum_us: 0.0, count: 0 }
    }

    fn observe(&mut self, value_us: f64) {
        for (i, bound) in BUCKET_BOUNDS_US.iter().enumerate() {
            if value_us <= *bound {
                self.buckets[i] += 1;
            }
        }
        self.sum_us += value_us;
        self.count += 1;
    }
}

pub struct Metrics {
    requests_total: AtomicU64,
    allowed_total: AtomicU64,
    blocked_total: AtomicU64,
    quarantined_total: AtomicU64,
    active_sessions: AtomicU64,
    latency: Mutex<HistogramState>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            allowed_total: AtomicU64::new(0),
            blocked_total: AtomicU64::new(0),
            quarantined_total: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            latency: Mutex::new(HistogramState::new()),
        }
    }

    pub fn record_request(&self, action: shield_pattern::Action, latency_us: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        match action {
            shield_pattern::Action::Block => self.blocked_total.fetch_add(1, Ordering::Relaxed),
            shield_pattern::Action::Quarantine => self.quarantined_total.fetch_add(1, Ordering::Relaxed),
            _ => self.allowed_total.fetch_add(1, Ordering::Relaxed),
        };
        self.latency.lock().unwrap_or_else(|e| e.into_inner()).observe(latency_us as f64);
    }

    pub fn set_active_sessions(&self, count: u64) {
        self.active_sessions.store(count, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# HELP shield_requests_total Total requests processed.\n");
        out.push_str("# TYPE shield_requests_total counter\n");
        out.push_str(&format!("shield_requests_total {}\n", self.requests_total.load(Ordering::Relaxed)));

        out.push_str("# HELP shield_allowed_total Requests allowed.\n");
        out.push_str("# TYPE shield_allowed_total counter\n");
        out.push_str(&format!("shield_allowed_total {}\n", self.allowed_total.load(Ordering::Relaxed)));

        out.push_str("# HELP shield_blocked_total Requests blocked.\n");
        out.push_str("# TYPE shield_blocked_total counter\n");
        out.push_str(&format!("shield_blocked_total {}\n", self.blocked_total.load(Ordering::Relaxed)));

        out.push_str("# HELP shield_quarantined_total Requests quarantined.\n");
        out.push_str("# TYPE shield_quarantined_total counter\n");
        out.push_str(&format!("shield_quarantined_total {}\n", self.quarantined_total.load(Ordering::Relaxed)));

        out.push_str("# HELP shield_active_sessions Currently tracked sessions.\n");
        out.push_str("# TYPE shield_active_sessions gauge\n");
        out.push_str(&format!("shield_active_sessions {}\n", self.active_sessions.load(Ordering::Relaxed)));

        out.push_str("# HELP shield_request_latency_us Request processing latency in microseconds.\n");
        out.push_str("# TYPE shield_request_latency_us histogram\n");
        let hist = self.latency.lock().unwrap_or_else(|e| e.into_inner());
        for (bound, cumulative) in BUCKET_BOUNDS_US.iter().zip(hist.buckets.iter()) {
            out.push_str(&format!("shield_request_latency_us_bucket{{le=\"{bound}\"}} {cumulative}\n"));
        }
        out.push_str(&format!("shield_request_latency_us_bucket{{le=\"+Inf\"}} {}\n", hist.count));
        out.push_str(&format!("shield_request_latency_us_sum {}\n", hist.sum_us));
        out.push_str(&format!("shield_request_latency_us_count {}\n", hist.count));
        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
