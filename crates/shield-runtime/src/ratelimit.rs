//! Per-key token-bucket rate limiting.
//!
//! Unlike a gas budget that only depletes within one execution, a bucket
//! refills continuously: `refill` is called with the elapsed time since the
//! bucket's last observation before every `acquire`, so idle buckets
//! recover capacity between bursts instead of staying drained.

use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_update_ts: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst_size: f64,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: HashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config, buckets: HashMap::new() }
    }

    /// Attempts to consume one token for `key` at time `now` (seconds,
    /// monotonic). Returns `true` if the request is admitted.
    pub fn acquire(&mut self, key: &str, now: f64) -> bool {
        let config = self.config;
        let bucket = self.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: config.burst_size,
            last_update_ts: now,
        });
        let elapsed = (now - bucket.last_update_ts).max(0.0);
        bucket.tokens = (bucket.tokens + elapsed * config.requests_per_second).min(config.burst_size);
        bucket.last_update_ts = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self, key: &str) -> f64 {
        self.buckets.get(key).map(|b| b.tokens).unwrap_or(self.config.burst_size)
    }

    pub fn reset(&mut self, key: &str) {
        self.buckets.remove(key);
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig { requests_per_second: 5.0, burst_size: 3.0 })
    }

    #[test]
    fn burst_admits_up_to_capacity_then_denies() {
        let mut rl = limiter();
        assert!(rl.acquire("session-a", 0.0));
        assert!(rl.acquire("session-a", 0.0));
        assert!(rl.acquire("session-a", 0.0));
        assert!(!rl.acquire("session-a", 0.0));
    }

    #[test]
    fn idle_bucket_refills_over_time() {
        let mut rl = limiter();
        for _ in 0..3 {
            rl.acquire("k", 0.0);
        }
        assert!(!rl.acquire("k", 0.0));
        // one second idle at 5 rps refills well past a single token
        assert!(rl.acquire("k", 1.0));
    }

    #[test]
    fn refill_never_exceeds_burst_size() {
        let mut rl = limiter();
        rl.acquire("k", 0.0);
        assert!(rl.remaining("k") <= 3.0);
        let _ = rl.acquire("k", 1000.0);
        assert!(rl.remaining("k") <= 3.0);
    }

    #[test]
    fn independent_keys_have_independent_buckets() {
        let mut rl = limiter();
        for _ in 0..3 {
            rl.acquire("a", 0.0);
        }
        assert!(!rl.acquire("a", 0.0));
        assert!(rl.acquire("b", 0.0));
    }

    #[test]
    fn reset_restores_full_burst() {
        let mut rl = limiter();
        for _ in 0..3 {
            rl.acquire("k", 0.0);
        }
        rl.reset("k");
        assert!(rl.acquire("k", 0.0));
    }

    #[test]
    fn test_security_tokens_never_go_negative() {
        let mut rl = limiter();
        for _ in 0..10 {
            rl.acquire("k", 0.0);
        }
        assert!(rl.remaining("k") >= 0.0);
    }
}
