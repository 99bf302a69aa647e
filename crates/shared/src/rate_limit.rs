//! Per-client request throttling
//!
//! Token-bucket quota tracking shared across concurrent requests. Each
//! limiter instance owns its own bucket map guarded by a single mutex; the
//! critical section is O(1) arithmetic, never I/O. Distinct instances
//! (general traffic, email-code issuance) never share buckets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Outcome of an admission check
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Maximum quota (burst) for this limiter instance
    pub limit: u32,
    /// Whole tokens left after this request; never negative
    pub remaining: u32,
    pub retry_after_seconds: Option<u32>,
}

#[derive(Debug)]
struct Bucket {
    last_refill: Instant,
    remaining: f64,
}

struct Inner {
    buckets: Mutex<HashMap<String, Bucket>>,
    /// Tokens recovered per second
    rate: f64,
    /// Initial and maximum quota
    burst: u32,
}

/// Token-bucket rate limiter keyed by an opaque client key (IP address,
/// email address, ...).
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Create a limiter recovering `rate` tokens per second with an initial
    /// and maximum quota of `burst`. A non-positive rate or zero burst
    /// disables throttling.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                buckets: Mutex::new(HashMap::new()),
                rate,
                burst,
            }),
        }
    }

    /// Check and consume one token for `key`
    pub async fn admit(&self, key: &str) -> RateLimitDecision {
        self.admit_at(key, Instant::now()).await
    }

    async fn admit_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        if self.inner.rate <= 0.0 || self.inner.burst == 0 {
            return RateLimitDecision {
                allowed: true,
                limit: self.inner.burst,
                remaining: self.inner.burst,
                retry_after_seconds: None,
            };
        }

        let burst = f64::from(self.inner.burst);
        let mut buckets = self.inner.buckets.lock().await;

        // Evict buckets idle beyond one full refill cycle to bound memory.
        // An evicted key simply starts over with a full bucket.
        let idle_cutoff = Duration::from_secs_f64(burst / self.inner.rate);
        buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) <= idle_cutoff);

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            last_refill: now,
            remaining: burst,
        });

        let elapsed = now
            .saturating_duration_since(bucket.last_refill)
            .as_secs_f64();
        bucket.last_refill = now;
        bucket.remaining = (bucket.remaining + elapsed * self.inner.rate).min(burst);

        if bucket.remaining >= 1.0 {
            bucket.remaining -= 1.0;
            RateLimitDecision {
                allowed: true,
                limit: self.inner.burst,
                remaining: bucket.remaining.floor() as u32,
                retry_after_seconds: None,
            }
        } else {
            // Deny without persisting a negative balance: the visible
            // remaining count stays at zero.
            let deficit = 1.0 - bucket.remaining;
            let retry_after = (deficit / self.inner.rate).ceil() as u32;
            RateLimitDecision {
                allowed: false,
                limit: self.inner.burst,
                remaining: 0,
                retry_after_seconds: Some(retry_after.max(1)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_deny() {
        let limiter = RateLimiter::new(1.0, 3);
        let now = Instant::now();

        for i in 0..3 {
            let decision = limiter.admit_at("10.0.0.1", now).await;
            assert!(decision.allowed, "request {} should be admitted", i);
        }

        let decision = limiter.admit_at("10.0.0.1", now).await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.retry_after_seconds, Some(1));
    }

    #[tokio::test]
    async fn test_refill_admits_exactly_one() {
        let limiter = RateLimiter::new(1.0, 3);
        let now = Instant::now();

        for _ in 0..3 {
            limiter.admit_at("10.0.0.1", now).await;
        }
        assert!(!limiter.admit_at("10.0.0.1", now).await.allowed);

        // One second recovers exactly one token.
        let later = now + Duration::from_secs(1);
        assert!(limiter.admit_at("10.0.0.1", later).await.allowed);
        assert!(!limiter.admit_at("10.0.0.1", later).await.allowed);
    }

    #[tokio::test]
    async fn test_first_request_never_throttled() {
        let limiter = RateLimiter::new(0.001, 1);
        let decision = limiter.admit("192.168.1.50").await;
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1.0, 3);
        let now = Instant::now();

        for _ in 0..4 {
            limiter.admit_at("10.0.0.1", now).await;
        }
        assert!(!limiter.admit_at("10.0.0.1", now).await.allowed);

        // Exhausting one key leaves the other untouched.
        assert!(limiter.admit_at("10.0.0.2", now).await.allowed);
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let general = RateLimiter::new(1.0, 1);
        let email = RateLimiter::new(1.0, 1);
        let now = Instant::now();

        assert!(general.admit_at("10.0.0.1", now).await.allowed);
        assert!(!general.admit_at("10.0.0.1", now).await.allowed);

        // Same key, different instance, separate bucket.
        assert!(email.admit_at("10.0.0.1", now).await.allowed);
    }

    #[tokio::test]
    async fn test_refill_caps_at_burst() {
        let limiter = RateLimiter::new(1.0, 2);
        let now = Instant::now();

        limiter.admit_at("10.0.0.1", now).await;

        // A long idle period must not accumulate more than `burst` tokens,
        // and the idle bucket is evicted and recreated full.
        let later = now + Duration::from_secs(3600);
        for _ in 0..2 {
            assert!(limiter.admit_at("10.0.0.1", later).await.allowed);
        }
        assert!(!limiter.admit_at("10.0.0.1", later).await.allowed);
    }

    #[tokio::test]
    async fn test_idle_buckets_evicted() {
        let limiter = RateLimiter::new(1.0, 3);
        let now = Instant::now();

        limiter.admit_at("10.0.0.1", now).await;
        assert_eq!(limiter.inner.buckets.lock().await.len(), 1);

        // Touching another key past the refill cycle sweeps the stale one.
        let later = now + Duration::from_secs(4);
        limiter.admit_at("10.0.0.2", later).await;
        let buckets = limiter.inner.buckets.lock().await;
        assert!(!buckets.contains_key("10.0.0.1"));
        assert!(buckets.contains_key("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_everything() {
        let limiter = RateLimiter::new(0.0, 0);
        for _ in 0..100 {
            assert!(limiter.admit("10.0.0.1").await.allowed);
        }
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let limiter = RateLimiter::new(1.0, 2);
        let cloned = limiter.clone();
        let now = Instant::now();

        limiter.admit_at("10.0.0.1", now).await;
        limiter.admit_at("10.0.0.1", now).await;

        // Clone sees the same buckets (shared Arc).
        assert!(!cloned.admit_at("10.0.0.1", now).await.allowed);
    }

    #[tokio::test]
    async fn test_fractional_rate() {
        // One token per minute: a second request right away is denied and
        // Retry-After reflects the refill interval.
        let limiter = RateLimiter::new(1.0 / 60.0, 1);
        let now = Instant::now();

        assert!(limiter.admit_at("a@example.com", now).await.allowed);
        let decision = limiter.admit_at("a@example.com", now).await;
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_seconds, Some(60));
    }
}
