//! Rate limiter for the fallback provider.
//!
//! The provider enforces informal limits; bursting past them degrades
//! the whole tier, so every outbound request waits on one shared bucket.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Arc<
        GovLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl RateLimiter {
    /// Create with a per-second request quota. A quota of 0 is bumped
    /// to 1 rather than rejected.
    pub fn new(requests_per_sec: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_sec.max(1)).unwrap());
        Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a slot without waiting. Returns true if acquired.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quota_is_clamped() {
        let limiter = RateLimiter::new(0);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_burst_exhausts_quota() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
