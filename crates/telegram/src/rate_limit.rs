//! Per-user cooldown between download requests
//!
//! Prevents abuse by limiting request frequency per user.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::constants::COOLDOWN_EVICTION_FACTOR;

/// Longest pause between two cleanup passes
const MAX_CLEANUP_PERIOD: Duration = Duration::from_secs(60 * 60);

/// A request rejected because the user is still cooling down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolingDown {
    /// Whole seconds until the next request is accepted, rounded up
    pub remaining_secs: u64,
}

/// Thread-safe rate limiter using user IDs
pub struct RateLimiter {
    /// Map of user ID to last accepted request
    last_request: RwLock<HashMap<u64, Instant>>,
    /// Minimum interval between requests
    interval: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter with the given cooldown
    pub fn new(interval: Duration) -> Self {
        Self {
            last_request: RwLock::new(HashMap::new()),
            interval,
        }
    }

    /// Check whether a user may start a request now
    ///
    /// On success the current time is stamped for the user.
    pub fn check(&self, user_id: u64) -> Result<(), CoolingDown> {
        self.check_at(user_id, Instant::now())
    }

    /// Same as [`RateLimiter::check`] with an explicit clock reading
    ///
    /// Check and stamp happen under one write lock, so two concurrent
    /// requests from the same user can't both pass.
    pub fn check_at(&self, user_id: u64, now: Instant) -> Result<(), CoolingDown> {
        let mut last = self.last_request.write().unwrap_or_else(|e| e.into_inner());

        if let Some(&last_time) = last.get(&user_id) {
            let elapsed = now.saturating_duration_since(last_time);
            if elapsed < self.interval {
                return Err(CoolingDown {
                    remaining_secs: ceil_secs(self.interval - elapsed),
                });
            }
        }

        last.insert(user_id, now);
        Ok(())
    }

    /// Number of users currently tracked
    pub fn tracked_users(&self) -> usize {
        self.last_request.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop entries older than several cooldown windows
    ///
    /// Returns the number of evicted entries.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let threshold = self.eviction_age();

        let mut last = self.last_request.write().unwrap_or_else(|e| e.into_inner());
        let initial_count = last.len();
        last.retain(|_, &mut instant| now.saturating_duration_since(instant) < threshold);

        initial_count - last.len()
    }

    /// Spawn a background task evicting stale entries
    ///
    /// Runs once per eviction age, but at least once an hour.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.cleanup_period());
            loop {
                interval.tick().await;
                let evicted = limiter.cleanup();
                if evicted > 0 {
                    tracing::debug!("Evicted {} stale cooldown entries", evicted);
                }
            }
        })
    }

    fn eviction_age(&self) -> Duration {
        self.interval
            .checked_mul(COOLDOWN_EVICTION_FACTOR)
            .unwrap_or(Duration::MAX)
    }

    fn cleanup_period(&self) -> Duration {
        // Zero would make the cleanup interval panic
        self.eviction_age()
            .clamp(Duration::from_secs(1), MAX_CLEANUP_PERIOD)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(30))
    }

    #[test]
    fn test_rate_limiter() {
        let limiter = limiter();

        // First request should pass
        assert!(limiter.check(123).is_ok());

        // Immediate second request should fail
        assert!(limiter.check(123).is_err());

        // Different user should pass
        assert!(limiter.check(456).is_ok());
    }

    #[test]
    fn test_remaining_wait_is_positive_and_bounded() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());

        let err = limiter.check_at(1, start).unwrap_err();
        assert_eq!(err.remaining_secs, 30);

        let err = limiter.check_at(1, start + Duration::from_millis(10_500)).unwrap_err();
        assert_eq!(err.remaining_secs, 20);

        let err = limiter.check_at(1, start + Duration::from_millis(29_999)).unwrap_err();
        assert_eq!(err.remaining_secs, 1);
    }

    #[test]
    fn test_accepts_after_cooldown() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());
        assert!(limiter.check_at(1, start + Duration::from_secs(30)).is_ok());

        // The accepted request restarted the window
        assert!(limiter.check_at(1, start + Duration::from_secs(45)).is_err());
    }

    #[test]
    fn test_rejected_request_does_not_restart_window() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());
        assert!(limiter.check_at(1, start + Duration::from_secs(20)).is_err());
        assert!(limiter.check_at(1, start + Duration::from_secs(31)).is_ok());
    }

    #[test]
    fn test_cleanup_evicts_old_entries() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());
        assert!(limiter.check_at(2, start + Duration::from_secs(100)).is_ok());
        assert_eq!(limiter.tracked_users(), 2);

        // 4 windows of 30s = 120s
        let evicted = limiter.cleanup_at(start + Duration::from_secs(121));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_users(), 1);

        let evicted = limiter.cleanup_at(start + Duration::from_secs(121));
        assert_eq!(evicted, 0);
    }

    #[test]
    fn test_huge_cooldown_does_not_overflow() {
        let limiter = RateLimiter::new(Duration::from_secs(i64::MAX as u64));
        let start = Instant::now();

        assert!(limiter.check_at(1, start).is_ok());
        assert_eq!(limiter.cleanup_at(start + Duration::from_secs(3600)), 0);
        assert_eq!(limiter.eviction_age(), Duration::MAX);
        assert_eq!(limiter.cleanup_period(), MAX_CLEANUP_PERIOD);
    }

    #[test]
    fn test_cleanup_period_bounds() {
        assert_eq!(RateLimiter::new(Duration::ZERO).cleanup_period(), Duration::from_secs(1));
        assert_eq!(limiter().cleanup_period(), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_cleanup_task_with_huge_cooldown() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(u64::MAX)));
        let task = limiter.spawn_cleanup_task();

        // Let the first tick run
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        task.abort();
    }

    #[test]
    fn test_concurrent_requests_from_one_user() {
        let limiter = Arc::new(limiter());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.check(99).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(Duration::from_secs(0)), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_secs(5)), 5);
        assert_eq!(ceil_secs(Duration::from_millis(5001)), 6);
    }
}
