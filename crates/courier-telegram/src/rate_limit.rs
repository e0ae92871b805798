//! Per-user request throttling.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

/// Length of the sliding window.
const WINDOW: Duration = Duration::from_secs(1);

/// Allows at most `limit` requests per user within a one-second sliding window.
pub struct RateLimiter {
    limit: usize,
    requests: Mutex<HashMap<i64, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `user_id` now. Returns false if it must be rejected.
    pub async fn check(&self, user_id: i64) -> bool {
        self.check_at(user_id, Instant::now()).await
    }

    /// Record a request from `user_id` at `now`.
    pub async fn check_at(&self, user_id: i64, now: Instant) -> bool {
        let mut requests = self.requests.lock().await;
        let times = requests.entry(user_id).or_default();

        while times
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= WINDOW)
        {
            times.pop_front();
        }

        if times.len() >= self.limit {
            warn!(user_id = %user_id, limit = self.limit, "Rate limit exceeded");
            return false;
        }

        times.push_back(now);
        true
    }

    /// Drop bookkeeping for users with no requests in the current window.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut requests = self.requests.lock().await;
        requests.retain(|_, times| {
            times
                .back()
                .is_some_and(|&t| now.saturating_duration_since(t) < WINDOW)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_within_window() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(1, start).await);
        }
        assert!(!limiter.check_at(1, start + Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();

        assert!(limiter.check_at(1, start).await);
        assert!(limiter.check_at(1, start + Duration::from_millis(400)).await);
        assert!(!limiter.check_at(1, start + Duration::from_millis(900)).await);
        assert!(limiter.check_at(1, start + Duration::from_millis(1000)).await);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let limiter = RateLimiter::new(1);
        let now = Instant::now();

        assert!(limiter.check_at(1, now).await);
        assert!(!limiter.check_at(1, now).await);
        assert!(limiter.check_at(2, now).await);
    }

    #[tokio::test]
    async fn test_prune_drops_idle_users() {
        let limiter = RateLimiter::new(1);
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(5))
            .unwrap_or_else(Instant::now);

        limiter.check_at(1, long_ago).await;
        limiter.check(2).await;
        limiter.prune().await;

        let requests = limiter.requests.lock().await;
        assert!(requests.contains_key(&2));
        if long_ago + WINDOW <= Instant::now() {
            assert!(!requests.contains_key(&1));
        }
    }
}
