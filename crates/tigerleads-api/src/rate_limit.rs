//! Per-user sliding-window rate limiter.
//!
//! Constructed once in `main` from [`RateLimitConfig`] and shared through
//! [`AppState`](crate::AppState).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tigerleads_config::RateLimitConfig;
use tigerleads_core::UserId;

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<UserId, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests.max(1) as usize,
            window: config.window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request. On rejection returns how long until a slot frees up.
    pub fn check(&self, user_id: UserId) -> Result<(), Duration> {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: UserId, now: Instant) -> Result<(), Duration> {
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let window = hits.entry(user_id).or_default();

        while window
            .front()
            .is_some_and(|&hit| now.duration_since(hit) >= self.window)
        {
            window.pop_front();
        }

        if window.len() >= self.max_requests {
            let oldest = window.front().copied().unwrap_or(now);
            return Err(self.window.saturating_sub(now.duration_since(oldest)));
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop users with no hits inside the window.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hits.retain(|_, window| {
            window
                .back()
                .is_some_and(|&hit| now.duration_since(hit) < self.window)
        });
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}
