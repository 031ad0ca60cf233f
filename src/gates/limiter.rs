//! Sliding-window rate limiter keyed by (user, command).

use std::time::{Duration, Instant};

use dashmap::DashMap;
use teloxide::types::UserId;

/// Per-command rate limit: at most `max_calls` accepted calls in any
/// `window_secs`-long window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_calls: u32,
    pub window_secs: u64,
}

/// Process-wide sliding windows. Entries hold the timestamps of accepted
/// calls only; a rejected call leaves the window untouched, so a user at
/// the limit recovers as soon as old calls age out rather than pushing
/// their own lockout forward.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<(u64, String), Vec<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records the call when under the limit.
    pub fn check(&self, user_id: UserId, command: &str, limit: &RateLimit) -> bool {
        self.check_at(user_id, command, limit, Instant::now())
    }

    fn check_at(&self, user_id: UserId, command: &str, limit: &RateLimit, now: Instant) -> bool {
        let key = (user_id.0, command.to_string());
        let window = Duration::from_secs(limit.window_secs);

        let mut calls = self.windows.entry(key).or_default();
        calls.retain(|t| now.duration_since(*t) < window);

        if calls.len() >= limit.max_calls as usize {
            return false;
        }
        calls.push(now);
        true
    }

    /// Drop windows that have fully aged out. Called periodically so the
    /// map doesn't grow with every user ever seen.
    pub fn sweep(&self, max_window: Duration) {
        let now = Instant::now();
        self.windows
            .retain(|_, calls| calls.iter().any(|t| now.duration_since(*t) < max_window));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: RateLimit = RateLimit {
        max_calls: 3,
        window_secs: 60,
    };

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new();
        let user = UserId(1);
        let now = Instant::now();

        assert!(limiter.check_at(user, "ban", &LIMIT, now));
        assert!(limiter.check_at(user, "ban", &LIMIT, now));
        assert!(limiter.check_at(user, "ban", &LIMIT, now));
        assert!(!limiter.check_at(user, "ban", &LIMIT, now));
    }

    #[test]
    fn window_elapse_readmits() {
        let limiter = RateLimiter::new();
        let user = UserId(1);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(user, "ban", &LIMIT, start));
        }
        assert!(!limiter.check_at(user, "ban", &LIMIT, start + Duration::from_secs(30)));
        // All three accepted calls are older than the window now.
        assert!(limiter.check_at(user, "ban", &LIMIT, start + Duration::from_secs(61)));
    }

    #[test]
    fn rejected_calls_do_not_extend_the_window() {
        let limiter = RateLimiter::new();
        let user = UserId(1);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(user, "ban", &LIMIT, start));
        }
        // Hammering while rejected must not push recovery out.
        for i in 0..50 {
            assert!(!limiter.check_at(user, "ban", &LIMIT, start + Duration::from_secs(i)));
        }
        assert!(limiter.check_at(user, "ban", &LIMIT, start + Duration::from_secs(60)));
    }

    #[test]
    fn windows_are_per_user_and_per_command() {
        let limiter = RateLimiter::new();
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(UserId(1), "ban", &LIMIT, now));
        }
        assert!(!limiter.check_at(UserId(1), "ban", &LIMIT, now));
        assert!(limiter.check_at(UserId(2), "ban", &LIMIT, now));
        assert!(limiter.check_at(UserId(1), "mute", &LIMIT, now));
    }

    #[test]
    fn sweep_drops_stale_windows() {
        let limiter = RateLimiter::new();
        let now = Instant::now();
        assert!(limiter.check_at(UserId(1), "ban", &LIMIT, now));
        assert_eq!(limiter.windows.len(), 1);

        // Nothing is older than the window yet.
        limiter.sweep(Duration::from_secs(60));
        assert_eq!(limiter.windows.len(), 1);

        limiter.sweep(Duration::from_secs(0));
        assert_eq!(limiter.windows.len(), 0);
    }
}
