// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-window request counter keyed by identifier.

use crate::clock::SharedClock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

/// Counter state for one identifier.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Time the check was evaluated at.
    #[serde(skip)]
    pub checked_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up and never below one.
    pub fn retry_after_secs(&self) -> u64 {
        let millis = (self.reset_at - self.checked_at).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// In-memory fixed-window rate limiter.
///
/// Clones share the same counters.
#[derive(Clone)]
pub struct RateLimiter {
    name: &'static str,
    limit: u32,
    window: Duration,
    windows: Arc<DashMap<String, Window>>,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(name: &'static str, limit: u32, window: Duration, clock: SharedClock) -> Self {
        Self {
            name,
            limit,
            window,
            windows: Arc::new(DashMap::new()),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `identifier` if the window has room.
    ///
    /// The read, the lazy reset and the increment all happen under the map
    /// shard's write guard, so concurrent checks for the same identifier
    /// cannot both observe the same count.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let fresh = Window {
            count: 0,
            reset_at: now + self.window,
        };

        let mut window = self
            .windows
            .entry(identifier.to_string())
            .or_insert(fresh);

        if now >= window.reset_at {
            *window = fresh;
        }

        if window.count >= self.limit {
            tracing::debug!(
                limiter = self.name,
                identifier,
                limit = self.limit,
                reset_at = %window.reset_at,
                "Rate limit exceeded"
            );
            return RateLimitDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                reset_at: window.reset_at,
                checked_at: now,
            };
        }

        window.count += 1;

        RateLimitDecision {
            allowed: true,
            limit: self.limit,
            remaining: self.limit - window.count,
            reset_at: window.reset_at,
            checked_at: now,
        }
    }

    /// Report the current state for `identifier` without counting a request.
    pub fn peek(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let (count, reset_at) = match self.windows.get(identifier) {
            Some(window) if now < window.reset_at => (window.count, window.reset_at),
            _ => (0, now + self.window),
        };

        RateLimitDecision {
            allowed: count < self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            reset_at,
            checked_at: now,
        }
    }

    /// Drop windows that have already elapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.windows.retain(|_, window| {
            let keep = now < window.reset_at;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Run [`sweep`](Self::sweep) on a fixed interval for the life of the process.
    pub fn spawn_sweeper(&self, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    tracing::debug!(
                        limiter = limiter.name,
                        removed,
                        remaining = limiter.tracked(),
                        "Swept expired rate limit windows"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn limiter(limit: u32, window_ms: i64) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let limiter = RateLimiter::new(
            "test",
            limit,
            Duration::milliseconds(window_ms),
            clock.clone(),
        );
        (limiter, clock)
    }

    #[test]
    fn test_window_boundary() {
        let (limiter, clock) = limiter(3, 1000);
        let start = clock.now();

        let remaining: Vec<u32> = (0..3)
            .map(|_| {
                let decision = limiter.check("user-1");
                assert!(decision.allowed);
                assert_eq!(decision.reset_at, start + Duration::milliseconds(1000));
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        clock.advance(Duration::milliseconds(500));
        let denied = limiter.check("user-1");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, start + Duration::milliseconds(1000));

        clock.advance(Duration::milliseconds(500));
        let after_reset = limiter.check("user-1");
        assert!(after_reset.allowed);
        assert_eq!(after_reset.remaining, 2);
        assert_eq!(after_reset.reset_at, clock.now() + Duration::milliseconds(1000));
    }

    #[test]
    fn test_denied_check_does_not_extend_window() {
        let (limiter, clock) = limiter(1, 1000);
        let first = limiter.check("user-1");
        clock.advance(Duration::milliseconds(900));
        let denied = limiter.check("user-1");
        assert!(!denied.allowed);
        assert_eq!(denied.reset_at, first.reset_at);
        assert_eq!(denied.retry_after_secs(), 1);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let (limiter, _clock) = limiter(1, 1000);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn test_zero_limit_always_denies() {
        let (limiter, _clock) = limiter(0, 1000);
        let decision = limiter.check("a");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_peek_does_not_count() {
        let (limiter, _clock) = limiter(2, 1000);
        assert_eq!(limiter.peek("a").remaining, 2);
        limiter.check("a");
        assert_eq!(limiter.peek("a").remaining, 1);
        assert_eq!(limiter.peek("a").remaining, 1);
        assert_eq!(limiter.check("a").remaining, 0);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (limiter, clock) = limiter(1, 60_000);
        limiter.check("a");
        clock.advance(Duration::milliseconds(30_500));
        let denied = limiter.check("a");
        assert_eq!(denied.retry_after_secs(), 30);

        clock.advance(Duration::milliseconds(29_400));
        let denied = limiter.check("a");
        assert_eq!(denied.retry_after_secs(), 1);
    }

    #[test]
    fn test_sweep_removes_only_expired_windows() {
        let (limiter, clock) = limiter(5, 1000);
        limiter.check("old");
        clock.advance(Duration::milliseconds(600));
        limiter.check("fresh");

        clock.advance(Duration::milliseconds(400));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.tracked(), 1);

        // The surviving window keeps its count.
        assert_eq!(limiter.check("fresh").remaining, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_exceed_limit() {
        let (limiter, _clock) = limiter(10, 60_000);

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check("shared").allowed })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 10);
    }
}
