// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admission decisions composed from several limiters.

use super::limiter::{RateLimitDecision, RateLimiter};
use crate::clock::SharedClock;
use crate::config::Config;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Remaining quota of one limiter after an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    pub limiter: &'static str,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl LimitStatus {
    fn from_decision(limiter: &RateLimiter, decision: &RateLimitDecision) -> Self {
        Self {
            limiter: limiter.name(),
            limit: decision.limit,
            remaining: decision.remaining,
            reset_at: decision.reset_at,
        }
    }
}

/// Result of [`QuotaGate::admit`].
#[derive(Debug, Clone)]
pub struct Admission {
    pub allowed: bool,
    /// Name of the limiter that rejected the request.
    pub denied_by: Option<&'static str>,
    pub retry_after_secs: Option<u64>,
    /// One entry per limiter that was evaluated, in evaluation order.
    pub statuses: Vec<LimitStatus>,
    /// `X-RateLimit-*` headers (and `Retry-After` on denial) for the response.
    pub headers: HeaderMap,
}

/// Sequences limiter checks for one logical operation.
///
/// The first denial stops evaluation, so later limiters are not charged for a
/// request that an earlier one rejected.
pub struct QuotaGate;

impl QuotaGate {
    pub fn admit(identifier: &str, limiters: &[&RateLimiter]) -> Admission {
        let mut statuses = Vec::with_capacity(limiters.len());

        for limiter in limiters {
            let decision = limiter.check(identifier);
            statuses.push(LimitStatus::from_decision(limiter, &decision));

            if !decision.allowed {
                let retry_after = decision.retry_after_secs();
                let mut headers = rate_limit_headers(&decision);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));

                tracing::info!(
                    identifier,
                    limiter = limiter.name(),
                    retry_after_secs = retry_after,
                    "Request denied by quota gate"
                );

                return Admission {
                    allowed: false,
                    denied_by: Some(limiter.name()),
                    retry_after_secs: Some(retry_after),
                    statuses,
                    headers,
                };
            }
        }

        let headers = statuses
            .iter()
            .min_by_key(|status| status.remaining)
            .map(status_headers)
            .unwrap_or_default();

        Admission {
            allowed: true,
            denied_by: None,
            retry_after_secs: None,
            statuses,
            headers,
        }
    }
}

fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    header_map(decision.limit, decision.remaining, decision.reset_at)
}

fn status_headers(status: &LimitStatus) -> HeaderMap {
    header_map(status.limit, status.remaining, status.reset_at)
}

fn header_map(limit: u32, remaining: u32, reset_at: DateTime<Utc>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_at.timestamp()));
    headers
}

/// Per-user limits on the AI workout generation endpoint.
#[derive(Clone)]
pub struct AiQuota {
    minute: RateLimiter,
    day: RateLimiter,
}

impl AiQuota {
    pub fn new(per_minute: u32, per_day: u32, clock: SharedClock) -> Self {
        Self {
            minute: RateLimiter::new("minute", per_minute, Duration::minutes(1), clock.clone()),
            day: RateLimiter::new("day", per_day, Duration::days(1), clock),
        }
    }

    pub fn from_config(config: &Config, clock: SharedClock) -> Self {
        Self::new(
            config.ai_rate_limit_per_minute,
            config.ai_rate_limit_per_day,
            clock,
        )
    }

    /// Check the short window first, then the daily window.
    pub fn admit(&self, user_id: &str) -> Admission {
        QuotaGate::admit(user_id, &[&self.minute, &self.day])
    }

    /// Current quota for `user_id` without consuming any.
    pub fn status(&self, user_id: &str) -> Vec<LimitStatus> {
        [&self.minute, &self.day]
            .into_iter()
            .map(|limiter| LimitStatus::from_decision(limiter, &limiter.peek(user_id)))
            .collect()
    }

    /// Half the shortest window, never below one second.
    pub fn sweep_interval(&self) -> std::time::Duration {
        let shortest = self.minute.window().min(self.day.window());
        (shortest / 2)
            .to_std()
            .unwrap_or_default()
            .max(std::time::Duration::from_secs(1))
    }

    /// Start the background sweepers, one per window.
    pub fn spawn_sweepers(&self) -> [tokio::task::JoinHandle<()>; 2] {
        let every = self.sweep_interval();
        [
            self.minute.spawn_sweeper(every),
            self.day.spawn_sweeper(every),
        ]
    }

    pub fn minute(&self) -> &RateLimiter {
        &self.minute
    }

    pub fn day(&self) -> &RateLimiter {
        &self.day
    }
}
