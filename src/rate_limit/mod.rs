// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request admission: fixed-window limiters and the quota gate that
//! sequences them.

pub mod limiter;
pub mod quota;

pub use limiter::{RateLimitDecision, RateLimiter};
pub use quota::{Admission, AiQuota, LimitStatus, QuotaGate};
