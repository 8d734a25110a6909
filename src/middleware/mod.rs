// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, request validation).

pub mod auth;
pub mod validated_json;

pub use auth::{require_auth, AuthUser};
pub use validated_json::ValidatedJson;
