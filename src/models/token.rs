// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached SFMC access token.

use super::credentials::Environment;
use chrono::{DateTime, Duration, Utc};

/// Access token with the time it was issued and its lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    /// Auth endpoint environment that issued the token
    pub environment: Environment,
}

impl CachedToken {
    /// Valid while `now - issued_at < ttl_seconds`.
    ///
    /// A TTL too large for `Duration` never expires.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() {
            return false;
        }
        let ttl = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds);
        match ttl {
            Some(ttl) => now.signed_duration_since(self.issued_at) < ttl,
            None => true,
        }
    }

    pub fn is_valid_for(&self, environment: Environment, now: DateTime<Utc>) -> bool {
        self.environment == environment && self.is_valid_at(now)
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("environment", &self.environment)
            .finish()
    }
}
