// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Utc};

/// Timestamp layout SFMC expects in `keys.TimeStamp` (`Y-m-d H:i:s`).
const SFMC_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp the way the subscription endpoint expects it.
pub fn format_sfmc_timestamp(date: DateTime<Utc>) -> String {
    date.format(SFMC_TIMESTAMP_FORMAT).to_string()
}
