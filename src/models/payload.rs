// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription request body sent to SFMC.

use super::mapping::roles;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `{keys, values}` entry of the subscription request array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub keys: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

impl SubscriptionPayload {
    /// Start a payload with the keys every request carries.
    pub fn new(source_id: &str, timestamp: String) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(roles::SOURCE_ID.to_string(), source_id.to_string());
        keys.insert(roles::TIME_STAMP.to_string(), timestamp);
        Self {
            keys,
            values: BTreeMap::new(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.keys
            .get(roles::EMAIL_ADDRESS)
            .map(String::as_str)
            .filter(|e| !e.trim().is_empty())
    }

    /// Payloads without an email address must never be dispatched.
    pub fn has_email(&self) -> bool {
        self.email().is_some()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.keys
            .insert(roles::EMAIL_ADDRESS.to_string(), email.into());
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}
