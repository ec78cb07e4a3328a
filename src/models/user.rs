//! User model for storage and sync.

use super::record::SyncStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A platform user account awaiting (or past) subscription sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Platform user id
    pub id: u64,
    /// Account email, sent as `keys.EmailAddress`
    pub email: String,
    /// Custom profile fields keyed by machine name
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, rename = "sfmc_status")]
    pub status: SyncStatus,
}

impl UserRecord {
    pub fn new(id: u64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            fields: BTreeMap::new(),
            status: SyncStatus::Unset,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
