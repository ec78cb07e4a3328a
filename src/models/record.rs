// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pending units of sync work and their status marker.

use super::user::UserRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status marker that gates reprocessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Unset,
    Submitted,
}

impl SyncStatus {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SyncStatus::Submitted)
    }
}

/// One stored webform submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebformSubmission {
    pub webform_id: String,
    pub submission_id: u64,
    /// Element key to submitted value
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, rename = "sfmc_status")]
    pub status: SyncStatus,
}

/// Element key that carries the marker inside submitted data.
pub const STATUS_ELEMENT: &str = "sfmc_status";

impl WebformSubmission {
    pub fn new(webform_id: impl Into<String>, submission_id: u64, data: Map<String, Value>) -> Self {
        Self {
            webform_id: webform_id.into(),
            submission_id,
            data,
            status: SyncStatus::Unset,
        }
    }

    /// Submission as received from a form post. Data already carrying
    /// `sfmc_status: "submitted"` arrives marked.
    pub fn received(
        webform_id: impl Into<String>,
        submission_id: u64,
        data: Map<String, Value>,
    ) -> Self {
        let mut submission = Self::new(webform_id, submission_id, data);
        if submission.data.get(STATUS_ELEMENT).and_then(Value::as_str) == Some("submitted") {
            submission.status = SyncStatus::Submitted;
        }
        submission
    }
}

/// Identity of a record, used when marking it submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordId {
    User {
        user_id: u64,
    },
    Webform {
        webform_id: String,
        submission_id: u64,
    },
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::User { user_id } => write!(f, "user:{}", user_id),
            RecordId::Webform {
                webform_id,
                submission_id,
            } => write!(f, "webform:{}:{}", webform_id, submission_id),
        }
    }
}

/// A pending unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRecord {
    User(UserRecord),
    Webform(WebformSubmission),
}

impl SyncRecord {
    pub fn id(&self) -> RecordId {
        match self {
            SyncRecord::User(user) => RecordId::User { user_id: user.id },
            SyncRecord::Webform(submission) => RecordId::Webform {
                webform_id: submission.webform_id.clone(),
                submission_id: submission.submission_id,
            },
        }
    }

    pub fn status(&self) -> SyncStatus {
        match self {
            SyncRecord::User(user) => user.status,
            SyncRecord::Webform(submission) => submission.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_defaults_to_unset() {
        let submission: WebformSubmission = serde_json::from_value(json!({
            "webform_id": "newsletter",
            "submission_id": 7,
            "data": {"email_field": "a@b.com"}
        }))
        .unwrap();

        assert_eq!(submission.status, SyncStatus::Unset);
        assert!(!SyncRecord::Webform(submission).status().is_submitted());
    }

    #[test]
    fn status_reads_sfmc_status_marker() {
        let user: UserRecord = serde_json::from_value(json!({
            "id": 3,
            "email": "a@b.com",
            "sfmc_status": "submitted"
        }))
        .unwrap();

        assert!(user.status.is_submitted());
    }

    #[test]
    fn received_data_marker_sets_status() {
        let mut data = Map::new();
        data.insert("sfmc_status".to_string(), json!("submitted"));
        assert!(WebformSubmission::received("contact", 1, data).status.is_submitted());

        let mut data = Map::new();
        data.insert("sfmc_status".to_string(), json!(""));
        assert!(!WebformSubmission::received("contact", 1, data).status.is_submitted());
    }

    #[test]
    fn record_id_display() {
        let record = SyncRecord::Webform(WebformSubmission::new("contact", 12, Map::new()));
        assert_eq!(record.id().to_string(), "webform:contact:12");
        assert_eq!(
            SyncRecord::User(UserRecord::new(5, "x@y.z")).id().to_string(),
            "user:5"
        );
    }
}
