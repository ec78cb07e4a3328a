// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync record storage: pending-record scanner and submitted marker.

use crate::db::StoreError;
use crate::models::{RecordId, SyncRecord, SyncStatus, UserRecord, WebformSubmission};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Source of pending records and sink for the `submitted` marker.
pub trait RecordStore: Send + Sync {
    /// Users and webform submissions without a `submitted` marker.
    fn scan_pending(&self) -> Result<Vec<SyncRecord>, StoreError>;

    /// Persist the `submitted` marker on a record.
    fn mark_submitted(&self, id: &RecordId) -> Result<(), StoreError>;

    /// Store a newly received submission, replacing one with the same id.
    ///
    /// A `submitted` marker already on the stored copy is kept. Returns the
    /// submission as stored.
    fn insert_submission(
        &self,
        submission: WebformSubmission,
    ) -> Result<WebformSubmission, StoreError>;
}

/// On-disk layout of the records file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    submissions: Vec<WebformSubmission>,
}

/// Records kept in memory and optionally persisted to a JSON file.
pub struct JsonRecordStore {
    path: Option<PathBuf>,
    records: RwLock<RecordFile>,
}

impl JsonRecordStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: RwLock::new(RecordFile::default()),
        }
    }

    /// In-memory store seeded with records.
    pub fn with_records(users: Vec<UserRecord>, submissions: Vec<WebformSubmission>) -> Self {
        Self {
            path: None,
            records: RwLock::new(RecordFile { users, submissions }),
        }
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            tracing::info!(path = %path.display(), "Records file not found, starting empty");
            RecordFile::default()
        };

        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    fn persist(&self, records: &RecordFile) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(records)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Look up a stored record by id.
    pub fn get(&self, id: &RecordId) -> Option<SyncRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        match id {
            RecordId::User { user_id } => records
                .users
                .iter()
                .find(|u| u.id == *user_id)
                .cloned()
                .map(SyncRecord::User),
            RecordId::Webform {
                webform_id,
                submission_id,
            } => records
                .submissions
                .iter()
                .find(|s| s.webform_id == *webform_id && s.submission_id == *submission_id)
                .cloned()
                .map(SyncRecord::Webform),
        }
    }
}

impl RecordStore for JsonRecordStore {
    fn scan_pending(&self) -> Result<Vec<SyncRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

        let users = records
            .users
            .iter()
            .filter(|u| !u.status.is_submitted())
            .cloned()
            .map(SyncRecord::User);
        let submissions = records
            .submissions
            .iter()
            .filter(|s| !s.status.is_submitted())
            .cloned()
            .map(SyncRecord::Webform);

        Ok(users.chain(submissions).collect())
    }

    fn mark_submitted(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        let status = match id {
            RecordId::User { user_id } => records
                .users
                .iter_mut()
                .find(|u| u.id == *user_id)
                .map(|u| &mut u.status),
            RecordId::Webform {
                webform_id,
                submission_id,
            } => records
                .submissions
                .iter_mut()
                .find(|s| s.webform_id == *webform_id && s.submission_id == *submission_id)
                .map(|s| &mut s.status),
        };

        match status {
            Some(status) => *status = SyncStatus::Submitted,
            None => return Err(StoreError::NotFound(id.to_string())),
        }

        self.persist(&records)
    }

    fn insert_submission(
        &self,
        mut submission: WebformSubmission,
    ) -> Result<WebformSubmission, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        match records.submissions.iter_mut().find(|s| {
            s.webform_id == submission.webform_id && s.submission_id == submission.submission_id
        }) {
            Some(existing) => {
                if existing.status.is_submitted() {
                    submission.status = SyncStatus::Submitted;
                }
                *existing = submission.clone();
            }
            None => records.submissions.push(submission.clone()),
        }

        self.persist(&records)?;
        Ok(submission)
    }
}
