// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestration.
//!
//! Handles the per-record workflow:
//! 1. Skip records already marked submitted
//! 2. Build the payload from the record's mapping (nothing to send → skip)
//! 3. Refuse payloads without `keys.EmailAddress`
//! 4. Obtain a valid access token
//! 5. POST the payload and, on 200, mark the record submitted
//!
//! Every failure is logged and absorbed; the record stays pending.

use crate::db::{RecordStore, Settings, StoreError};
use crate::models::{RecordId, SubscriptionPayload, SubscriptionSettings, SyncRecord};
use crate::services::payload::PayloadBuilder;
use crate::services::sfmc::{SfmcClient, SfmcError};
use crate::services::token::TokenCache;
use serde::Serialize;
use std::sync::Arc;

/// Why a record produced nothing to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadySubmitted,
    MappingDisabled,
    MissingEmail,
}

/// Why a record could not be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    /// Settings missing or invalid
    Settings(String),
    /// No access token
    Auth,
    /// Subscription endpoint rejected the request or was unreachable
    Api(SfmcError),
}

/// Result of syncing one record. Never an error: failures stay pending.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Submitted { response: serde_json::Value },
    Skipped(SkipReason),
    Failed(SyncFailure),
}

/// Counts from one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub submitted: u32,
    pub skipped: u32,
    pub failed: u32,
    pub failed_ids: Vec<String>,
}

impl BatchReport {
    fn record(&mut self, id: &RecordId, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Submitted { .. } => self.submitted += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Failed(_) => {
                self.failed += 1;
                self.failed_ids.push(id.to_string());
            }
        }
    }
}

/// Pending records awaiting subscription, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingSummary {
    pub users: usize,
    pub submissions: usize,
}

/// Ties payload building, token management and dispatch together.
#[derive(Clone)]
pub struct SyncOrchestrator {
    settings: Settings,
    records: Arc<dyn RecordStore>,
    tokens: TokenCache,
    client: SfmcClient,
    payloads: PayloadBuilder,
}

impl SyncOrchestrator {
    pub fn new(
        settings: Settings,
        records: Arc<dyn RecordStore>,
        tokens: TokenCache,
        client: SfmcClient,
        payloads: PayloadBuilder,
    ) -> Self {
        Self {
            settings,
            records,
            tokens,
            client,
            payloads,
        }
    }

    /// Wire up an orchestrator with a fresh token cache over `settings`.
    pub fn from_parts(
        settings: Settings,
        records: Arc<dyn RecordStore>,
        client: SfmcClient,
    ) -> Self {
        let tokens = TokenCache::new(client.clone(), settings.clone());
        Self::new(settings, records, tokens, client, PayloadBuilder::new())
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Sync one record and mark it submitted on success.
    pub async fn sync_record(&self, record: &SyncRecord) -> SyncOutcome {
        let id = record.id();
        let outcome = self.dispatch(record).await;

        match &outcome {
            SyncOutcome::Submitted { .. } => {
                tracing::info!(record = %id, "Record subscribed in SFMC");
                if let Err(e) = self.records.mark_submitted(&id) {
                    tracing::error!(
                        record = %id,
                        error = %e,
                        "Failed to mark record submitted; it will be sent again"
                    );
                }
            }
            SyncOutcome::Skipped(reason) => {
                tracing::debug!(record = %id, reason = ?reason, "Nothing to send");
            }
            SyncOutcome::Failed(failure) => {
                tracing::warn!(record = %id, failure = ?failure, "Record left pending");
            }
        }

        outcome
    }

    async fn dispatch(&self, record: &SyncRecord) -> SyncOutcome {
        if record.status().is_submitted() {
            return SyncOutcome::Skipped(SkipReason::AlreadySubmitted);
        }

        let subscription = match self.settings.subscription() {
            Ok(subscription) => subscription,
            Err(e) => return Self::settings_failure(e),
        };

        let payload = match self.build_payload(record, &subscription) {
            Ok(Some(payload)) => payload,
            Ok(None) => return SyncOutcome::Skipped(SkipReason::MappingDisabled),
            Err(e) => return Self::settings_failure(e),
        };

        if !payload.has_email() {
            return SyncOutcome::Skipped(SkipReason::MissingEmail);
        }

        let api = match self.settings.api() {
            Ok(api) => api,
            Err(e) => return Self::settings_failure(e),
        };

        let Some(token) = self.tokens.get_valid_token(&api).await else {
            return SyncOutcome::Failed(SyncFailure::Auth);
        };

        let endpoint = subscription.endpoint(api.environment());
        match self.client.subscribe(endpoint, &token, &payload).await {
            Ok(response) => {
                if api.api_debugger {
                    tracing::info!(response = %response, "SFMC subscription response");
                }
                SyncOutcome::Submitted { response }
            }
            Err(e) => {
                if e.is_client_error() {
                    tracing::warn!(kind = e.kind(), status = e.status(), error = %e, "SFMC subscription rejected");
                } else {
                    tracing::error!(kind = e.kind(), status = e.status(), error = %e, "SFMC subscription failed");
                }
                SyncOutcome::Failed(SyncFailure::Api(e))
            }
        }
    }

    fn settings_failure(e: StoreError) -> SyncOutcome {
        tracing::error!(error = %e, "SFMC settings unavailable");
        SyncOutcome::Failed(SyncFailure::Settings(e.to_string()))
    }

    /// Payload for a record, `Ok(None)` when its mapping is disabled.
    pub fn build_payload(
        &self,
        record: &SyncRecord,
        subscription: &SubscriptionSettings,
    ) -> Result<Option<SubscriptionPayload>, StoreError> {
        match record {
            SyncRecord::User(user) => {
                let mapping = self.settings.user_mapping()?;
                Ok(self.payloads.build_from_user(user, &mapping, subscription))
            }
            SyncRecord::Webform(submission) => {
                let Some(mapping) = self.settings.webform_mapping(&submission.webform_id)? else {
                    return Ok(None);
                };
                Ok(self.payloads.build_from_webform(
                    &submission.webform_id,
                    &submission.data,
                    &mapping,
                    subscription,
                ))
            }
        }
    }

    /// Pending records whose mapping is enabled.
    pub fn pending(&self) -> Result<Vec<SyncRecord>, StoreError> {
        let user_mapping_enabled = self.settings.user_mapping()?.enabled;
        let mut records = self.records.scan_pending()?;

        records.retain(|record| match record {
            SyncRecord::User(_) => user_mapping_enabled,
            SyncRecord::Webform(submission) => {
                match self.settings.webform_mapping(&submission.webform_id) {
                    Ok(mapping) => mapping.is_some_and(|m| m.enabled),
                    Err(e) => {
                        tracing::warn!(
                            webform_id = %submission.webform_id,
                            submission_id = submission.submission_id,
                            error = %e,
                            "Invalid webform mapping, submission not synced"
                        );
                        false
                    }
                }
            }
        });

        Ok(records)
    }

    pub fn pending_summary(&self) -> Result<PendingSummary, StoreError> {
        let mut summary = PendingSummary::default();
        for record in self.pending()? {
            match record {
                SyncRecord::User(_) => summary.users += 1,
                SyncRecord::Webform(_) => summary.submissions += 1,
            }
        }
        Ok(summary)
    }

    /// Sync every pending record, one at a time.
    ///
    /// A failure on one record never stops the rest.
    pub async fn sync_pending(&self) -> Result<BatchReport, StoreError> {
        let pending = self.pending()?;
        tracing::info!(count = pending.len(), "Starting pending subscription batch");

        let mut report = BatchReport::default();
        for record in &pending {
            let outcome = self.sync_record(record).await;
            report.record(&record.id(), &outcome);
        }

        tracing::info!(
            submitted = report.submitted,
            skipped = report.skipped,
            failed = report.failed,
            "Pending subscription batch finished"
        );
        Ok(report)
    }
}
