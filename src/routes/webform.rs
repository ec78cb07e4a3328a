// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webform submission intake.
//!
//! Stores the submission, then pushes it to SFMC right away. Whatever the
//! outcome, the submission is accepted; anything not sent stays pending for
//! the next batch run.

use crate::error::{AppError, Result};
use crate::models::record::STATUS_ELEMENT;
use crate::models::{SyncRecord, WebformSubmission};
use crate::services::{SkipReason, SyncOutcome};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Webform routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webforms/{webform_id}/submissions", post(submit))
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub submission_id: u64,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: u64,
    pub sfmc_status: &'static str,
    pub data: Map<String, Value>,
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Path(webform_id): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> Result<Json<SubmissionResponse>> {
    if webform_id.trim().is_empty() {
        return Err(AppError::BadRequest("webform_id must not be empty".to_string()));
    }

    tracing::info!(
        webform_id = %webform_id,
        submission_id = request.submission_id,
        "Webform submission received"
    );

    let received = WebformSubmission::received(webform_id, request.submission_id, request.data);
    let submission = state.sync.records().insert_submission(received)?;

    let outcome = state
        .sync
        .sync_record(&SyncRecord::Webform(submission.clone()))
        .await;

    let mut data = submission.data;
    let sfmc_status = match outcome {
        SyncOutcome::Submitted { .. } | SyncOutcome::Skipped(SkipReason::AlreadySubmitted) => {
            data.insert(STATUS_ELEMENT.to_string(), Value::from("submitted"));
            "submitted"
        }
        _ => "pending",
    };

    Ok(Json(SubmissionResponse {
        submission_id: submission.submission_id,
        sfmc_status,
        data,
    }))
}
