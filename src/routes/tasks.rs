// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch sync routes, intended for a scheduler or an operator.

use crate::error::Result;
use crate::services::{BatchReport, PendingSummary};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks/pending", get(pending))
        .route("/tasks/sync-pending", post(sync_pending))
}

/// Count pending records with an enabled mapping.
async fn pending(State(state): State<Arc<AppState>>) -> Result<Json<PendingSummary>> {
    Ok(Json(state.sync.pending_summary()?))
}

/// Push every pending record to SFMC.
async fn sync_pending(State(state): State<Arc<AppState>>) -> Result<Json<BatchReport>> {
    let report = state.sync.sync_pending().await?;
    Ok(Json(report))
}
