// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SFMC connector: push user records and webform submissions to
//! Salesforce Marketing Cloud subscriptions.
//!
//! This crate provides the sync engine (token cache, payload builder,
//! REST client, orchestrator) and a small HTTP API around it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::SyncOrchestrator;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sync: SyncOrchestrator,
}
