// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use serde_json::{json, Value};
use sfmc_connector::config::Config;
use sfmc_connector::db::{JsonRecordStore, JsonSettingsStore, Settings};
use sfmc_connector::routes::create_router;
use sfmc_connector::services::{SfmcClient, SyncOrchestrator};
use sfmc_connector::AppState;
use std::sync::Arc;

/// Bearer token accepted by the test app.
#[allow(dead_code)]
pub const API_TOKEN: &str = "test_api_token";

/// Settings pointing every SFMC endpoint at `base_url`.
///
/// Webform `contact` is enabled, `survey` is disabled.
#[allow(dead_code)]
pub fn settings_json(base_url: &str) -> Value {
    json!({
        "sfmc_connector.api.settings": {
            "grant_type": "client_credentials",
            "client_id": "X",
            "client_secret": "Y",
            "scope": "data_extensions_read data_extensions_write",
            "account_id": "1",
            "auth_developer_endpoint": format!("{}/v2/token", base_url),
            "auth_production_endpoint": format!("{}/prod/v2/token", base_url),
            "is_prod": false
        },
        "sfmc_connector.subscription.settings": {
            "source_id": "web",
            "subscription_id": "sub-default",
            "sub_developer_endpoint": format!("{}/subscriptions", base_url),
            "sub_production_endpoint": format!("{}/prod/subscriptions", base_url)
        },
        "sfmc_connector.user_mapping.settings": {
            "enabled": true,
            "fields": [
                {"source": "field_first_name", "target": "FirstName"},
                {"source": "field_newsletter", "target": "OptIns"}
            ]
        },
        "sfmc_connector.webform_mapping.settings": {
            "contact": {
                "enabled": true,
                "optouts_enabled": true,
                "subscription_id": "sub-contact",
                "elements": [
                    {"source": "email_field", "target": "EmailAddress"},
                    {"source": "optin_field", "target": "OptIns"},
                    {"source": "name", "target": "FirstName"},
                    {"source": "actions", "target": "Ignored"}
                ]
            },
            "survey": {
                "enabled": false,
                "elements": [
                    {"source": "email", "target": "EmailAddress"},
                    {"source": "optin", "target": "OptIns"}
                ]
            }
        }
    })
}

/// Create a test app whose SFMC endpoints live at `base_url`.
/// Returns the router, the shared state and the record store.
#[allow(dead_code)]
pub fn create_test_app(base_url: &str) -> (axum::Router, Arc<AppState>, Arc<JsonRecordStore>) {
    let store = JsonSettingsStore::from_value(settings_json(base_url))
        .expect("Failed to seed settings");
    create_test_app_with(Settings::new(Arc::new(store)), JsonRecordStore::in_memory())
}

/// Create a test app from explicit stores.
#[allow(dead_code)]
pub fn create_test_app_with(
    settings: Settings,
    records: JsonRecordStore,
) -> (axum::Router, Arc<AppState>, Arc<JsonRecordStore>) {
    let records = Arc::new(records);
    let sync = SyncOrchestrator::from_parts(settings, records.clone(), SfmcClient::default());

    let state = Arc::new(AppState {
        config: Config::default(),
        sync,
    });

    (create_router(state.clone()), state, records)
}
