// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Namespaced key-value settings store with typed accessors.
//!
//! Provides:
//! - The `SettingsStore` trait (get/set/save) that hosts implement
//! - A JSON-file-backed implementation, usable purely in memory for tests
//! - `Settings`, a typed view that parses credentials, endpoints, mapping
//!   tables and the cached token out of the raw store

use crate::db::{keys, namespaces, StoreError};
use crate::models::field_value::is_truthy;
use crate::models::{
    ApiSettings, CachedToken, Credentials, Endpoints, Environment, SubscriptionSettings,
    UserMapping, WebformMapping,
};
use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use validator::Validate;

/// Namespaced key-value settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Option<Value>;
    fn set(&self, namespace: &str, key: &str, value: Value);
    /// Keys present in a namespace.
    fn keys(&self, namespace: &str) -> Vec<String>;
    /// Persist pending `set` calls.
    fn save(&self) -> Result<(), StoreError>;
}

type Namespaces = BTreeMap<String, Map<String, Value>>;

/// Settings kept in memory and optionally persisted to a JSON file.
///
/// The file holds one object per namespace:
/// `{"sfmc_connector.api.settings": {"client_id": "..."}, ...}`
pub struct JsonSettingsStore {
    path: Option<PathBuf>,
    data: RwLock<Namespaces>,
}

impl JsonSettingsStore {
    /// Empty store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Namespaces::new()),
        }
    }

    /// In-memory store seeded from a JSON object of namespaces.
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        Ok(Self {
            path: None,
            data: RwLock::new(serde_json::from_value(value)?),
        })
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            tracing::info!(path = %path.display(), "Settings file not found, starting empty");
            Namespaces::new()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace).and_then(|ns| ns.get(key)).cloned()
    }

    fn set(&self, namespace: &str, key: &str, value: Value) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn keys(&self, namespace: &str) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let serialized = {
            let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*data)?
        };

        // Atomic replace via rename.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Typed view over a `SettingsStore`.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    // ─── Raw value helpers ───────────────────────────────────────

    fn optional_string(&self, namespace: &str, key: &str) -> Option<String> {
        match self.store.get(namespace, key)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    fn required_string(
        &self,
        namespace: &'static str,
        key: &'static str,
    ) -> Result<String, StoreError> {
        self.optional_string(namespace, key)
            .ok_or(StoreError::Missing { namespace, key })
    }

    fn flag(&self, namespace: &str, key: &str) -> bool {
        self.store
            .get(namespace, key)
            .is_some_and(|v| is_truthy(&v))
    }

    // ─── API settings ────────────────────────────────────────────

    /// Credentials, auth endpoints and environment flags.
    pub fn api(&self) -> Result<ApiSettings, StoreError> {
        let ns = namespaces::API;
        let settings = ApiSettings {
            credentials: Credentials {
                grant_type: self.required_string(ns, keys::api::GRANT_TYPE)?,
                client_id: self.required_string(ns, keys::api::CLIENT_ID)?,
                client_secret: self.required_string(ns, keys::api::CLIENT_SECRET)?,
                scope: self.required_string(ns, keys::api::SCOPE)?,
                account_id: self.required_string(ns, keys::api::ACCOUNT_ID)?,
            },
            auth_endpoints: Endpoints {
                developer: self.required_string(ns, keys::api::AUTH_DEVELOPER_ENDPOINT)?,
                production: self.required_string(ns, keys::api::AUTH_PRODUCTION_ENDPOINT)?,
            },
            is_prod: self.flag(ns, keys::api::IS_PROD),
            api_debugger: self.flag(ns, keys::api::API_DEBUGGER),
        };

        settings.validate().map_err(|e| StoreError::Invalid {
            key: ns.to_string(),
            reason: e.to_string(),
        })?;
        Ok(settings)
    }

    // ─── Subscription settings ───────────────────────────────────

    pub fn subscription(&self) -> Result<SubscriptionSettings, StoreError> {
        let ns = namespaces::SUBSCRIPTION;
        let settings = SubscriptionSettings {
            source_id: self.required_string(ns, keys::subscription::SOURCE_ID)?,
            subscription_id: self.required_string(ns, keys::subscription::SUBSCRIPTION_ID)?,
            endpoints: Endpoints {
                developer: self.required_string(ns, keys::subscription::SUB_DEVELOPER_ENDPOINT)?,
                production: self
                    .required_string(ns, keys::subscription::SUB_PRODUCTION_ENDPOINT)?,
            },
        };

        settings.validate().map_err(|e| StoreError::Invalid {
            key: ns.to_string(),
            reason: e.to_string(),
        })?;
        Ok(settings)
    }

    // ─── Mapping tables ──────────────────────────────────────────

    /// User field mapping. Absent settings mean "disabled".
    pub fn user_mapping(&self) -> Result<UserMapping, StoreError> {
        let ns = namespaces::USER_MAPPING;
        let fields = match self.store.get(ns, keys::user_mapping::FIELDS) {
            Some(raw) => serde_json::from_value(raw).map_err(|e| StoreError::Invalid {
                key: format!("{}.{}", ns, keys::user_mapping::FIELDS),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };

        Ok(UserMapping {
            enabled: self.flag(ns, keys::user_mapping::ENABLED),
            subscription_id: self.optional_string(ns, keys::user_mapping::SUBSCRIPTION_ID),
            fields,
        })
    }

    /// Mapping for one webform, `None` when the form was never configured.
    pub fn webform_mapping(&self, webform_id: &str) -> Result<Option<WebformMapping>, StoreError> {
        let ns = namespaces::WEBFORM_MAPPING;
        let Some(raw) = self.store.get(ns, webform_id) else {
            return Ok(None);
        };

        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| StoreError::Invalid {
                key: format!("{}.{}", ns, webform_id),
                reason: e.to_string(),
            })
    }

    /// Ids of every configured webform mapping.
    pub fn webform_ids(&self) -> Vec<String> {
        self.store.keys(namespaces::WEBFORM_MAPPING)
    }

    /// Check enabled webform mappings for the required roles.
    ///
    /// Returns one `(webform_id, reason)` entry per invalid mapping.
    pub fn validate_webform_mappings(&self) -> Vec<(String, String)> {
        self.webform_ids()
            .into_iter()
            .filter_map(|id| match self.webform_mapping(&id) {
                Ok(Some(mapping)) => mapping.validate().err().map(|e| (id, e.to_string())),
                Ok(None) => None,
                Err(e) => Some((id, e.to_string())),
            })
            .collect()
    }

    // ─── Cached token ────────────────────────────────────────────

    /// The persisted token, if all of its parts are present.
    pub fn cached_token(&self) -> Option<CachedToken> {
        let ns = namespaces::API;
        let token = self
            .optional_string(ns, keys::api::CURRENT_ACCESS_TOKEN)
            .filter(|t| !t.is_empty())?;
        let issued_at = self
            .store
            .get(ns, keys::api::LAST_GENERATED_TOKEN_TIME)
            .and_then(|v| as_u64(&v))
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))?;
        let ttl_seconds = self
            .store
            .get(ns, keys::api::TOKEN_EXPIRY_TIME)
            .and_then(|v| as_u64(&v))?;
        // Tokens written before environments were tracked belong to whichever
        // environment is active now.
        let environment = self
            .store
            .get(ns, keys::api::TOKEN_ENVIRONMENT)
            .and_then(|v| serde_json::from_value::<Environment>(v).ok())
            .unwrap_or_else(|| Environment::from_is_prod(self.flag(ns, keys::api::IS_PROD)));

        Some(CachedToken {
            token,
            issued_at,
            ttl_seconds,
            environment,
        })
    }

    /// Overwrite the persisted token and save.
    pub fn store_token(&self, token: &CachedToken) -> Result<(), StoreError> {
        let ns = namespaces::API;
        self.store.set(
            ns,
            keys::api::CURRENT_ACCESS_TOKEN,
            Value::String(token.token.clone()),
        );
        self.store.set(
            ns,
            keys::api::LAST_GENERATED_TOKEN_TIME,
            Value::from(token.issued_at.timestamp()),
        );
        self.store.set(
            ns,
            keys::api::TOKEN_EXPIRY_TIME,
            Value::from(token.ttl_seconds),
        );
        self.store.set(
            ns,
            keys::api::TOKEN_ENVIRONMENT,
            Value::String(token.environment.as_str().to_string()),
        );
        self.store.save()
    }
}

/// Read a non-negative integer stored either as a number or a numeric string.
pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn seeded() -> Settings {
        let store = JsonSettingsStore::from_value(json!({
            "sfmc_connector.api.settings": {
                "grant_type": "client_credentials",
                "client_id": "X",
                "client_secret": "Y",
                "scope": "data_extensions_read data_extensions_write",
                "account_id": 1,
                "auth_developer_endpoint": "https://dev.auth/v2/token",
                "auth_production_endpoint": "https://prod.auth/v2/token",
                "is_prod": false
            },
            "sfmc_connector.subscription.settings": {
                "source_id": "web",
                "subscription_id": "sub-default",
                "sub_developer_endpoint": "https://dev.rest/subscriptions",
                "sub_production_endpoint": "https://prod.rest/subscriptions"
            },
            "sfmc_connector.user_mapping.settings": {
                "enabled": "1",
                "subscription_id": "",
                "fields": [
                    {"source": "field_first_name", "target": "FirstName"},
                    {"source": "field_newsletter", "target": "OptIns"},
                    {"source": "field_unused", "target": ""}
                ]
            },
            "sfmc_connector.webform_mapping.settings": {
                "contact": {
                    "enabled": true,
                    "optouts_enabled": false,
                    "elements": [
                        {"source": "email_field", "target": "EmailAddress"},
                        {"source": "optin_field", "target": "OptIns"}
                    ]
                },
                "broken": {
                    "enabled": true,
                    "elements": [{"source": "email_field", "target": "EmailAddress"}]
                }
            }
        }))
        .unwrap();
        Settings::new(Arc::new(store))
    }

    #[test]
    fn api_settings_parse_numbers_as_strings() {
        let api = seeded().api().unwrap();
        assert_eq!(api.credentials.account_id, "1");
        assert_eq!(api.environment(), Environment::Developer);
        assert_eq!(api.auth_endpoint(), "https://dev.auth/v2/token");
    }

    #[test]
    fn api_settings_missing_key() {
        let settings = Settings::new(Arc::new(JsonSettingsStore::in_memory()));
        let err = settings.api().unwrap_err();
        assert!(matches!(err, StoreError::Missing { key: "grant_type", .. }));
    }

    #[test]
    fn api_settings_empty_value_is_invalid() {
        let settings = seeded();
        settings
            .store()
            .set(namespaces::API, keys::api::CLIENT_ID, json!(""));
        assert!(matches!(settings.api(), Err(StoreError::Invalid { .. })));
    }

    #[test]
    fn user_mapping_loads_fields_in_order() {
        let mapping = seeded().user_mapping().unwrap();
        assert!(mapping.enabled);
        assert_eq!(mapping.subscription_id.as_deref(), Some(""));
        assert_eq!(mapping.fields.len(), 3);
        assert_eq!(mapping.fields[0].source, "field_first_name");
        assert_eq!(mapping.fields[2].target, None);
    }

    #[test]
    fn user_mapping_defaults_to_disabled() {
        let settings = Settings::new(Arc::new(JsonSettingsStore::in_memory()));
        let mapping = settings.user_mapping().unwrap();
        assert!(!mapping.enabled);
        assert!(mapping.fields.is_empty());
    }

    #[test]
    fn webform_mapping_lookup() {
        let settings = seeded();
        assert!(settings.webform_mapping("contact").unwrap().is_some());
        assert!(settings.webform_mapping("unknown").unwrap().is_none());
    }

    #[test]
    fn validate_reports_only_broken_webforms() {
        let problems = seeded().validate_webform_mappings();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, "broken");
    }

    #[test]
    fn token_roundtrip_through_store() {
        let settings = seeded();
        assert!(settings.cached_token().is_none());

        let issued_at = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        let token = CachedToken {
            token: "tok123".to_string(),
            issued_at,
            ttl_seconds: 3600,
            environment: Environment::Production,
        };
        settings.store_token(&token).unwrap();

        assert_eq!(settings.cached_token(), Some(token));
    }

    #[test]
    fn legacy_token_without_environment_uses_current_one() {
        let settings = seeded();
        let store = settings.store();
        store.set(namespaces::API, keys::api::CURRENT_ACCESS_TOKEN, json!("old"));
        store.set(namespaces::API, keys::api::LAST_GENERATED_TOKEN_TIME, json!("1700000000"));
        store.set(namespaces::API, keys::api::TOKEN_EXPIRY_TIME, json!("1080"));

        let token = settings.cached_token().unwrap();
        assert_eq!(token.environment, Environment::Developer);
        assert_eq!(token.ttl_seconds, 1080);
        assert_eq!(token.issued_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn file_store_persists_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = JsonSettingsStore::open(&path).unwrap();
        store.set(namespaces::SUBSCRIPTION, "source_id", json!("web"));
        assert!(!path.exists(), "set alone must not write");
        store.save().unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(namespaces::SUBSCRIPTION, "source_id"),
            Some(json!("web"))
        );
        assert_eq!(reopened.keys(namespaces::SUBSCRIPTION), vec!["source_id"]);
    }
}
