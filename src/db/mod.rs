//! Storage layer: namespaced settings and sync records.

pub mod records;
pub mod settings;

pub use records::{JsonRecordStore, RecordStore};
pub use settings::{JsonSettingsStore, Settings, SettingsStore};

/// Settings namespaces.
pub mod namespaces {
    pub const API: &str = "sfmc_connector.api.settings";
    pub const SUBSCRIPTION: &str = "sfmc_connector.subscription.settings";
    pub const USER_MAPPING: &str = "sfmc_connector.user_mapping.settings";
    /// Keyed by webform id
    pub const WEBFORM_MAPPING: &str = "sfmc_connector.webform_mapping.settings";
}

/// Setting keys, grouped by namespace.
pub mod keys {
    pub mod api {
        pub const GRANT_TYPE: &str = "grant_type";
        pub const CLIENT_ID: &str = "client_id";
        pub const CLIENT_SECRET: &str = "client_secret";
        pub const SCOPE: &str = "scope";
        pub const ACCOUNT_ID: &str = "account_id";
        pub const AUTH_DEVELOPER_ENDPOINT: &str = "auth_developer_endpoint";
        pub const AUTH_PRODUCTION_ENDPOINT: &str = "auth_production_endpoint";
        pub const IS_PROD: &str = "is_prod";
        pub const API_DEBUGGER: &str = "api_debugger";
        pub const CURRENT_ACCESS_TOKEN: &str = "current_access_token";
        pub const LAST_GENERATED_TOKEN_TIME: &str = "last_generated_token_time";
        pub const TOKEN_EXPIRY_TIME: &str = "token_expiry_time";
        pub const TOKEN_ENVIRONMENT: &str = "token_environment";
    }

    pub mod subscription {
        pub const SOURCE_ID: &str = "source_id";
        pub const SUBSCRIPTION_ID: &str = "subscription_id";
        pub const SUB_DEVELOPER_ENDPOINT: &str = "sub_developer_endpoint";
        pub const SUB_PRODUCTION_ENDPOINT: &str = "sub_production_endpoint";
    }

    pub mod user_mapping {
        pub const ENABLED: &str = "enabled";
        pub const SUBSCRIPTION_ID: &str = "subscription_id";
        pub const FIELDS: &str = "fields";
    }
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing setting {namespace}.{key}")]
    Missing {
        namespace: &'static str,
        key: &'static str,
    },

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Record not found: {0}")]
    NotFound(String),
}
