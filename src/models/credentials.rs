// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SFMC API credentials and environment selection.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which SFMC tenant endpoints a call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Developer,
    Production,
}

impl Environment {
    pub fn from_is_prod(is_prod: bool) -> Self {
        if is_prod {
            Environment::Production
        } else {
            Environment::Developer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Developer => "developer",
            Environment::Production => "production",
        }
    }
}

/// A developer/production URL pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Endpoints {
    #[validate(length(min = 1, message = "developer endpoint is required"))]
    pub developer: String,
    #[validate(length(min = 1, message = "production endpoint is required"))]
    pub production: String,
}

impl Endpoints {
    pub fn select(&self, environment: Environment) -> &str {
        match environment {
            Environment::Developer => &self.developer,
            Environment::Production => &self.production,
        }
    }
}

/// OAuth client-credentials grant parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "grant_type is required"))]
    pub grant_type: String,
    #[validate(length(min = 1, message = "client_id is required"))]
    pub client_id: String,
    #[validate(length(min = 1, message = "client_secret is required"))]
    pub client_secret: String,
    #[validate(length(min = 1, message = "scope is required"))]
    pub scope: String,
    #[validate(length(min = 1, message = "account_id is required"))]
    pub account_id: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Credentials {
    /// Form body for the token request.
    pub fn form_params(&self) -> [(&'static str, &str); 5] {
        [
            ("grant_type", self.grant_type.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("account_id", self.account_id.as_str()),
        ]
    }
}

/// Everything stored under the API settings namespace, minus the cached token.
#[derive(Debug, Clone, Validate)]
pub struct ApiSettings {
    #[validate(nested)]
    pub credentials: Credentials,
    #[validate(nested)]
    pub auth_endpoints: Endpoints,
    pub is_prod: bool,
    /// Log raw SFMC response bodies at info level.
    pub api_debugger: bool,
}

impl ApiSettings {
    pub fn environment(&self) -> Environment {
        Environment::from_is_prod(self.is_prod)
    }

    pub fn auth_endpoint(&self) -> &str {
        self.auth_endpoints.select(self.environment())
    }
}
