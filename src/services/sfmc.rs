// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SFMC REST client.
//!
//! Handles:
//! - Access token requests (form-encoded client-credentials grant)
//! - Subscription POSTs (JSON array of `{keys, values}` payloads)
//! - Classifying failures as client (4xx) or transient (everything else)
//!
//! No call is retried here; failed records stay pending for the next run.

use crate::models::{Credentials, SubscriptionPayload};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status reported for failures that never produced a usable HTTP response.
const TRANSIENT_STATUS: u16 = 500;

/// Upper bound on a token lifetime; larger `expires_in` values are clamped.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// SFMC call failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SfmcError {
    /// Token endpoint rejected the request or could not be reached.
    #[error("SFMC auth failed ({status}): {message}")]
    Auth {
        status: u16,
        client: bool,
        message: String,
    },

    /// Subscription endpoint answered 4xx.
    #[error("SFMC API client error ({status}): {message}")]
    ApiClient { status: u16, message: String },

    /// Network failure, timeout, 5xx or unparseable response.
    #[error("SFMC API transient error: {message}")]
    ApiTransient { message: String },
}

impl SfmcError {
    /// Status code to log with the failure.
    pub fn status(&self) -> u16 {
        match self {
            SfmcError::Auth { status, .. } | SfmcError::ApiClient { status, .. } => *status,
            SfmcError::ApiTransient { .. } => TRANSIENT_STATUS,
        }
    }

    /// Failure class used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SfmcError::Auth { client: true, .. } => "AuthClientError",
            SfmcError::Auth { client: false, .. } => "AuthError",
            SfmcError::ApiClient { .. } => "ApiClientError",
            SfmcError::ApiTransient { .. } => "ApiTransientError",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SfmcError::ApiClient { .. } | SfmcError::Auth { client: true, .. }
        )
    }

    fn auth_from_status(status: StatusCode, body: String) -> Self {
        SfmcError::Auth {
            status: status.as_u16(),
            client: status.is_client_error(),
            message: body,
        }
    }

    fn auth_transient(message: String) -> Self {
        SfmcError::Auth {
            status: TRANSIENT_STATUS,
            client: false,
            message,
        }
    }
}

/// Token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds; SFMC sends a number, some proxies a string.
    /// Clamped to `MAX_TOKEN_TTL_SECS`.
    #[serde(deserialize_with = "seconds_from_number_or_string")]
    pub expires_in: u64,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

fn seconds_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    crate::db::settings::as_u64(&value)
        .map(|secs| secs.min(MAX_TOKEN_TTL_SECS))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid expires_in: {}", value)))
}

/// SFMC API client.
#[derive(Clone)]
pub struct SfmcClient {
    http: reqwest::Client,
}

impl Default for SfmcClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl SfmcClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
                reqwest::Client::new()
            });
        Self { http }
    }

    /// Request a fresh access token.
    pub async fn request_token(
        &self,
        auth_endpoint: &str,
        credentials: &Credentials,
    ) -> Result<TokenResponse, SfmcError> {
        let response = self
            .http
            .post(auth_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&credentials.form_params())
            .send()
            .await
            .map_err(|e| SfmcError::auth_transient(format!("Token request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "SFMC token response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SfmcError::auth_from_status(status, body));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            SfmcError::auth_transient(format!("Failed to parse token response: {}", e))
        })?;

        if token.access_token.is_empty() {
            return Err(SfmcError::auth_transient(
                "Token response has empty access_token".to_string(),
            ));
        }

        Ok(token)
    }

    /// POST a single payload, wrapped in a one-element array.
    pub async fn subscribe(
        &self,
        endpoint: &str,
        access_token: &str,
        payload: &SubscriptionPayload,
    ) -> Result<serde_json::Value, SfmcError> {
        self.subscribe_many(endpoint, access_token, std::slice::from_ref(payload))
            .await
    }

    /// POST several payloads in one request.
    pub async fn subscribe_many(
        &self,
        endpoint: &str,
        access_token: &str,
        payloads: &[SubscriptionPayload],
    ) -> Result<serde_json::Value, SfmcError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(access_token)
            .json(payloads)
            .send()
            .await
            .map_err(|e| SfmcError::ApiTransient {
                message: format!("Subscription request failed: {}", e),
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), count = payloads.len(), "SFMC subscription response");

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(SfmcError::ApiClient {
                status: status.as_u16(),
                message: body,
            });
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SfmcError::ApiTransient {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| SfmcError::ApiTransient {
            message: format!("JSON parse error: {}", e),
        })
    }
}
