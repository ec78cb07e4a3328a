// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token lifecycle: reuse while inside its TTL, refresh otherwise.

use crate::db::Settings;
use crate::models::{ApiSettings, CachedToken, Environment};
use crate::services::sfmc::{SfmcClient, SfmcError};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Manages the SFMC access token shared by every sync in this process.
///
/// Lookup order:
/// 1. In-memory cache (no I/O)
/// 2. Per-environment refresh lock, then re-check the cache
/// 3. Token persisted in the settings store
/// 4. Fresh token from the auth endpoint, persisted and cached
#[derive(Clone)]
pub struct TokenCache {
    client: SfmcClient,
    settings: Settings,
    cache: Arc<DashMap<Environment, CachedToken>>,
    refresh_locks: Arc<DashMap<Environment, Arc<Mutex<()>>>>,
}

impl TokenCache {
    pub fn new(client: SfmcClient, settings: Settings) -> Self {
        Self {
            client,
            settings,
            cache: Arc::new(DashMap::new()),
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Return a valid access token, or `None` when one could not be obtained.
    ///
    /// `None` means the sync is aborted and no payload is sent. The failure
    /// has already been logged.
    pub async fn get_valid_token(&self, api: &ApiSettings) -> Option<String> {
        match self.try_get_valid_token(api).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    status = e.status(),
                    environment = api.environment().as_str(),
                    error = %e,
                    "Failed to obtain SFMC access token"
                );
                None
            }
        }
    }

    async fn try_get_valid_token(&self, api: &ApiSettings) -> Result<String, SfmcError> {
        let environment = api.environment();

        if let Some(token) = self.cached(environment) {
            tracing::debug!(environment = environment.as_str(), "Existing access token reused");
            return Ok(token);
        }

        let lock = self
            .refresh_locks
            .entry(environment)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have refreshed while we waited.
        if let Some(token) = self.cached(environment) {
            tracing::debug!(environment = environment.as_str(), "Existing access token reused");
            return Ok(token);
        }

        if let Some(stored) = self.settings.cached_token() {
            if stored.is_valid_for(environment, Utc::now()) {
                tracing::debug!(
                    environment = environment.as_str(),
                    "Existing access token reused from settings"
                );
                let token = stored.token.clone();
                self.cache.insert(environment, stored);
                return Ok(token);
            }
        }

        tracing::info!(environment = environment.as_str(), "Requesting new SFMC access token");

        let issued_at = Utc::now();
        let response = self
            .client
            .request_token(api.auth_endpoint(), &api.credentials)
            .await?;

        if api.api_debugger {
            tracing::info!(expires_in = response.expires_in, "SFMC token response received");
        }

        let cached = CachedToken {
            token: response.access_token,
            issued_at,
            ttl_seconds: response.expires_in,
            environment,
        };

        // Persistence failure only costs a refresh after restart.
        if let Err(e) = self.settings.store_token(&cached) {
            tracing::warn!(error = %e, "Failed to persist SFMC access token");
        }

        let token = cached.token.clone();
        self.cache.insert(environment, cached);
        tracing::info!(environment = environment.as_str(), "SFMC access token refreshed and cached");
        Ok(token)
    }

    fn cached(&self, environment: Environment) -> Option<String> {
        self.cache
            .get(&environment)
            .filter(|cached| cached.is_valid_at(Utc::now()))
            .map(|cached| cached.token.clone())
    }
}
