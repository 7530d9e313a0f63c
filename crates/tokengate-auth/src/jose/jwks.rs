//! JWK Set sources for `private_key_jwt` clients.
//!
//! A [`JwkSetSource`] turns a client's registered `jwk_set_url` into a
//! [`JwkSet`]. Two implementations are provided:
//!
//! - [`StaticJwkSetSource`]: sets registered up front, keyed by URL. Used by
//!   tests and by deployments that distribute client keys out of band.
//! - [`RemoteJwkSetSource`]: fetches over HTTP(S) and caches each set for a
//!   configurable TTL. When a refresh fails, the last fetched set is served
//!   if one exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::config::JwksCacheConfig;
use crate::error::AuthError;

/// Resolves a JWK Set URL to the key set published there.
#[async_trait]
pub trait JwkSetSource: Send + Sync {
    /// Returns the JWK Set for `jwk_set_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is unknown or cannot be retrieved.
    async fn jwk_set(&self, jwk_set_url: &str) -> AuthResult<JwkSet>;

    /// Returns the JWK Set for `jwk_set_url`, bypassing any cached copy.
    ///
    /// Called when a cached set lacks the key an assertion names, so that a
    /// client which rotated its keys is not locked out until the cache expires.
    async fn refresh(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        self.jwk_set(jwk_set_url).await
    }
}

// ============================================================================
// Static Source
// ============================================================================

/// JWK Sets registered in memory, keyed by URL.
#[derive(Debug, Default)]
pub struct StaticJwkSetSource {
    sets: DashMap<String, JwkSet>,
}

impl StaticJwkSetSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the set served for `jwk_set_url`.
    pub fn insert(&self, jwk_set_url: impl Into<String>, jwk_set: JwkSet) {
        self.sets.insert(jwk_set_url.into(), jwk_set);
    }

    #[must_use]
    pub fn with_jwk_set(self, jwk_set_url: impl Into<String>, jwk_set: JwkSet) -> Self {
        self.insert(jwk_set_url, jwk_set);
        self
    }
}

#[async_trait]
impl JwkSetSource for StaticJwkSetSource {
    async fn jwk_set(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        self.sets
            .get(jwk_set_url)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                AuthError::invalid_client(format!("No JWK Set registered for '{jwk_set_url}'"))
            })
    }
}

// ============================================================================
// Remote Source
// ============================================================================

struct CachedJwkSet {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Fetches JWK Sets over HTTP and caches them per URL.
pub struct RemoteJwkSetSource {
    cache: Arc<RwLock<HashMap<String, CachedJwkSet>>>,
    http: reqwest::Client,
    config: JwksCacheConfig,
}

impl RemoteJwkSetSource {
    /// Creates a new source with the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: JwksCacheConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            http,
            config,
        })
    }

    /// Drops the cached set for `jwk_set_url`, forcing the next lookup to fetch.
    pub async fn invalidate(&self, jwk_set_url: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(jwk_set_url);
    }

    /// Clears all cached entries.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    async fn fetch(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        if self.config.require_https && !jwk_set_url.starts_with("https://") {
            return Err(AuthError::invalid_client("JWK Set URL must use HTTPS"));
        }

        let response = self
            .http
            .get(jwk_set_url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AuthError::storage(format!("Failed to fetch JWK Set: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::storage(format!(
                "JWK Set fetch failed with status: {}",
                response.status()
            )));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_response_size
        {
            return Err(AuthError::storage("JWK Set response exceeds maximum size"));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::storage(format!("Failed to read JWK Set: {e}")))?;
        if body.len() > self.config.max_response_size {
            return Err(AuthError::storage("JWK Set response exceeds maximum size"));
        }

        serde_json::from_slice(&body)
            .map_err(|e| AuthError::invalid_client(format!("Invalid JWK Set JSON: {e}")))
    }

    async fn fetch_and_store(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        let jwks = self.fetch(jwk_set_url).await?;
        let mut cache = self.cache.write().await;
        cache.insert(
            jwk_set_url.to_string(),
            CachedJwkSet {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(jwks)
    }
}

#[async_trait]
impl JwkSetSource for RemoteJwkSetSource {
    async fn jwk_set(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(jwk_set_url)
                && cached.fetched_at.elapsed() < self.config.ttl
            {
                return Ok(cached.jwks.clone());
            }
        }

        match self.fetch_and_store(jwk_set_url).await {
            Ok(jwks) => Ok(jwks),
            Err(err) => {
                let cache = self.cache.read().await;
                if let Some(cached) = cache.get(jwk_set_url) {
                    tracing::warn!(
                        jwk_set_url,
                        error = %err,
                        "JWK Set refresh failed, serving cached copy"
                    );
                    return Ok(cached.jwks.clone());
                }
                tracing::warn!(jwk_set_url, error = %err, "JWK Set fetch failed");
                Err(err)
            }
        }
    }

    async fn refresh(&self, jwk_set_url: &str) -> AuthResult<JwkSet> {
        tracing::debug!(jwk_set_url, "refetching JWK Set for an unknown key");
        self.fetch_and_store(jwk_set_url).await.inspect_err(|err| {
            tracing::warn!(jwk_set_url, error = %err, "JWK Set refetch failed");
        })
    }
}
