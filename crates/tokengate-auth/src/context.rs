//! Per-request authorization server context.

use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Endpoint paths, relative to the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwk_set_endpoint: String,
    pub token_revocation_endpoint: String,
    pub token_introspection_endpoint: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            authorization_endpoint: "/oauth2/authorize".to_string(),
            token_endpoint: "/oauth2/token".to_string(),
            jwk_set_endpoint: "/oauth2/jwks".to_string(),
            token_revocation_endpoint: "/oauth2/revoke".to_string(),
            token_introspection_endpoint: "/oauth2/introspect".to_string(),
        }
    }
}

impl ProviderSettings {
    /// All endpoint paths with their setting names.
    pub(crate) fn paths(&self) -> [(&'static str, &str); 5] {
        [
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
            ("jwk_set_endpoint", &self.jwk_set_endpoint),
            ("token_revocation_endpoint", &self.token_revocation_endpoint),
            (
                "token_introspection_endpoint",
                &self.token_introspection_endpoint,
            ),
        ]
    }
}

/// The issuer and endpoint layout an authentication runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderContext {
    issuer: String,
    settings: ProviderSettings,
}

impl ProviderContext {
    #[must_use]
    pub fn new(issuer: impl Into<String>, settings: ProviderSettings) -> Self {
        Self {
            issuer: issuer.into(),
            settings,
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.issuer.clone(), config.endpoints.clone())
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Absolute URL of the token endpoint, the required assertion audience.
    #[must_use]
    pub fn token_endpoint_url(&self) -> String {
        self.endpoint_url(&self.settings.token_endpoint)
    }

    /// Joins `path` onto the issuer with exactly one `/` between them.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.issuer.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}
