//! Token endpoint authentication configuration.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! `TOKENGATE__`-prefixed environment variables (see [`loader`]).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ProviderSettings;

/// Root configuration.
///
/// # Example (TOML)
///
/// ```toml
/// issuer = "https://auth-server.com"
///
/// [endpoints]
/// token_endpoint = "/oauth2/token"
///
/// [jwks]
/// ttl = "1h"
/// request_timeout = "10s"
///
/// [storage]
/// lookup_timeout = "5s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Authorization server issuer URL.
    /// Assertion audiences are checked against this plus the token endpoint path.
    pub issuer: String,

    /// Endpoint paths relative to the issuer.
    pub endpoints: ProviderSettings,

    /// Remote JWK Set fetching and caching.
    pub jwks: JwksCacheConfig,

    /// Repository access.
    pub storage: StorageConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:9000".to_string(),
            endpoints: ProviderSettings::default(),
            jwks: JwksCacheConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Configuration for fetching and caching client JWK Sets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwksCacheConfig {
    /// Time-to-live for cached JWK Sets.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// HTTP request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum response size in bytes.
    pub max_response_size: usize,

    /// Reject `jwk_set_url` values that are not `https://`.
    pub require_https: bool,
}

impl Default for JwksCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024,
            require_https: true,
        }
    }
}

impl JwksCacheConfig {
    /// Sets the cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the maximum response size.
    #[must_use]
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    #[must_use]
    pub fn with_require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }
}

/// Repository access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Upper bound on a single client or authorization lookup.
    #[serde(with = "humantime_serde")]
    pub lookup_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the issuer is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - The issuer is not an absolute http(s) URL
    /// - An endpoint path does not start with `/`
    /// - A timeout or size limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Missing("issuer".to_string()));
        }

        let issuer = url::Url::parse(&self.issuer)
            .map_err(|e| ConfigError::InvalidValue(format!("issuer '{}': {e}", self.issuer)))?;
        if !matches!(issuer.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "issuer must use http or https, got '{}'",
                issuer.scheme()
            )));
        }

        for (name, path) in self.endpoints.paths() {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "endpoints.{name} must start with '/', got '{path}'"
                )));
            }
        }

        if self.jwks.ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "jwks.ttl must be greater than 0".to_string(),
            ));
        }
        if self.jwks.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "jwks.request_timeout must be greater than 0".to_string(),
            ));
        }
        if self.jwks.max_response_size == 0 {
            return Err(ConfigError::InvalidValue(
                "jwks.max_response_size must be greater than 0".to_string(),
            ));
        }
        if self.storage.lookup_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "storage.lookup_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

pub mod loader {
    use std::path::{Path, PathBuf};

    use config::{Config, Environment, File};

    use super::{AuthConfig, ConfigError};

    /// File read when no explicit path is given.
    pub const DEFAULT_CONFIG_FILE: &str = "tokengate.toml";

    /// Loads configuration from `path` (or `tokengate.toml` if present),
    /// applies `TOKENGATE__*` environment overrides and validates the result.
    ///
    /// Environment keys use `__` as the section separator, e.g.
    /// `TOKENGATE__STORAGE__LOOKUP_TIMEOUT=2s`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, the sources
    /// cannot be merged, or the merged configuration is invalid.
    pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::Load(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("TOKENGATE")
                .try_parsing(true)
                .separator("__"),
        );

        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?;
        let merged: AuthConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;

        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.issuer, "http://localhost:9000");
        assert_eq!(config.endpoints.token_endpoint, "/oauth2/token");
        assert_eq!(config.jwks.ttl, Duration::from_secs(3600));
        assert!(config.jwks.require_https);
        assert_eq!(config.storage.lookup_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_issuer_fails_validation() {
        let config = AuthConfig {
            issuer: String::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_non_http_issuer_fails_validation() {
        let config = AuthConfig {
            issuer: "ftp://auth-server.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_relative_endpoint_fails_validation() {
        let mut config = AuthConfig::default();
        config.endpoints.token_endpoint = "oauth2/token".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("token_endpoint"));
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let mut config = AuthConfig::default();
        config.storage.lookup_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lookup_timeout"));
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let toml = r#"
            issuer = "https://auth-server.com"

            [jwks]
            ttl = "30m"
            request_timeout = "2s"

            [storage]
            lookup_timeout = "250ms"
        "#;

        let config: AuthConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.issuer, "https://auth-server.com");
        assert_eq!(config.jwks.ttl, Duration::from_secs(1800));
        assert_eq!(config.jwks.request_timeout, Duration::from_secs(2));
        assert_eq!(config.storage.lookup_timeout, Duration::from_millis(250));
        // Untouched sections fall back to defaults.
        assert_eq!(config.endpoints.token_endpoint, "/oauth2/token");
        assert_eq!(config.jwks.max_response_size, 1024 * 1024);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "issuer = \"https://auth-server.com\"\n[endpoints]\ntoken_endpoint = \"/token\""
        )
        .unwrap();

        let config = loader::load_config(Some(file.path())).unwrap();
        assert_eq!(config.issuer, "https://auth-server.com");
        assert_eq!(config.endpoints.token_endpoint, "/token");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = loader::load_config(Some(std::path::Path::new("/nonexistent/tokengate.toml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "issuer = \"\"").unwrap();

        let err = loader::load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }
}
