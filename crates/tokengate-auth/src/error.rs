//! Authentication error types.
//!
//! Every rejected authentication attempt is reported as an [`AuthError`]
//! carrying an OAuth 2.0 error code, a human-readable description and,
//! where one exists, the underlying cause.

use std::fmt;

use serde::Serialize;

use crate::jose::JwtError;

/// Errors that can occur while authenticating a client at the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Client authentication failed (unknown client, disallowed method,
    /// missing credentials, unusable key material or a rejected assertion).
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
        /// The assertion decoding or validation failure, when there is one.
        #[source]
        source: Option<Box<JwtError>>,
    },

    /// The authorization grant is invalid (PKCE binding failed).
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// A repository or key-set lookup failed or timed out.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error without a cause.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `InvalidClient` error wrapping a JWT failure.
    #[must_use]
    pub fn invalid_client_with_source(message: impl Into<String>, source: JwtError) -> Self {
        Self::InvalidClient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the human-readable description (the `error_description` value).
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::InvalidClient { message, .. }
            | Self::InvalidGrant { message }
            | Self::InvalidRequest { message }
            | Self::Storage { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message,
        }
    }

    /// Returns the wrapped JWT failure, if this error carries one.
    #[must_use]
    pub fn jwt_error(&self) -> Option<&JwtError> {
        match self {
            Self::InvalidClient {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidClient { .. } | Self::InvalidGrant { .. } | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClient { .. } | Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }

    /// Renders the RFC 6749 section 5.2 error response body.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.oauth_error_code(),
            error_description: Some(self.description().to_string()),
        }
    }
}

/// OAuth 2.0 error response body.
///
/// ```json
/// {
///   "error": "invalid_client",
///   "error_description": "Client authentication failed: client_assertion"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// OAuth 2.0 error code.
    pub error: &'static str,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client or grant authentication failures.
    Authentication,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_client("Client authentication failed: client_id");
        assert_eq!(
            err.to_string(),
            "Invalid client: Client authentication failed: client_id"
        );

        let err = AuthError::invalid_grant("invalid code_verifier");
        assert_eq!(err.to_string(), "Invalid grant: invalid code_verifier");
    }

    #[test]
    fn test_description_is_unprefixed() {
        let err = AuthError::invalid_client("Client authentication failed: credentials");
        assert_eq!(err.description(), "Client authentication failed: credentials");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = AuthError::invalid_client_with_source(
            "Client authentication failed: client_assertion",
            JwtError::InvalidSignature,
        );
        assert!(matches!(err.jwt_error(), Some(JwtError::InvalidSignature)));
        assert!(err.source().is_some());

        let err = AuthError::invalid_client("no cause");
        assert!(err.jwt_error().is_none());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_classification() {
        let cases = [
            (
                AuthError::invalid_client("client_id"),
                "invalid_client",
                ErrorCategory::Authentication,
                false,
            ),
            (
                AuthError::invalid_grant("code_verifier"),
                "invalid_grant",
                ErrorCategory::Authentication,
                false,
            ),
            (
                AuthError::invalid_request("client_assertion_type"),
                "invalid_request",
                ErrorCategory::Validation,
                false,
            ),
            (
                AuthError::storage("client lookup timed out"),
                "server_error",
                ErrorCategory::Infrastructure,
                true,
            ),
            (
                AuthError::configuration("converters cannot be empty"),
                "server_error",
                ErrorCategory::Configuration,
                true,
            ),
            (
                AuthError::internal("http client"),
                "server_error",
                ErrorCategory::Internal,
                true,
            ),
        ];

        for (err, code, category, server_side) in cases {
            assert_eq!(err.oauth_error_code(), code, "{err}");
            assert_eq!(err.category(), category, "{err}");
            assert_eq!(err.is_server_error(), server_side, "{err}");
            assert_eq!(err.is_client_error(), !server_side, "{err}");
        }
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }

    #[test]
    fn test_error_response_body() {
        let body = AuthError::invalid_grant("code_verifier missing").to_error_response();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "invalid_grant");
        assert_eq!(json["error_description"], "code_verifier missing");
    }
}
