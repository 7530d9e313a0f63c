//! Registered client domain types.
//!
//! A [`RegisteredClient`] is the server-side record of an OAuth 2.0 client:
//! its identifiers, the authentication methods and grant types it may use,
//! and the [`ClientSettings`] that drive assertion verification and PKCE.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Client Credentials flow.
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Parses a grant_type parameter value. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "authorization_code" => Some(Self::AuthorizationCode),
            "client_credentials" => Some(Self::ClientCredentials),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client Authentication Method
// =============================================================================

/// Token endpoint client authentication methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthenticationMethod {
    /// HTTP Basic authentication with client_id and client_secret.
    ClientSecretBasic,
    /// client_id and client_secret in the request body.
    ClientSecretPost,
    /// JWT assertion signed with the client secret (HMAC).
    ClientSecretJwt,
    /// JWT assertion signed with the client's private key.
    PrivateKeyJwt,
    /// Public client, no authentication.
    None,
}

impl ClientAuthenticationMethod {
    /// Returns the method name as used in client metadata.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::None => "none",
        }
    }

    /// Returns `true` for the two methods that authenticate with a JWT assertion.
    #[must_use]
    pub fn is_jwt_assertion(&self) -> bool {
        matches!(self, Self::ClientSecretJwt | Self::PrivateKeyJwt)
    }
}

impl fmt::Display for ClientAuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// JWS Algorithm
// =============================================================================

/// JWS signing algorithms a client may register for token endpoint assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JwsAlgorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
    PS256,
    PS384,
    PS512,
    EdDSA,
}

impl JwsAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::RS512 => Algorithm::RS512,
            Self::ES256 => Algorithm::ES256,
            Self::ES384 => Algorithm::ES384,
            Self::PS256 => Algorithm::PS256,
            Self::PS384 => Algorithm::PS384,
            Self::PS512 => Algorithm::PS512,
            Self::EdDSA => Algorithm::EdDSA,
        }
    }

    /// Returns the algorithm name as used in JWK/JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::EdDSA => "EdDSA",
        }
    }

    /// Returns `true` if this is an HMAC (shared-secret) algorithm.
    #[must_use]
    pub fn is_mac(&self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// Returns `true` if this is an asymmetric signature algorithm.
    #[must_use]
    pub fn is_signature(&self) -> bool {
        !self.is_mac()
    }
}

impl From<JwsAlgorithm> for Algorithm {
    fn from(alg: JwsAlgorithm) -> Self {
        alg.to_jwt_algorithm()
    }
}

impl FromStr for JwsAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "ES256" => Ok(Self::ES256),
            "ES384" => Ok(Self::ES384),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            "EdDSA" => Ok(Self::EdDSA),
            other => Err(format!("Unknown JWS algorithm: {other}")),
        }
    }
}

impl fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Client Settings
// =============================================================================

/// Per-client settings consulted during token endpoint authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Algorithm the client signs its assertions with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_authentication_signing_algorithm: Option<JwsAlgorithm>,

    /// Where the client publishes its public keys (`private_key_jwt`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk_set_url: Option<String>,

    /// Whether an authorization code grant must carry a PKCE challenge.
    pub require_proof_key: bool,
}

// =============================================================================
// Registered Client
// =============================================================================

/// A client registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredClient {
    /// Server-assigned unique id (distinct from `client_id`).
    pub id: String,

    /// Identifier the client presents in OAuth requests.
    pub client_id: String,

    /// Shared secret, used as the HMAC key for `client_secret_jwt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Authentication methods this client may use at the token endpoint.
    pub client_authentication_methods: Vec<ClientAuthenticationMethod>,

    /// Grant types this client may use.
    #[serde(default)]
    pub authorization_grant_types: Vec<GrantType>,

    #[serde(default)]
    pub client_settings: ClientSettings,
}

impl RegisteredClient {
    /// Starts building a client with a freshly generated id.
    #[must_use]
    pub fn builder(client_id: impl Into<String>) -> RegisteredClientBuilder {
        RegisteredClientBuilder::new(client_id)
    }

    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.id.is_empty() {
            return Err(ClientValidationError::EmptyId);
        }

        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.client_authentication_methods.is_empty() {
            return Err(ClientValidationError::NoAuthenticationMethods);
        }

        if let Some(url) = &self.client_settings.jwk_set_url
            && url::Url::parse(url).is_err()
        {
            return Err(ClientValidationError::InvalidJwkSetUrl(url.clone()));
        }

        Ok(())
    }

    /// Checks if the given authentication method is permitted for this client.
    #[must_use]
    pub fn supports_authentication_method(&self, method: ClientAuthenticationMethod) -> bool {
        self.client_authentication_methods.contains(&method)
    }

    /// Returns the non-empty client secret, if one is registered.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.client_secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// Builder for [`RegisteredClient`].
#[derive(Debug, Clone)]
pub struct RegisteredClientBuilder {
    client: RegisteredClient,
}

impl RegisteredClientBuilder {
    fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: RegisteredClient {
                id: uuid::Uuid::new_v4().to_string(),
                client_id: client_id.into(),
                client_secret: None,
                client_name: None,
                client_authentication_methods: Vec::new(),
                authorization_grant_types: Vec::new(),
                client_settings: ClientSettings::default(),
            },
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.client.id = id.into();
        self
    }

    #[must_use]
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client.client_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client.client_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn authentication_method(mut self, method: ClientAuthenticationMethod) -> Self {
        if !self.client.client_authentication_methods.contains(&method) {
            self.client.client_authentication_methods.push(method);
        }
        self
    }

    #[must_use]
    pub fn grant_type(mut self, grant_type: GrantType) -> Self {
        if !self.client.authorization_grant_types.contains(&grant_type) {
            self.client.authorization_grant_types.push(grant_type);
        }
        self
    }

    #[must_use]
    pub fn signing_algorithm(mut self, algorithm: JwsAlgorithm) -> Self {
        self.client
            .client_settings
            .token_endpoint_authentication_signing_algorithm = Some(algorithm);
        self
    }

    #[must_use]
    pub fn jwk_set_url(mut self, url: impl Into<String>) -> Self {
        self.client.client_settings.jwk_set_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn require_proof_key(mut self, required: bool) -> Self {
        self.client.client_settings.require_proof_key = required;
        self
    }

    #[must_use]
    pub fn build(self) -> RegisteredClient {
        self.client
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Registration id cannot be empty.
    #[error("Client registration id cannot be empty")]
    EmptyId,

    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// At least one authentication method is required.
    #[error("At least one client authentication method is required")]
    NoAuthenticationMethods,

    /// The JWK Set URL is not a valid URL.
    #[error("Invalid JWK Set URL: {0}")]
    InvalidJwkSetUrl(String),
}

// =============================================================================
// Tests
// =============================================================================
