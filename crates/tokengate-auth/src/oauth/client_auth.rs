//! JWT client assertion authentication at the token endpoint.
//!
//! Implements `client_secret_jwt` and `private_key_jwt` (RFC 7523 section
//! 2.2, OpenID Connect Core section 9), followed by the PKCE check for
//! authorization code grants.
//!
//! # Flow
//!
//! 1. Look up the client by `client_id`
//! 2. Check the claimed method is one the client registered
//! 3. Require a non-empty assertion
//! 4. Resolve the signature verifier from the client's registration
//! 5. Verify the assertion and its claims
//! 6. For `authorization_code` grants, verify the PKCE `code_verifier`
//!
//! Every rejection is logged at `debug` with the client_id, the reason and
//! the OAuth error code. Descriptions returned to the caller only name the
//! offending parameter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::AuthResult;
use crate::config::StorageConfig;
use crate::context::ProviderContext;
use crate::error::{AuthError, ErrorCategory};
use crate::jose::{JwkSetSource, Jwt, SignatureVerifierResolver};
use crate::oauth::client_assertion::{ClientAssertionValidator, ExpectedClaims};
use crate::oauth::parameters::{
    AUTHENTICATION_METHOD, CLIENT_ASSERTION, CLIENT_ID, CODE, CODE_VERIFIER, CREDENTIALS,
    GRANT_TYPE,
};
use crate::oauth::pkce;
use crate::storage::{AuthorizationRepository, RegisteredClientRepository};
use crate::types::{ClientAuthenticationMethod, GrantType, RegisteredClient, TokenType};

/// An unauthenticated client presenting credentials at the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAuthenticationRequest {
    /// Client identifier the request claims.
    pub client_id: String,

    /// Authentication method the request claims.
    pub client_authentication_method: ClientAuthenticationMethod,

    /// The serialized client assertion.
    pub credentials: Option<String>,

    /// Remaining token request parameters (`grant_type`, `code`,
    /// `code_verifier`, ...). Unknown keys are ignored.
    pub additional_parameters: HashMap<String, String>,
}

impl ClientAuthenticationRequest {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_authentication_method: ClientAuthenticationMethod,
        credentials: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_authentication_method,
            credentials,
            additional_parameters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_parameters.insert(name.into(), value.into());
        self
    }

    /// Returns an additional parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.additional_parameters.get(name).map(String::as_str)
    }
}

/// Result of successful client authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    /// The authenticated client.
    pub registered_client: RegisteredClient,

    /// The authentication method used.
    pub client_authentication_method: ClientAuthenticationMethod,

    /// The validated assertion.
    pub assertion: Jwt,

    /// The request's additional parameters, passed through.
    pub additional_parameters: HashMap<String, String>,
}

impl AuthenticatedClient {
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.registered_client.client_id
    }

    /// The authenticated principal: the client identifier.
    #[must_use]
    pub fn principal(&self) -> &str {
        self.client_id()
    }

    /// The verified assertion the client authenticated with.
    #[must_use]
    pub fn credentials(&self) -> &Jwt {
        &self.assertion
    }

    /// Always `true`; failed authentication yields an error instead.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        true
    }
}

/// Authenticates `client_secret_jwt` and `private_key_jwt` requests.
pub struct JwtClientAssertionAuthenticator {
    clients: Arc<dyn RegisteredClientRepository>,
    authorizations: Arc<dyn AuthorizationRepository>,
    verifier_resolver: SignatureVerifierResolver,
    validator: ClientAssertionValidator,
    lookup_timeout: Duration,
}

impl JwtClientAssertionAuthenticator {
    #[must_use]
    pub fn new(
        clients: Arc<dyn RegisteredClientRepository>,
        authorizations: Arc<dyn AuthorizationRepository>,
        jwk_set_source: Arc<dyn JwkSetSource>,
    ) -> Self {
        Self {
            clients,
            authorizations,
            verifier_resolver: SignatureVerifierResolver::new(jwk_set_source),
            validator: ClientAssertionValidator::new(),
            lookup_timeout: StorageConfig::default().lookup_timeout,
        }
    }

    /// Sets the upper bound on each repository lookup.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_storage_config(self, config: &StorageConfig) -> Self {
        self.with_lookup_timeout(config.lookup_timeout)
    }

    /// Authenticates a client assertion request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` when the client cannot be
    /// authenticated and `AuthError::InvalidGrant` when the PKCE check fails.
    pub async fn authenticate(
        &self,
        context: &ProviderContext,
        request: &ClientAuthenticationRequest,
    ) -> AuthResult<AuthenticatedClient> {
        let client_id = request.client_id.as_str();
        let method = request.client_authentication_method;

        let client = self
            .bounded("client", self.clients.find_by_client_id(client_id))
            .await
            .map_err(|e| reject_client(client_id, CLIENT_ID, &e.to_string(), e.category()))?
            .ok_or_else(|| {
                reject_client(
                    client_id,
                    CLIENT_ID,
                    "unknown client",
                    ErrorCategory::Authentication,
                )
            })?;

        if !method.is_jwt_assertion() || !client.supports_authentication_method(method) {
            return Err(reject_client(
                client_id,
                AUTHENTICATION_METHOD,
                &format!("{method} is not permitted"),
                ErrorCategory::Authentication,
            ));
        }

        let Some(assertion) = request.credentials.as_deref().filter(|c| !c.is_empty()) else {
            return Err(reject_client(
                client_id,
                CREDENTIALS,
                "empty assertion",
                ErrorCategory::Authentication,
            ));
        };

        let verifier = self
            .verifier_resolver
            .resolve(&client, method)
            .inspect_err(|e| {
                log_rejection(client_id, &e.to_string(), e.oauth_error_code(), e.category());
            })?;

        let expected = ExpectedClaims::client_assertion(client_id, context.token_endpoint_url());
        let jwt = self
            .validator
            .validate(assertion, &expected, &verifier)
            .await
            .map_err(|e| {
                log_rejection(
                    client_id,
                    &e.to_string(),
                    "invalid_client",
                    ErrorCategory::Authentication,
                );
                AuthError::invalid_client_with_source(
                    client_authentication_failed(CLIENT_ASSERTION),
                    e,
                )
            })?;

        if request.parameter(GRANT_TYPE) == Some(GrantType::AuthorizationCode.as_str())
            && let Some(code) = request.parameter(CODE).filter(|c| !c.is_empty())
        {
            self.verify_code_verifier(&client, code, request.parameter(CODE_VERIFIER))
                .await?;
        }

        tracing::info!(client_id, method = %method, "client authenticated");

        Ok(AuthenticatedClient {
            registered_client: client,
            client_authentication_method: method,
            assertion: jwt,
            additional_parameters: request.additional_parameters.clone(),
        })
    }

    async fn verify_code_verifier(
        &self,
        client: &RegisteredClient,
        code: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<()> {
        let client_id = client.client_id.as_str();

        let authorization = self
            .bounded(
                "authorization",
                self.authorizations
                    .find_by_token(code, TokenType::AuthorizationCode),
            )
            .await
            .map_err(|e| {
                log_rejection(client_id, &e.to_string(), "invalid_grant", e.category());
                AuthError::invalid_grant(format!("{CODE}: authorization lookup failed"))
            })?;

        let Some(authorization) = authorization else {
            tracing::debug!(client_id, "no authorization for code, skipping PKCE");
            return Ok(());
        };

        pkce::verify_code_verifier(&authorization, client, code_verifier).map_err(|e| {
            log_rejection(client_id, &e.to_string(), e.oauth_error_code(), e.category());
            AuthError::invalid_grant(e.to_string())
        })
    }

    /// Runs a repository lookup under the configured timeout.
    async fn bounded<T>(
        &self,
        what: &str,
        lookup: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<T> {
        tokio::time::timeout(self.lookup_timeout, lookup)
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::storage(format!(
                    "{what} lookup timed out after {:?}",
                    self.lookup_timeout
                )))
            })
    }
}

fn client_authentication_failed(parameter: &str) -> String {
    format!("Client authentication failed: {parameter}")
}

fn reject_client(
    client_id: &str,
    parameter: &str,
    reason: &str,
    category: ErrorCategory,
) -> AuthError {
    log_rejection(client_id, reason, "invalid_client", category);
    AuthError::invalid_client(client_authentication_failed(parameter))
}

fn log_rejection(client_id: &str, reason: &str, error_code: &str, category: ErrorCategory) {
    tracing::debug!(
        client_id,
        reason,
        error_code,
        category = %category,
        "client assertion authentication rejected"
    );
}
