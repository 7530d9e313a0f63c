//! Dispatch of token endpoint authentication by client authentication method.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::context::ProviderContext;
use crate::error::AuthError;
use crate::oauth::client_auth::{
    AuthenticatedClient, ClientAuthenticationRequest, JwtClientAssertionAuthenticator,
};
use crate::oauth::parameters::AUTHENTICATION_METHOD;
use crate::types::ClientAuthenticationMethod;

/// Authenticates clients for one or more authentication methods.
#[async_trait]
pub trait ClientAuthenticationProvider: Send + Sync {
    /// Methods this provider handles.
    fn supported_methods(&self) -> &[ClientAuthenticationMethod];

    fn supports(&self, method: ClientAuthenticationMethod) -> bool {
        self.supported_methods().contains(&method)
    }

    /// Authenticates the request.
    ///
    /// # Errors
    ///
    /// Returns an OAuth error describing why authentication failed.
    async fn authenticate(
        &self,
        context: &ProviderContext,
        request: &ClientAuthenticationRequest,
    ) -> AuthResult<AuthenticatedClient>;
}

#[async_trait]
impl ClientAuthenticationProvider for JwtClientAssertionAuthenticator {
    fn supported_methods(&self) -> &[ClientAuthenticationMethod] {
        &[
            ClientAuthenticationMethod::ClientSecretJwt,
            ClientAuthenticationMethod::PrivateKeyJwt,
        ]
    }

    async fn authenticate(
        &self,
        context: &ProviderContext,
        request: &ClientAuthenticationRequest,
    ) -> AuthResult<AuthenticatedClient> {
        JwtClientAssertionAuthenticator::authenticate(self, context, request).await
    }
}

/// Routes each request to the provider registered for its method.
#[derive(Default)]
pub struct DelegatingClientAuthenticator {
    providers: HashMap<ClientAuthenticationMethod, Arc<dyn ClientAuthenticationProvider>>,
}

impl DelegatingClientAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` for every method it supports, replacing any
    /// provider previously registered for those methods.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ClientAuthenticationProvider>) -> Self {
        for method in provider.supported_methods() {
            self.providers.insert(*method, Arc::clone(&provider));
        }
        self
    }

    #[must_use]
    pub fn supports(&self, method: ClientAuthenticationMethod) -> bool {
        self.providers.contains_key(&method)
    }

    /// Authenticates `request` with the provider for its method.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` if no provider handles the method,
    /// otherwise whatever the provider returns.
    pub async fn authenticate(
        &self,
        context: &ProviderContext,
        request: &ClientAuthenticationRequest,
    ) -> AuthResult<AuthenticatedClient> {
        let method = request.client_authentication_method;
        let Some(provider) = self.providers.get(&method) else {
            tracing::debug!(
                client_id = %request.client_id,
                method = %method,
                "no authentication provider for method"
            );
            return Err(AuthError::invalid_client(format!(
                "Client authentication failed: {AUTHENTICATION_METHOD}"
            )));
        };
        provider.authenticate(context, request).await
    }
}
