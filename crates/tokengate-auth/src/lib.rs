//! # tokengate-auth
//!
//! Token endpoint client authentication for an OAuth 2.0 authorization server.
//!
//! This crate provides:
//! - JWT client assertion authentication (`client_secret_jwt`, `private_key_jwt`)
//! - Claim validation per RFC 7523
//! - PKCE verification for authorization code exchanges
//! - JWK Set retrieval with caching
//!
//! ## Modules
//!
//! - [`config`] - Provider configuration and loading
//! - [`context`] - Issuer and endpoint settings for the current request
//! - [`jose`] - JWT decoding, signature verification and JWK Sets
//! - [`oauth`] - Client authentication, assertion validation and PKCE
//! - [`storage`] - Storage traits for clients and authorizations
//! - [`types`] - Registered clients and authorizations

pub mod config;
pub mod context;
pub mod error;
pub mod jose;
pub mod oauth;
pub mod storage;
pub mod types;

pub use config::{AuthConfig, ConfigError, JwksCacheConfig, StorageConfig};
pub use context::{ProviderContext, ProviderSettings};
pub use error::{AuthError, ErrorCategory, ErrorResponse};
pub use jose::{
    JwkSetSource, Jwt, JwtError, RemoteJwkSetSource, SignatureVerifier,
    SignatureVerifierResolver, StaticJwkSetSource,
};
pub use oauth::{
    AuthenticatedClient, ClientAuthenticationProvider, ClientAuthenticationRequest,
    DelegatingClientAuthenticator, DelegatingGrantConverter, JwtClientAssertionAuthenticator,
    JwtClientAssertionConverter, PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier,
    TokenRequestParameters,
};
pub use storage::{
    AuthorizationRepository, InMemoryAuthorizationRepository, InMemoryRegisteredClientRepository,
    RegisteredClientRepository,
};
pub use types::{
    Authorization, ClientAuthenticationMethod, ClientValidationError, GrantType, JwsAlgorithm,
    RegisteredClient, TokenType,
};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokengate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::context::{ProviderContext, ProviderSettings};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::jose::{JwkSetSource, JwtError, RemoteJwkSetSource, StaticJwkSetSource};
    pub use crate::oauth::{
        AuthenticatedClient, ClientAuthenticationProvider, ClientAuthenticationRequest,
        DelegatingClientAuthenticator, DelegatingGrantConverter, JwtClientAssertionAuthenticator,
        JwtClientAssertionConverter, TokenRequestParameters,
    };
    pub use crate::storage::{AuthorizationRepository, RegisteredClientRepository};
    pub use crate::types::{
        Authorization, ClientAuthenticationMethod, GrantType, JwsAlgorithm, RegisteredClient,
    };
}
