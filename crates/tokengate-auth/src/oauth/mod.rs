//! OAuth 2.0 token endpoint client authentication.
//!
//! Clients authenticate with a signed JWT assertion (RFC 7523) using either
//! `client_secret_jwt` (HMAC keyed by the client secret) or `private_key_jwt`
//! (asymmetric, verified against the client's JWK Set). Authorization code
//! exchanges additionally verify the PKCE `code_verifier` (RFC 7636).
//!
//! # Flow
//!
//! - [`converter`] - Extracts assertion credentials from token request parameters
//! - [`provider`] - Dispatches by client authentication method
//! - [`client_auth`] - Authenticates the client and checks PKCE
//! - [`client_assertion`] - Validates assertion claims
//! - [`pkce`] - PKCE challenge/verifier implementation
//!
//! # Example
//!
//! ```ignore
//! use tokengate_auth::oauth::{
//!     DelegatingGrantConverter, JwtClientAssertionAuthenticator,
//!     JwtClientAssertionConverter, TokenRequestParameters,
//! };
//!
//! let converter = DelegatingGrantConverter::for_grant_types(
//!     [GrantType::AuthorizationCode],
//!     Arc::new(JwtClientAssertionConverter),
//! )?;
//! let params = TokenRequestParameters::from_form(body);
//! if let Some(request) = converter.convert(&params)? {
//!     let client = authenticator.authenticate(&context, &request).await?;
//! }
//! ```

pub mod client_assertion;
pub mod client_auth;
pub mod converter;
pub mod parameters;
pub mod pkce;
pub mod provider;

pub use client_assertion::{ClientAssertionValidator, ExpectedClaims};
pub use client_auth::{
    AuthenticatedClient, ClientAuthenticationRequest, JwtClientAssertionAuthenticator,
};
pub use converter::{
    AuthenticationConverter, DelegatingGrantConverter, JwtClientAssertionConverter,
    TokenRequestParameters,
};
pub use pkce::{
    PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier, verify_code_verifier,
};
pub use provider::{ClientAuthenticationProvider, DelegatingClientAuthenticator};
