//! Domain types for registered clients and authorizations.

pub mod authorization;
pub mod client;

pub use authorization::{Authorization, AuthorizationRequest, AuthorizationToken, TokenType};
pub use client::{
    ClientAuthenticationMethod, ClientSettings, ClientValidationError, GrantType, JwsAlgorithm,
    RegisteredClient, RegisteredClientBuilder,
};
