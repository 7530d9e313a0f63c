//! JOSE plumbing for client assertions: decoding, signature verification
//! and JWK Set retrieval.

pub mod jwks;
pub mod jwt;
pub mod verifier;

pub use jwks::{JwkSetSource, RemoteJwkSetSource, StaticJwkSetSource};
pub use jwt::{
    Claim, ClaimViolation, ClaimViolations, ClientAssertionClaims, Jwt, JwtError, StringOrArray,
    peek_client_id, peek_header,
};
pub use verifier::{SignatureVerifier, SignatureVerifierResolver};
