//! Signature verifier selection for client assertions.
//!
//! The [`SignatureVerifierResolver`] looks at a client's registration and
//! the authentication method it is using, and produces the
//! [`SignatureVerifier`] its assertion must verify under:
//!
//! | Method              | Registered algorithm | Key material            |
//! |---------------------|----------------------|-------------------------|
//! | `private_key_jwt`   | RS*, ES*, PS*, EdDSA | JWK Set at `jwk_set_url` |
//! | `client_secret_jwt` | HS256/384/512        | client secret bytes      |
//!
//! Any other combination is a registration error and yields `invalid_client`.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{DecodingKey, TokenData, Validation};

use super::jwks::JwkSetSource;
use super::jwt::{ClientAssertionClaims, JwtError};
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::{ClientAuthenticationMethod, JwsAlgorithm, RegisteredClient};

/// Verifies the signature of a client assertion under one algorithm.
#[derive(Clone)]
pub enum SignatureVerifier {
    /// HMAC verification with the client secret.
    Mac {
        algorithm: JwsAlgorithm,
        key: DecodingKey,
    },
    /// Asymmetric verification with a key from the client's JWK Set.
    JwkSet {
        algorithm: JwsAlgorithm,
        jwk_set_url: String,
        source: Arc<dyn JwkSetSource>,
    },
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mac { algorithm, .. } => f
                .debug_struct("Mac")
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
            Self::JwkSet {
                algorithm,
                jwk_set_url,
                ..
            } => f
                .debug_struct("JwkSet")
                .field("algorithm", algorithm)
                .field("jwk_set_url", jwk_set_url)
                .finish_non_exhaustive(),
        }
    }
}

impl SignatureVerifier {
    /// The only algorithm this verifier accepts.
    #[must_use]
    pub fn algorithm(&self) -> JwsAlgorithm {
        match self {
            Self::Mac { algorithm, .. } | Self::JwkSet { algorithm, .. } => *algorithm,
        }
    }

    /// Decodes `token` and verifies its signature. Claims are not checked.
    ///
    /// # Errors
    ///
    /// Returns a [`JwtError`] if the token is malformed, uses another
    /// algorithm, the key cannot be obtained, or the signature is invalid.
    pub async fn verify(
        &self,
        token: &str,
    ) -> Result<TokenData<ClientAssertionClaims>, JwtError> {
        let validation = signature_only(self.algorithm());

        match self {
            Self::Mac { key, .. } => {
                jsonwebtoken::decode(token, key, &validation).map_err(JwtError::from)
            }
            Self::JwkSet {
                algorithm,
                jwk_set_url,
                source,
            } => {
                let header = jsonwebtoken::decode_header(token)?;
                let kid = header.kid.as_deref();
                let jwks = source
                    .jwk_set(jwk_set_url)
                    .await
                    .map_err(|e| JwtError::key_not_found(e.description().to_string()))?;

                let jwk = match find_key(&jwks, kid, *algorithm) {
                    Some(jwk) => jwk.clone(),
                    None => {
                        // The client may have rotated keys since the set was cached.
                        let refreshed = source
                            .refresh(jwk_set_url)
                            .await
                            .map_err(|e| JwtError::key_not_found(e.description().to_string()))?;
                        find_key(&refreshed, kid, *algorithm)
                            .cloned()
                            .ok_or_else(|| key_missing(kid, *algorithm, jwk_set_url))?
                    }
                };
                let key = DecodingKey::from_jwk(&jwk)
                    .map_err(|e| JwtError::invalid_key(format!("Invalid JWK: {e}")))?;

                jsonwebtoken::decode(token, &key, &validation).map_err(JwtError::from)
            }
        }
    }
}

/// Validation that checks only the algorithm and signature.
///
/// Registered claims are checked afterwards, all at once, so that every
/// violation is reported rather than the first one jsonwebtoken hits.
fn signature_only(algorithm: JwsAlgorithm) -> Validation {
    let mut validation = Validation::new(algorithm.to_jwt_algorithm());
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

fn key_missing(kid: Option<&str>, algorithm: JwsAlgorithm, jwk_set_url: &str) -> JwtError {
    match kid {
        Some(kid) => {
            JwtError::key_not_found(format!("Key '{kid}' not found in JWK Set at {jwk_set_url}"))
        }
        None => JwtError::key_not_found(format!(
            "No {algorithm} signing key in JWK Set at {jwk_set_url}"
        )),
    }
}

/// Finds a signing key in a JWK Set by kid and algorithm.
fn find_key<'a>(jwks: &'a JwkSet, kid: Option<&str>, algorithm: JwsAlgorithm) -> Option<&'a Jwk> {
    jwks.keys.iter().find(|key| {
        if let Some(expected_kid) = kid
            && key.common.key_id.as_deref() != Some(expected_kid)
        {
            return false;
        }

        if let Some(ref key_alg) = key.common.key_algorithm
            && key_alg.to_string() != algorithm.as_str()
        {
            return false;
        }

        // Key use must be "sig" or unspecified.
        if let Some(ref use_) = key.common.public_key_use
            && *use_ != PublicKeyUse::Signature
        {
            return false;
        }

        true
    })
}

/// Chooses the verifier a client's assertion must satisfy.
#[derive(Clone)]
pub struct SignatureVerifierResolver {
    jwk_set_source: Arc<dyn JwkSetSource>,
}

impl SignatureVerifierResolver {
    #[must_use]
    pub fn new(jwk_set_source: Arc<dyn JwkSetSource>) -> Self {
        Self { jwk_set_source }
    }

    /// Resolves the verifier for `client` authenticating with `method`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClient` naming the missing piece of
    /// registration (JWK Set URL, client secret, or a usable algorithm).
    pub fn resolve(
        &self,
        client: &RegisteredClient,
        method: ClientAuthenticationMethod,
    ) -> AuthResult<SignatureVerifier> {
        let algorithm = client
            .client_settings
            .token_endpoint_authentication_signing_algorithm;

        match (method, algorithm) {
            (ClientAuthenticationMethod::PrivateKeyJwt, Some(alg)) if alg.is_signature() => {
                let jwk_set_url = client
                    .client_settings
                    .jwk_set_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| missing_verifier(client, "the JWK Set URL"))?;

                Ok(SignatureVerifier::JwkSet {
                    algorithm: alg,
                    jwk_set_url: jwk_set_url.to_string(),
                    source: Arc::clone(&self.jwk_set_source),
                })
            }
            (ClientAuthenticationMethod::ClientSecretJwt, Some(alg)) if alg.is_mac() => {
                let secret = client
                    .secret()
                    .ok_or_else(|| missing_verifier(client, "the client secret"))?;

                Ok(SignatureVerifier::Mac {
                    algorithm: alg,
                    key: DecodingKey::from_secret(secret.as_bytes()),
                })
            }
            _ => {
                let alg = algorithm.map_or("null", |a| a.as_str());
                Err(missing_verifier(
                    client,
                    &format!("a valid JWS Algorithm: '{alg}'"),
                ))
            }
        }
    }
}

fn missing_verifier(client: &RegisteredClient, what: &str) -> AuthError {
    AuthError::invalid_client(format!(
        "Failed to find a Signature Verifier for Client: '{}'. Check to ensure you have configured {what}.",
        client.id
    ))
}
