//! Decoded client assertions and the errors produced while decoding them.
//!
//! A [`Jwt`] is only ever produced by
//! [`ClientAssertionValidator`](crate::oauth::ClientAssertionValidator) after
//! both the signature and the claims have been checked. The `peek_*`
//! helpers read the token without verification and must only be used to
//! route a request (pick a client or a key).

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while decoding or validating a client assertion.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// The token is not a well-formed compact JWS.
    #[error("Malformed JWT: {message}")]
    Malformed {
        /// Description of the decoding error.
        message: String,
    },

    /// The token signature does not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The header algorithm does not match the one the client registered.
    #[error("Algorithm not accepted: {message}")]
    InvalidAlgorithm {
        /// Description of the mismatch.
        message: String,
    },

    /// No usable verification key could be obtained.
    #[error("Key not found: {message}")]
    KeyNotFound {
        /// Description of the lookup failure.
        message: String,
    },

    /// Key material exists but cannot be used for verification.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },

    /// The signature verified but one or more claims were rejected.
    #[error("Invalid claims: {0}")]
    Validation(ClaimViolations),
}

impl JwtError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidAlgorithm` error.
    #[must_use]
    pub fn invalid_algorithm(message: impl Into<String>) -> Self {
        Self::InvalidAlgorithm {
            message: message.into(),
        }
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(message: impl Into<String>) -> Self {
        Self::KeyNotFound {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` for decode/signature failures, `false` for claim failures.
    #[must_use]
    pub fn is_bad_jwt(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }

    /// Returns the collected claim violations, if this is a validation failure.
    #[must_use]
    pub fn violations(&self) -> Option<&ClaimViolations> {
        match self {
            Self::Validation(violations) => Some(violations),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::invalid_algorithm(err.to_string()),
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Claim Violations
// ============================================================================

/// Registered claims checked on a client assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Claim {
    Iss,
    Sub,
    Aud,
    Exp,
    Nbf,
    Iat,
}

impl Claim {
    /// Returns the claim name as it appears in the JWT payload.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iss => "iss",
            Self::Sub => "sub",
            Self::Aud => "aud",
            Self::Exp => "exp",
            Self::Nbf => "nbf",
            Self::Iat => "iat",
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimViolation {
    pub claim: Claim,
    pub reason: String,
}

impl ClaimViolation {
    #[must_use]
    pub fn new(claim: Claim, reason: impl Into<String>) -> Self {
        Self {
            claim,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ClaimViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.claim, self.reason)
    }
}

/// Every claim violation found in one assertion, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimViolations(Vec<ClaimViolation>);

impl ClaimViolations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: ClaimViolation) {
        self.0.push(violation);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if any violation concerns `claim`.
    #[must_use]
    pub fn contains(&self, claim: Claim) -> bool {
        self.0.iter().any(|v| v.claim == claim)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClaimViolation> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ClaimViolation> {
        self.0
    }
}

impl fmt::Display for ClaimViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by a client assertion (RFC 7523 section 3).
///
/// All registered claims are optional at the decoding stage so that a
/// payload missing several of them yields one violation per claim instead
/// of a single deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAssertionClaims {
    /// Issuer, must be the client_id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject, must be the client_id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience, must contain the token endpoint URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<StringOrArray>,

    /// Expiration time as Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not-before time as Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued-at time as Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// JWT ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Audience claim can be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    /// Single string audience.
    String(String),
    /// Array of audience strings.
    Array(Vec<String>),
}

impl StringOrArray {
    /// Checks if the audience contains the specified value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::String(s) => s == value,
            Self::Array(arr) => arr.iter().any(|s| s == value),
        }
    }

    /// Returns the first audience value.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Array(arr) => arr.first().map(String::as_str),
        }
    }
}

// ============================================================================
// Validated Token
// ============================================================================

/// A client assertion whose signature and claims have been validated.
#[derive(Debug, Clone)]
pub struct Jwt {
    token_value: String,
    header: Header,
    claims: ClientAssertionClaims,
    issued_at: Option<OffsetDateTime>,
    expires_at: OffsetDateTime,
}

impl Jwt {
    pub(crate) fn new(
        token_value: impl Into<String>,
        header: Header,
        claims: ClientAssertionClaims,
        issued_at: Option<OffsetDateTime>,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            token_value: token_value.into(),
            header,
            claims,
            issued_at,
            expires_at,
        }
    }

    /// The compact serialization the client sent.
    #[must_use]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    #[must_use]
    pub fn claims(&self) -> &ClientAssertionClaims {
        &self.claims
    }

    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}

// ============================================================================
// Unverified Inspection
// ============================================================================

/// Decodes the JOSE header without verifying the signature.
///
/// # Errors
///
/// Returns `JwtError::Malformed` if the header cannot be decoded.
pub fn peek_header(token: &str) -> Result<Header, JwtError> {
    jsonwebtoken::decode_header(token).map_err(JwtError::from)
}

/// Extracts the client identifier from an unverified assertion.
///
/// Prefers `iss`, falling back to `sub`. This does NOT verify the
/// signature; only use it to decide which client to look up.
///
/// # Errors
///
/// Returns `JwtError::Malformed` if the payload cannot be decoded or
/// carries neither claim.
pub fn peek_client_id(token: &str) -> Result<String, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::malformed("Invalid JWT format"));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| JwtError::malformed("Invalid JWT payload encoding"))?;

    #[derive(Deserialize)]
    struct MinimalClaims {
        #[serde(default)]
        iss: Option<String>,
        #[serde(default)]
        sub: Option<String>,
    }

    let claims: MinimalClaims = serde_json::from_slice(&payload)
        .map_err(|_| JwtError::malformed("Invalid JWT payload JSON"))?;

    claims
        .iss
        .or(claims.sub)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| JwtError::malformed("JWT missing iss and sub claims"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_string_or_array_contains() {
        let aud = StringOrArray::String("https://example.com/token".to_string());
        assert!(aud.contains("https://example.com/token"));
        assert!(!aud.contains("https://other.com/token"));

        let aud = StringOrArray::Array(vec![
            "https://example.com/token".to_string(),
            "https://example.com/other".to_string(),
        ]);
        assert!(aud.contains("https://example.com/other"));
        assert_eq!(aud.first(), Some("https://example.com/token"));
        assert_eq!(StringOrArray::Array(vec![]).first(), None);
    }

    #[test]
    fn test_claims_tolerate_missing_fields() {
        let claims: ClientAssertionClaims = serde_json::from_str("{}").unwrap();
        assert_eq!(claims, ClientAssertionClaims::default());

        let claims: ClientAssertionClaims =
            serde_json::from_str(r#"{"iss":"c","aud":["a","b"],"exp":10}"#).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("c"));
        assert_eq!(claims.exp, Some(10));
        assert!(claims.aud.unwrap().contains("b"));
    }

    #[test]
    fn test_violations_display_and_lookup() {
        let mut violations = ClaimViolations::new();
        violations.push(ClaimViolation::new(Claim::Iss, "missing"));
        violations.push(ClaimViolation::new(Claim::Exp, "expired"));

        assert_eq!(violations.len(), 2);
        assert!(violations.contains(Claim::Exp));
        assert!(!violations.contains(Claim::Aud));
        assert_eq!(violations.to_string(), "iss: missing; exp: expired");

        let err = JwtError::Validation(violations);
        assert!(!err.is_bad_jwt());
        assert_eq!(err.violations().map(ClaimViolations::len), Some(2));
        assert!(JwtError::InvalidSignature.is_bad_jwt());
    }

    #[test]
    fn test_peek_client_id_prefers_iss() {
        let token = unsigned(r#"{"alg":"HS256"}"#, r#"{"iss":"client-a","sub":"client-b"}"#);
        assert_eq!(peek_client_id(&token).unwrap(), "client-a");

        let token = unsigned(r#"{"alg":"HS256"}"#, r#"{"sub":"client-b"}"#);
        assert_eq!(peek_client_id(&token).unwrap(), "client-b");
    }

    #[test]
    fn test_peek_client_id_rejects_garbage() {
        assert!(matches!(
            peek_client_id("not-a-jwt"),
            Err(JwtError::Malformed { .. })
        ));

        let token = unsigned(r#"{"alg":"HS256"}"#, r#"{"aud":"x"}"#);
        assert!(peek_client_id(&token).is_err());
    }

    #[test]
    fn test_peek_header() {
        let token = unsigned(r#"{"alg":"ES384","kid":"key-1"}"#, "{}");
        let header = peek_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::ES384);
        assert_eq!(header.kid.as_deref(), Some("key-1"));

        assert!(peek_header("garbage").is_err());
    }
}
