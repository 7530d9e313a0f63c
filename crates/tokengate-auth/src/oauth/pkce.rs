//! PKCE (Proof Key for Code Exchange) per RFC 7636.
//!
//! Both `S256` and `plain` challenges are honored. A stored challenge
//! without a method is treated as `plain`.
//!
//! # Example
//!
//! ```
//! use tokengate_auth::oauth::{PkceChallenge, PkceChallengeMethod, PkceVerifier};
//!
//! // At the authorization endpoint the client sends only the challenge.
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier);
//!
//! // Server later checks the verifier sent with the token request
//! assert!(challenge.verify(PkceChallengeMethod::S256, verifier.as_str()).is_ok());
//! ```

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::ErrorCategory;
use crate::types::{Authorization, RegisteredClient};

// =============================================================================
// Error Types
// =============================================================================

/// Why a token request failed the PKCE check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PkceError {
    /// The authorization has a challenge but no verifier was sent.
    #[error("code_verifier missing")]
    MissingVerifier,

    /// The verifier does not match the stored challenge.
    #[error("invalid code_verifier")]
    VerificationFailed,

    /// The client requires PKCE but the authorization has no challenge.
    #[error("code_challenge required")]
    ChallengeRequired,

    /// The stored challenge method is not `S256` or `plain`.
    #[error("unsupported code_challenge_method: {0}")]
    UnsupportedMethod(String),

    #[error("code_verifier must be 43 to 128 characters, got {0}")]
    InvalidVerifierLength(usize),

    #[error("code_verifier may only contain unreserved characters")]
    InvalidVerifierCharacters,
}

impl PkceError {
    #[must_use]
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod(method.into())
    }

    /// Returns `true` if this is a verifier format error.
    #[must_use]
    pub fn is_verifier_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVerifierLength(_) | Self::InvalidVerifierCharacters
        )
    }

    /// Failures binding a token request to its authorization are
    /// `invalid_grant`; malformed verifiers are `invalid_request`.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::MissingVerifier
            | Self::VerificationFailed
            | Self::ChallengeRequired
            | Self::UnsupportedMethod(_) => "invalid_grant",
            Self::InvalidVerifierLength(_) | Self::InvalidVerifierCharacters => "invalid_request",
        }
    }

    /// Malformed verifiers are request validation problems; everything else
    /// means the request does not match its authorization.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.is_verifier_error() {
            ErrorCategory::Validation
        } else {
            ErrorCategory::Authentication
        }
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// `code_challenge_method` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    /// `BASE64URL(SHA256(ASCII(code_verifier)))`.
    S256,
    /// The challenge is the verifier itself.
    #[default]
    Plain,
}

impl PkceChallengeMethod {
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything but `S256` or `plain`.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(PkceError::unsupported_method(other)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// PKCE code verifier.
///
/// A high-entropy random string of 43 to 128 unreserved characters
/// (`[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`, RFC 7636 section 4.1).
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// # Errors
    ///
    /// Returns a format error for a bad length or a reserved character.
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        match verifier.len() {
            VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN => {}
            len => return Err(PkceError::InvalidVerifierLength(len)),
        }
        if !verifier.bytes().all(is_unreserved) {
            return Err(PkceError::InvalidVerifierCharacters);
        }
        Ok(Self(verifier))
    }

    /// A fresh verifier: 32 random bytes, base64url encoded (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut entropy = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        Self(URL_SAFE_NO_PAD.encode(entropy))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

const VERIFIER_MIN_LEN: usize = 43;
const VERIFIER_MAX_LEN: usize = 128;

// unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge as stored with an authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Create an S256 challenge from a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self(s256(verifier.as_str()))
    }

    /// Wrap a challenge received from a client or read from storage.
    #[must_use]
    pub fn new(challenge: impl Into<String>) -> Self {
        Self(challenge.into())
    }

    /// Checks `verifier` against this challenge under `method`.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` on mismatch.
    pub fn verify(&self, method: PkceChallengeMethod, verifier: &str) -> Result<(), PkceError> {
        let matches = match method {
            PkceChallengeMethod::S256 => s256(verifier) == self.0,
            PkceChallengeMethod::Plain => verifier == self.0,
        };
        if matches {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn s256(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

// =============================================================================
// Token Request Verification
// =============================================================================

/// Checks the `code_verifier` of a token request against the authorization
/// the `code` was issued under.
///
/// - No stored challenge: passes, unless the client sets `require_proof_key`.
/// - Stored challenge: a non-empty verifier must be supplied and must match
///   under the stored method (`plain` when none was stored).
///
/// # Errors
///
/// Returns a [`PkceError`] whose `oauth_error_code` is `invalid_grant`.
pub fn verify_code_verifier(
    authorization: &Authorization,
    client: &RegisteredClient,
    code_verifier: Option<&str>,
) -> Result<(), PkceError> {
    let Some(challenge) = authorization.code_challenge() else {
        if client.client_settings.require_proof_key {
            return Err(PkceError::ChallengeRequired);
        }
        return Ok(());
    };

    let verifier = code_verifier
        .filter(|v| !v.is_empty())
        .ok_or(PkceError::MissingVerifier)?;

    let method = match authorization.code_challenge_method() {
        Some(method) => PkceChallengeMethod::parse(method)?,
        None => PkceChallengeMethod::Plain,
    };

    PkceChallenge::new(challenge).verify(method, verifier)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorizationRequest, ClientAuthenticationMethod, GrantType};

    // RFC 7636 Appendix B
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    fn client(require_proof_key: bool) -> RegisteredClient {
        RegisteredClient::builder("client-1")
            .authentication_method(ClientAuthenticationMethod::ClientSecretJwt)
            .require_proof_key(require_proof_key)
            .build()
    }

    fn authorization(challenge: Option<&str>, method: Option<&str>) -> Authorization {
        Authorization::new("reg-1", "alice", GrantType::AuthorizationCode).with_request(
            AuthorizationRequest {
                client_id: "client-1".to_string(),
                code_challenge: challenge.map(str::to_string),
                code_challenge_method: method.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_rfc7636_vector() {
        let verifier = PkceVerifier::new(RFC_VERIFIER.to_string()).unwrap();
        assert_eq!(PkceChallenge::from_verifier(&verifier).as_str(), RFC_CHALLENGE);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(
            PkceChallengeMethod::parse("S256").unwrap(),
            PkceChallengeMethod::S256
        );
        assert_eq!(
            PkceChallengeMethod::parse("plain").unwrap(),
            PkceChallengeMethod::Plain
        );
        assert_eq!(
            PkceChallengeMethod::parse("s256"),
            Err(PkceError::UnsupportedMethod("s256".to_string()))
        );
        assert_eq!(PkceChallengeMethod::default(), PkceChallengeMethod::Plain);
    }

    #[test]
    fn test_verifier_format() {
        assert!(matches!(
            PkceVerifier::new("short".to_string()),
            Err(PkceError::InvalidVerifierLength(5))
        ));
        assert!(matches!(
            PkceVerifier::new(format!("{}!", "a".repeat(43))),
            Err(PkceError::InvalidVerifierCharacters)
        ));
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert!(PkceVerifier::new("a".repeat(129)).is_err());
    }

    #[test]
    fn test_generated_verifier_is_valid() {
        let verifier = PkceVerifier::generate();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(PkceVerifier::new(verifier.clone().into_inner()).is_ok());
        assert_ne!(verifier.as_str(), PkceVerifier::generate().as_str());
    }

    #[test]
    fn test_verify_s256() {
        let auth = authorization(Some(RFC_CHALLENGE), Some("S256"));
        assert!(verify_code_verifier(&auth, &client(false), Some(RFC_VERIFIER)).is_ok());
        assert_eq!(
            verify_code_verifier(&auth, &client(false), Some("wrong-verifier")),
            Err(PkceError::VerificationFailed)
        );
    }

    #[test]
    fn test_verify_plain_and_default_method() {
        let auth = authorization(Some("same-value"), Some("plain"));
        assert!(verify_code_verifier(&auth, &client(false), Some("same-value")).is_ok());

        let auth = authorization(Some("same-value"), None);
        assert!(verify_code_verifier(&auth, &client(false), Some("same-value")).is_ok());
        assert_eq!(
            verify_code_verifier(&auth, &client(false), Some("other-value")),
            Err(PkceError::VerificationFailed)
        );
    }

    #[test]
    fn test_verify_missing_verifier() {
        let auth = authorization(Some(RFC_CHALLENGE), Some("S256"));
        assert_eq!(
            verify_code_verifier(&auth, &client(false), None),
            Err(PkceError::MissingVerifier)
        );
        assert_eq!(
            verify_code_verifier(&auth, &client(false), Some("")),
            Err(PkceError::MissingVerifier)
        );
    }

    #[test]
    fn test_verify_without_challenge() {
        let auth = authorization(None, None);
        assert!(verify_code_verifier(&auth, &client(false), None).is_ok());
        assert!(verify_code_verifier(&auth, &client(false), Some("ignored")).is_ok());
        assert_eq!(
            verify_code_verifier(&auth, &client(true), Some("ignored")),
            Err(PkceError::ChallengeRequired)
        );
    }

    #[test]
    fn test_verify_unsupported_method() {
        let auth = authorization(Some(RFC_CHALLENGE), Some("S512"));
        let err = verify_code_verifier(&auth, &client(false), Some(RFC_VERIFIER)).unwrap_err();
        assert_eq!(err.to_string(), "unsupported code_challenge_method: S512");
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(PkceError::MissingVerifier.to_string(), "code_verifier missing");
        assert_eq!(
            PkceError::VerificationFailed.to_string(),
            "invalid code_verifier"
        );
        assert_eq!(
            PkceError::ChallengeRequired.to_string(),
            "code_challenge required"
        );
        assert_eq!(
            PkceError::InvalidVerifierCharacters.oauth_error_code(),
            "invalid_request"
        );
        assert!(PkceError::InvalidVerifierLength(3).is_verifier_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            PkceError::InvalidVerifierLength(3).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            PkceError::InvalidVerifierCharacters.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            PkceError::VerificationFailed.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            PkceError::unsupported_method("S512").category(),
            ErrorCategory::Authentication
        );
    }
}
