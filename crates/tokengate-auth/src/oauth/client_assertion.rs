//! JWT client assertion validation (RFC 7523 section 3).
//!
//! The client assertion JWT must contain:
//!
//! - `iss` (issuer): must equal the client_id
//! - `sub` (subject): must equal the client_id
//! - `aud` (audience): must contain the token endpoint URL
//! - `exp` (expiration): must be present and in the future
//!
//! `nbf`, when present, must not be in the future. No clock-skew leeway is
//! applied. All claim checks run even after one fails, so a rejected
//! assertion reports every violation at once.

use time::OffsetDateTime;

use crate::jose::{
    Claim, ClaimViolation, ClaimViolations, ClientAssertionClaims, Jwt, JwtError,
    SignatureVerifier,
};

/// Claim values an assertion must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedClaims {
    pub issuer: String,
    pub subject: String,
    pub audience: String,
}

impl ExpectedClaims {
    /// Expectations for a client authenticating itself: `iss` and `sub` are
    /// the client_id, `aud` is the token endpoint URL.
    #[must_use]
    pub fn client_assertion(client_id: &str, token_endpoint_url: impl Into<String>) -> Self {
        Self {
            issuer: client_id.to_string(),
            subject: client_id.to_string(),
            audience: token_endpoint_url.into(),
        }
    }
}

/// Validates client assertions: signature first, then claims.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientAssertionValidator;

impl ClientAssertionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Verifies `token` under `verifier` and checks its claims against `expected`.
    ///
    /// # Errors
    ///
    /// Returns a "bad JWT" [`JwtError`] if decoding or signature verification
    /// fails, and [`JwtError::Validation`] listing every violated claim otherwise.
    pub async fn validate(
        &self,
        token: &str,
        expected: &ExpectedClaims,
        verifier: &SignatureVerifier,
    ) -> Result<Jwt, JwtError> {
        let data = verifier.verify(token).await?;
        let (issued_at, expires_at) =
            self.validate_claims(&data.claims, expected, OffsetDateTime::now_utc())?;

        Ok(Jwt::new(token, data.header, data.claims, issued_at, expires_at))
    }

    /// Checks registered claims at instant `now`.
    ///
    /// On success returns the issued-at (if any) and expiry instants.
    fn validate_claims(
        &self,
        claims: &ClientAssertionClaims,
        expected: &ExpectedClaims,
        now: OffsetDateTime,
    ) -> Result<(Option<OffsetDateTime>, OffsetDateTime), JwtError> {
        let mut violations = ClaimViolations::new();

        check_equals(&mut violations, Claim::Iss, claims.iss.as_deref(), &expected.issuer);
        check_equals(&mut violations, Claim::Sub, claims.sub.as_deref(), &expected.subject);

        match &claims.aud {
            None => violations.push(ClaimViolation::new(Claim::Aud, "The aud claim is missing")),
            Some(aud) if !aud.contains(&expected.audience) => violations.push(
                ClaimViolation::new(Claim::Aud, "The aud claim is not valid"),
            ),
            Some(_) => {}
        }

        let expires_at = match claims.exp.map(timestamp) {
            None => {
                violations.push(ClaimViolation::new(Claim::Exp, "The exp claim is missing"));
                None
            }
            Some(None) => {
                violations.push(ClaimViolation::new(Claim::Exp, "The exp claim is not valid"));
                None
            }
            Some(Some(exp)) if now >= exp => {
                violations.push(ClaimViolation::new(Claim::Exp, format!("Jwt expired at {exp}")));
                None
            }
            Some(Some(exp)) => Some(exp),
        };

        match claims.nbf.map(timestamp) {
            Some(None) => {
                violations.push(ClaimViolation::new(Claim::Nbf, "The nbf claim is not valid"));
            }
            Some(Some(nbf)) if now < nbf => {
                violations.push(ClaimViolation::new(Claim::Nbf, format!("Jwt used before {nbf}")));
            }
            _ => {}
        }

        let issued_at = match claims.iat.map(timestamp) {
            Some(None) => {
                violations.push(ClaimViolation::new(Claim::Iat, "The iat claim is not valid"));
                None
            }
            Some(iat) => iat,
            None => None,
        };

        match expires_at {
            Some(expires_at) if violations.is_empty() => Ok((issued_at, expires_at)),
            _ => Err(JwtError::Validation(violations)),
        }
    }
}

fn check_equals(
    violations: &mut ClaimViolations,
    claim: Claim,
    actual: Option<&str>,
    expected: &str,
) {
    match actual {
        None => violations.push(ClaimViolation::new(
            claim,
            format!("The {claim} claim is missing"),
        )),
        Some(value) if value != expected => violations.push(ClaimViolation::new(
            claim,
            format!("The {claim} claim is not valid"),
        )),
        Some(_) => {}
    }
}

fn timestamp(seconds: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}
