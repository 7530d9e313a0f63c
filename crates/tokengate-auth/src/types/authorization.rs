//! Authorization records.
//!
//! An [`Authorization`] captures what was granted when a client went
//! through the authorization endpoint: the original request (including the
//! PKCE challenge) and the tokens issued for it, indexed by [`TokenType`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::client::GrantType;

// =============================================================================
// Token Type
// =============================================================================

/// Kinds of tokens an authorization can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// The authorization code (`code` parameter).
    #[serde(rename = "code")]
    AuthorizationCode,
    AccessToken,
    RefreshToken,
}

impl TokenType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "code",
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Authorization Request
// =============================================================================

/// The authorization request that produced an authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationRequest {
    pub client_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    pub scopes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// PKCE `code_challenge` sent with the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE `code_challenge_method`; absent means `plain`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,

    /// Any other request parameters.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub additional_parameters: HashMap<String, String>,
}

// =============================================================================
// Tokens
// =============================================================================

/// A token issued under an authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationToken {
    pub value: String,

    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,

    #[serde(default)]
    pub invalidated: bool,
}

impl AuthorizationToken {
    /// Creates a token issued now with no expiry.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: OffsetDateTime::now_utc(),
            expires_at: None,
            invalidated: false,
        }
    }

    #[must_use]
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        !self.invalidated && self.expires_at.is_none_or(|exp| now < exp)
    }
}

// =============================================================================
// Authorization
// =============================================================================

/// A stored authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub id: String,

    /// The `RegisteredClient::id` this authorization belongs to.
    pub registered_client_id: String,

    pub principal_name: String,

    pub authorization_grant_type: GrantType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_request: Option<AuthorizationRequest>,

    #[serde(default)]
    pub tokens: HashMap<TokenType, AuthorizationToken>,
}

impl Authorization {
    /// Creates an authorization code grant record with a fresh id.
    #[must_use]
    pub fn new(
        registered_client_id: impl Into<String>,
        principal_name: impl Into<String>,
        authorization_grant_type: GrantType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            registered_client_id: registered_client_id.into(),
            principal_name: principal_name.into(),
            authorization_grant_type,
            authorization_request: None,
            tokens: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_request(mut self, request: AuthorizationRequest) -> Self {
        self.authorization_request = Some(request);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token_type: TokenType, token: AuthorizationToken) -> Self {
        self.tokens.insert(token_type, token);
        self
    }

    #[must_use]
    pub fn token(&self, token_type: TokenType) -> Option<&AuthorizationToken> {
        self.tokens.get(&token_type)
    }

    /// The PKCE challenge recorded at the authorization endpoint, if non-empty.
    #[must_use]
    pub fn code_challenge(&self) -> Option<&str> {
        self.authorization_request
            .as_ref()
            .and_then(|r| r.code_challenge.as_deref())
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn code_challenge_method(&self) -> Option<&str> {
        self.authorization_request
            .as_ref()
            .and_then(|r| r.code_challenge_method.as_deref())
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn make_authorization() -> Authorization {
        Authorization::new("reg-1", "alice", GrantType::AuthorizationCode)
            .with_request(AuthorizationRequest {
                client_id: "client-1".to_string(),
                code_challenge: Some("challenge".to_string()),
                code_challenge_method: Some("S256".to_string()),
                ..Default::default()
            })
            .with_token(TokenType::AuthorizationCode, AuthorizationToken::new("code"))
    }

    #[test]
    fn test_challenge_accessors() {
        let auth = make_authorization();
        assert_eq!(auth.code_challenge(), Some("challenge"));
        assert_eq!(auth.code_challenge_method(), Some("S256"));

        let bare = Authorization::new("reg-1", "alice", GrantType::AuthorizationCode);
        assert_eq!(bare.code_challenge(), None);
        assert_eq!(bare.code_challenge_method(), None);
    }

    #[test]
    fn test_token_lookup() {
        let auth = make_authorization();
        assert_eq!(
            auth.token(TokenType::AuthorizationCode).map(|t| t.value.as_str()),
            Some("code")
        );
        assert!(auth.token(TokenType::AccessToken).is_none());
    }

    #[test]
    fn test_token_activity() {
        let now = OffsetDateTime::now_utc();
        let mut token = AuthorizationToken::new("t");
        assert!(token.is_active(now));

        token.expires_at = Some(now - Duration::seconds(1));
        assert!(!token.is_active(now));

        token.expires_at = None;
        token.invalidated = true;
        assert!(!token.is_active(now));
    }

    #[test]
    fn test_serde_token_map_keys() {
        let auth = make_authorization();
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json["tokens"]["code"]["value"], "code");

        let back: Authorization = serde_json::from_value(json).unwrap();
        assert_eq!(back, auth);
    }
}
