//! Conversion of raw token request parameters into authentication requests.
//!
//! A [`DelegatingGrantConverter`] picks a converter by `grant_type`; the
//! [`JwtClientAssertionConverter`] extracts a JWT client assertion and
//! infers which assertion method the client is using.

use std::collections::HashMap;
use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jose::{peek_client_id, peek_header};
use crate::oauth::client_auth::ClientAuthenticationRequest;
use crate::oauth::parameters::{
    CLIENT_ASSERTION, CLIENT_ASSERTION_TYPE, CLIENT_ID, GRANT_TYPE, JWT_BEARER_ASSERTION_TYPE,
};
use crate::types::{ClientAuthenticationMethod, GrantType};

/// Token request form parameters. Repeated keys keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRequestParameters {
    values: HashMap<String, String>,
}

impl TokenRequestParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from name/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (name, value) in pairs {
            values.entry(name.into()).or_insert_with(|| value.into());
        }
        Self { values }
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn from_form(body: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(body.as_bytes()).into_owned())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the parameter if present and non-empty.
    #[must_use]
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Turns token request parameters into a client authentication request.
pub trait AuthenticationConverter: Send + Sync {
    /// Returns `Ok(None)` when the parameters are not for this converter.
    ///
    /// # Errors
    ///
    /// Returns an error when the parameters are for this converter but malformed.
    fn convert(
        &self,
        parameters: &TokenRequestParameters,
    ) -> AuthResult<Option<ClientAuthenticationRequest>>;
}

// =============================================================================
// JWT Client Assertion Converter
// =============================================================================

/// Extracts `client_assertion` credentials (RFC 7523 section 2.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtClientAssertionConverter;

impl AuthenticationConverter for JwtClientAssertionConverter {
    fn convert(
        &self,
        parameters: &TokenRequestParameters,
    ) -> AuthResult<Option<ClientAuthenticationRequest>> {
        let Some(assertion_type) = parameters.get_non_empty(CLIENT_ASSERTION_TYPE) else {
            return Ok(None);
        };
        if assertion_type != JWT_BEARER_ASSERTION_TYPE {
            return Err(AuthError::invalid_request(format!(
                "Unsupported {CLIENT_ASSERTION_TYPE}: {assertion_type}"
            )));
        }
        let Some(assertion) = parameters.get_non_empty(CLIENT_ASSERTION) else {
            return Ok(None);
        };

        let header = peek_header(assertion).map_err(|e| {
            AuthError::invalid_client_with_source(
                format!("Client authentication failed: {CLIENT_ASSERTION}"),
                e,
            )
        })?;

        let client_id = match parameters.get_non_empty(CLIENT_ID) {
            Some(client_id) => client_id.to_string(),
            None => peek_client_id(assertion).map_err(|e| {
                AuthError::invalid_client_with_source(
                    format!("Client authentication failed: {CLIENT_ID}"),
                    e,
                )
            })?,
        };

        let is_mac = matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512);
        let method = if is_mac {
            ClientAuthenticationMethod::ClientSecretJwt
        } else {
            ClientAuthenticationMethod::PrivateKeyJwt
        };

        let additional_parameters = parameters
            .iter()
            .filter(|(name, _)| {
                ![CLIENT_ASSERTION, CLIENT_ASSERTION_TYPE, CLIENT_ID].contains(name)
            })
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Ok(Some(ClientAuthenticationRequest {
            client_id,
            client_authentication_method: method,
            credentials: Some(assertion.to_string()),
            additional_parameters,
        }))
    }
}

// =============================================================================
// Delegating Grant Converter
// =============================================================================

/// Selects a converter by the request's `grant_type`.
pub struct DelegatingGrantConverter {
    converters: HashMap<GrantType, Arc<dyn AuthenticationConverter>>,
}

impl DelegatingGrantConverter {
    /// Creates a converter from a grant type map.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `converters` is empty.
    pub fn new(
        converters: HashMap<GrantType, Arc<dyn AuthenticationConverter>>,
    ) -> AuthResult<Self> {
        if converters.is_empty() {
            return Err(AuthError::configuration("converters cannot be empty"));
        }
        Ok(Self { converters })
    }

    /// Maps every grant type to the same converter.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `grant_types` is empty.
    pub fn for_grant_types(
        grant_types: impl IntoIterator<Item = GrantType>,
        converter: Arc<dyn AuthenticationConverter>,
    ) -> AuthResult<Self> {
        let converters = grant_types
            .into_iter()
            .map(|grant_type| (grant_type, Arc::clone(&converter)))
            .collect();
        Self::new(converters)
    }

    /// Returns `true` if a converter is registered for `grant_type`.
    #[must_use]
    pub fn supports(&self, grant_type: &str) -> bool {
        GrantType::parse(grant_type).is_some_and(|g| self.converters.contains_key(&g))
    }

    /// Converts `parameters` with the converter registered for its grant type.
    ///
    /// Returns `Ok(None)` when `grant_type` is missing, unknown or unmapped.
    ///
    /// # Errors
    ///
    /// Propagates errors from the selected converter.
    pub fn convert(
        &self,
        parameters: &TokenRequestParameters,
    ) -> AuthResult<Option<ClientAuthenticationRequest>> {
        let Some(grant_type) = parameters
            .get_non_empty(GRANT_TYPE)
            .and_then(GrantType::parse)
        else {
            return Ok(None);
        };
        match self.converters.get(&grant_type) {
            Some(converter) => converter.convert(parameters),
            None => Ok(None),
        }
    }
}
