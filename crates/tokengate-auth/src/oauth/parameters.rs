//! Token request parameter names (RFC 6749, RFC 7521, RFC 7636).

pub const GRANT_TYPE: &str = "grant_type";
pub const CODE: &str = "code";
pub const CODE_VERIFIER: &str = "code_verifier";
pub const CLIENT_ID: &str = "client_id";
pub const CLIENT_ASSERTION: &str = "client_assertion";
pub const CLIENT_ASSERTION_TYPE: &str = "client_assertion_type";

/// `client_assertion_type` value for JWT assertions (RFC 7523 section 2.2).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

// Pseudo-parameters named in `invalid_client` descriptions.
pub(crate) const AUTHENTICATION_METHOD: &str = "authentication_method";
pub(crate) const CREDENTIALS: &str = "credentials";
