//! Authorization repository trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{Authorization, TokenType};

/// Read access to stored authorizations.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Find an authorization by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Authorization>>;

    /// Find the authorization that issued `token` as a token of `token_type`.
    ///
    /// For [`TokenType::AuthorizationCode`] this resolves the `code`
    /// parameter of a token request to the authorization (and hence the PKCE
    /// challenge) it was issued under.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_token(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> AuthResult<Option<Authorization>>;
}
