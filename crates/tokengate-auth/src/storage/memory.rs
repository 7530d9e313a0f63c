//! In-memory repositories backed by `DashMap`.
//!
//! Suitable for tests, the CLI and single-instance deployments whose
//! registrations are loaded from files at startup.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{AuthorizationRepository, RegisteredClientRepository};
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::{Authorization, RegisteredClient, TokenType};

// =============================================================================
// Registered Clients
// =============================================================================

/// Client registrations indexed by id and by client_id.
#[derive(Debug, Default)]
pub struct InMemoryRegisteredClientRepository {
    clients: DashMap<String, RegisteredClient>,
    /// client_id -> id
    client_ids: DashMap<String, String>,
}

impl InMemoryRegisteredClientRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository from a list of registrations.
    ///
    /// # Errors
    ///
    /// Returns an error if any registration is invalid or two share a client_id.
    pub fn from_clients(clients: impl IntoIterator<Item = RegisteredClient>) -> AuthResult<Self> {
        let repo = Self::new();
        for client in clients {
            repo.save(client)?;
        }
        Ok(repo)
    }

    /// Inserts or replaces a registration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the registration is invalid and
    /// `AuthError::Storage` if its client_id belongs to another registration.
    pub fn save(&self, client: RegisteredClient) -> AuthResult<()> {
        client
            .validate()
            .map_err(|e| AuthError::configuration(format!("client '{}': {e}", client.client_id)))?;

        match self.client_ids.entry(client.client_id.clone()) {
            Entry::Occupied(existing) if existing.get() != &client.id => {
                return Err(AuthError::storage(format!(
                    "client_id '{}' is already registered",
                    client.client_id
                )));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(client.id.clone());
            }
        }

        let client_id = client.client_id.clone();
        if let Some(previous) = self.clients.insert(client.id.clone(), client)
            && previous.client_id != client_id
        {
            self.client_ids.remove(&previous.client_id);
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl RegisteredClientRepository for InMemoryRegisteredClientRepository {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<RegisteredClient>> {
        Ok(self.clients.get(id).map(|c| c.value().clone()))
    }

    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredClient>> {
        let Some(id) = self.client_ids.get(client_id).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }
}

// =============================================================================
// Authorizations
// =============================================================================

/// Authorizations indexed by id and by every token they carry.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    authorizations: DashMap<String, Authorization>,
    /// (token type, token value) -> authorization id
    tokens: DashMap<(TokenType, String), String>,
}

impl InMemoryAuthorizationRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository from a list of authorizations.
    ///
    /// # Errors
    ///
    /// Returns an error if two authorizations carry the same token.
    pub fn from_authorizations(
        authorizations: impl IntoIterator<Item = Authorization>,
    ) -> AuthResult<Self> {
        let repo = Self::new();
        for authorization in authorizations {
            repo.save(authorization)?;
        }
        Ok(repo)
    }

    /// Inserts or replaces an authorization and re-indexes its tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if a token is already indexed under
    /// another authorization.
    pub fn save(&self, authorization: Authorization) -> AuthResult<()> {
        for (token_type, token) in &authorization.tokens {
            if let Some(owner) = self.tokens.get(&(*token_type, token.value.clone()))
                && owner.value() != &authorization.id
            {
                return Err(AuthError::storage(format!(
                    "{token_type} token already belongs to authorization '{}'",
                    owner.value()
                )));
            }
        }

        self.unindex(&authorization.id);
        for (token_type, token) in &authorization.tokens {
            self.tokens
                .insert((*token_type, token.value.clone()), authorization.id.clone());
        }
        self.authorizations
            .insert(authorization.id.clone(), authorization);
        Ok(())
    }

    /// Removes an authorization and its token index entries.
    pub fn remove(&self, id: &str) -> Option<Authorization> {
        self.unindex(id);
        self.authorizations.remove(id).map(|(_, a)| a)
    }

    fn unindex(&self, id: &str) {
        if let Some(existing) = self.authorizations.get(id) {
            for (token_type, token) in &existing.tokens {
                self.tokens.remove(&(*token_type, token.value.clone()));
            }
        }
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Authorization>> {
        Ok(self.authorizations.get(id).map(|a| a.value().clone()))
    }

    async fn find_by_token(
        &self,
        token: &str,
        token_type: TokenType,
    ) -> AuthResult<Option<Authorization>> {
        let Some(id) = self
            .tokens
            .get(&(token_type, token.to_string()))
            .map(|id| id.value().clone())
        else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }
}
