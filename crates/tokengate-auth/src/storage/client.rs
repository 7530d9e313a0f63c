//! Registered client repository trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::RegisteredClient;

// =============================================================================
// Registered Client Repository Trait
// =============================================================================

/// Read access to client registrations.
///
/// Implementations must be safe to call concurrently from many requests.
///
/// # Example
///
/// ```ignore
/// use tokengate_auth::storage::RegisteredClientRepository;
///
/// async fn example(clients: &impl RegisteredClientRepository) -> AuthResult<()> {
///     if let Some(client) = clients.find_by_client_id("my-app").await? {
///         println!("Found registration: {}", client.id);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RegisteredClientRepository: Send + Sync {
    /// Find a client by its server-assigned registration id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<RegisteredClient>>;

    /// Find a client by its OAuth client_id.
    ///
    /// Returns `None` if no client is registered under that identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredClient>>;
}
