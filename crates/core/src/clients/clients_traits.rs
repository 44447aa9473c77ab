//! Client repository and service traits.

use async_trait::async_trait;

use super::clients_model::{Client, ClientSummary, NewClient};
use crate::errors::Result;

/// Persistence contract for client aggregates.
#[async_trait]
pub trait ClientRepositoryTrait: Send + Sync {
    /// Creates a client with an empty CAS record at version 1.
    async fn create(&self, new_client: NewClient) -> Result<Client>;

    /// Retrieves a client by its ID. Unknown IDs yield `Error::NotFound`.
    fn get_by_id(&self, client_id: &str) -> Result<Client>;

    fn list(&self) -> Result<Vec<Client>>;

    /// Writes the aggregate back if `client.version` still matches the stored
    /// version, and returns it with the incremented version.
    ///
    /// A stale version yields `Error::Conflict`; nothing is written.
    async fn save(&self, client: Client) -> Result<Client>;
}

/// Minimal client operations needed to own CAS records.
#[async_trait]
pub trait ClientServiceTrait: Send + Sync {
    async fn create_client(&self, new_client: NewClient) -> Result<Client>;
    fn get_client(&self, client_id: &str) -> Result<Client>;
    fn list_clients(&self) -> Result<Vec<ClientSummary>>;
}
