use log::debug;
use std::sync::Arc;

use super::clients_model::{Client, ClientSummary, NewClient};
use super::clients_traits::{ClientRepositoryTrait, ClientServiceTrait};
use crate::errors::Result;

/// Service for managing client aggregates
pub struct ClientService {
    repository: Arc<dyn ClientRepositoryTrait>,
}

impl ClientService {
    pub fn new(repository: Arc<dyn ClientRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl ClientServiceTrait for ClientService {
    async fn create_client(&self, mut new_client: NewClient) -> Result<Client> {
        new_client.validate()?;
        new_client.name = new_client.name.trim().to_string();
        new_client.identity_number = new_client
            .identity_number
            .map(|value| value.trim().to_uppercase())
            .filter(|value| !value.is_empty());
        debug!("Creating client {}", new_client.name);
        self.repository.create(new_client).await
    }

    fn get_client(&self, client_id: &str) -> Result<Client> {
        self.repository.get_by_id(client_id)
    }

    fn list_clients(&self) -> Result<Vec<ClientSummary>> {
        Ok(self
            .repository
            .list()?
            .iter()
            .map(ClientSummary::from)
            .collect())
    }
}
