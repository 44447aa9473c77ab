//! In-memory client repository with the same version check as the SQLite one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::{Client, ClientRepositoryTrait, NewClient};
use crate::cas::CasRecord;
use crate::errors::{Error, Result};

#[derive(Clone, Default)]
pub(crate) struct InMemoryClientRepository {
    clients: Arc<Mutex<HashMap<String, Client>>>,
}

impl InMemoryClientRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Overwrites a stored client without a version check.
    pub(crate) fn force_put(&self, client: Client) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), client);
    }
}

#[async_trait]
impl ClientRepositoryTrait for InMemoryClientRepository {
    async fn create(&self, new_client: NewClient) -> Result<Client> {
        let now = Utc::now();
        let client = Client {
            id: new_client
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: new_client.name,
            email: new_client.email,
            identity_number: new_client.identity_number,
            cas: CasRecord::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), client.clone());
        Ok(client)
    }

    fn get_by_id(&self, client_id: &str) -> Result<Client> {
        self.clients
            .lock()
            .unwrap()
            .get(client_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Client {} not found", client_id)))
    }

    fn list(&self) -> Result<Vec<Client>> {
        Ok(self.clients.lock().unwrap().values().cloned().collect())
    }

    async fn save(&self, mut client: Client) -> Result<Client> {
        let mut clients = self.clients.lock().unwrap();
        let stored = clients
            .get(&client.id)
            .ok_or_else(|| Error::NotFound(format!("Client {} not found", client.id)))?;
        if stored.version != client.version {
            return Err(Error::Conflict(format!(
                "Client {} was modified concurrently",
                client.id
            )));
        }
        client.version += 1;
        client.updated_at = Utc::now();
        clients.insert(client.id.clone(), client.clone());
        Ok(client)
    }
}
