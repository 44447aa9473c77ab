//! Client aggregate models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cas::{CasRecord, CasStatusView};
use crate::{errors::ValidationError, Error, Result};

/// A financial advisor's client. The CAS record lives inside this aggregate.
///
/// `version` is the optimistic-concurrency token checked by the repository on
/// every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// Tax/registration identifier (PAN).
    pub identity_number: Option<String>,
    pub cas: CasRecord,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input model for creating a new client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub identity_number: Option<String>,
}

impl NewClient {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Client name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// Client listing entry: the aggregate without the parsed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub identity_number: Option<String>,
    pub cas: CasStatusView,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            name: client.name.clone(),
            email: client.email.clone(),
            identity_number: client.identity_number.clone(),
            cas: client.cas.status_view(),
        }
    }
}
