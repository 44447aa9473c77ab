//! Folds a parsed snapshot into the owning client aggregate.

use chrono::{DateTime, Utc};
use log::debug;

use super::cas_model::PortfolioSnapshot;
use crate::clients::Client;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMerger;

impl RecordMerger {
    pub fn new() -> Self {
        Self
    }

    /// Attaches `snapshot` to the client's CAS record and back-fills the
    /// client's identity number when it is not yet known.
    ///
    /// An identity number that is already set is never overwritten. Merging
    /// the same snapshot with the same timestamp twice yields the same client.
    pub fn merge(
        &self,
        client: &mut Client,
        snapshot: PortfolioSnapshot,
        parsed_at: DateTime<Utc>,
    ) -> Result<()> {
        client.cas.ensure_parsing("record a parse result")?;
        let has_identity = client
            .identity_number
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        if !has_identity {
            if let Some(found) = snapshot
                .investor
                .identity_number
                .as_deref()
                .map(|value| value.trim().to_uppercase())
                .filter(|value| !value.is_empty())
            {
                debug!("Filled identity number for client {} from CAS", client.id);
                client.identity_number = Some(found);
            }
        }
        client.cas.on_parse_succeeded(snapshot, parsed_at)
    }
}
