//! CAS service trait.

use async_trait::async_trait;

use super::cas_model::{CasDataView, CasStatusView, CasUpload};
use crate::errors::Result;

/// Operations exposed to the client-management surface.
#[async_trait]
pub trait CasServiceTrait: Send + Sync {
    /// Validates and stages a document, encrypting its password if one is given.
    async fn upload_cas(&self, upload: CasUpload) -> Result<CasStatusView>;

    /// Marks the record `Parsing` and runs the parse in the background.
    ///
    /// Returns as soon as the `Parsing` status is persisted, or with
    /// `Error::Conflict` when a parse is already in flight.
    async fn request_parse(&self, client_id: &str) -> Result<CasStatusView>;

    /// Status, error and file metadata without the parsed snapshot.
    fn get_cas_status(&self, client_id: &str) -> Result<CasStatusView>;

    fn get_cas_data(&self, client_id: &str) -> Result<CasDataView>;

    /// Resets the record to `NotUploaded` and removes the stored document.
    async fn delete_cas(&self, client_id: &str) -> Result<CasStatusView>;

    /// Releases a record left in `Parsing` by an interrupted run.
    async fn reset_cas_parse(&self, client_id: &str) -> Result<CasStatusView>;
}
