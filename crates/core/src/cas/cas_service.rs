use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;

use super::cas_model::{
    CasDataView, CasFile, CasStatus, CasStatusView, CasUpload, PortfolioSnapshot,
};
use super::cas_traits::CasServiceTrait;
use super::credential_vault::CredentialVault;
use super::file_stager::{validate_cas_upload, FileStager};
use super::parser_gateway::ParserGatewayTrait;
use super::record_merger::RecordMerger;
use crate::clients::ClientRepositoryTrait;
use crate::constants::PARSE_OUTCOME_SAVE_ATTEMPTS;
use crate::errors::{Error, Result};

/// A parse that has been accepted (record persisted as `Parsing`) and still
/// has to be carried to a terminal status by [`CasService::run_parse`].
#[derive(Debug, Clone)]
pub struct ParseTicket {
    pub client_id: String,
    pub requested_at: DateTime<Utc>,
    file: CasFile,
}

enum ParseOutcome {
    Succeeded(PortfolioSnapshot),
    Failed(String),
}

/// Orchestrates CAS ingestion for client aggregates.
///
/// All collaborators are injected at startup. The `Parsing` status written by
/// [`CasService::begin_parse`] is the only in-flight lock.
#[derive(Clone)]
pub struct CasService {
    repository: Arc<dyn ClientRepositoryTrait>,
    vault: Arc<CredentialVault>,
    stager: Arc<FileStager>,
    parser: Arc<dyn ParserGatewayTrait>,
    merger: RecordMerger,
}

impl CasService {
    pub fn new(
        repository: Arc<dyn ClientRepositoryTrait>,
        vault: Arc<CredentialVault>,
        stager: Arc<FileStager>,
        parser: Arc<dyn ParserGatewayTrait>,
    ) -> Self {
        Self {
            repository,
            vault,
            stager,
            parser,
            merger: RecordMerger::new(),
        }
    }

    /// Persists the `Parsing` status and hands back the work to do.
    pub async fn begin_parse(&self, client_id: &str) -> Result<(ParseTicket, CasStatusView)> {
        let mut client = self.repository.get_by_id(client_id)?;
        let file = client.cas.on_parse_requested()?;
        if !self.stager.exists(&file.storage_path) {
            return Err(Error::NotFound(
                "The stored CAS file is missing. Please re-upload it.".to_string(),
            ));
        }

        let requested_at = Utc::now();
        let saved = self.repository.save(client).await?;
        info!("CAS parse requested for client {}", client_id);
        Ok((
            ParseTicket {
                client_id: client_id.to_string(),
                requested_at,
                file,
            },
            saved.cas.status_view(),
        ))
    }

    /// Decrypts, parses and records the terminal status for an accepted parse.
    ///
    /// Parse failures are persisted as `Error` before they are returned.
    pub async fn run_parse(&self, ticket: ParseTicket) -> Result<CasStatusView> {
        match self.extract_snapshot(&ticket).await {
            Ok(snapshot) => {
                let view = self
                    .record_outcome(&ticket.client_id, ParseOutcome::Succeeded(snapshot))
                    .await?;
                info!(
                    "CAS parsed for client {} in {} ms",
                    ticket.client_id,
                    (Utc::now() - ticket.requested_at).num_milliseconds()
                );
                Ok(view)
            }
            Err(err) => {
                warn!("CAS parse failed for client {}: {}", ticket.client_id, err);
                self.record_outcome(&ticket.client_id, ParseOutcome::Failed(err.to_string()))
                    .await?;
                Err(err)
            }
        }
    }

    async fn extract_snapshot(&self, ticket: &ParseTicket) -> Result<PortfolioSnapshot> {
        let password = ticket
            .file
            .encrypted_password
            .as_ref()
            .map(|secret| self.vault.decrypt(secret))
            .transpose()?;
        let path = self.stager.resolve(&ticket.file.storage_path)?;
        let snapshot = self.parser.parse(&path, password.as_deref()).await?;
        Ok(snapshot)
    }

    /// Applies a parse outcome, reloading and retrying on version conflicts.
    async fn record_outcome(
        &self,
        client_id: &str,
        outcome: ParseOutcome,
    ) -> Result<CasStatusView> {
        let mut last_conflict = None;
        for attempt in 1..=PARSE_OUTCOME_SAVE_ATTEMPTS {
            let mut client = self.repository.get_by_id(client_id)?;
            if client.cas.status() != CasStatus::Parsing {
                warn!(
                    "Discarding CAS parse outcome for client {}: status is now '{}'",
                    client_id,
                    client.cas.status()
                );
                return Err(Error::Conflict(format!(
                    "CAS record for client {} is no longer being parsed",
                    client_id
                )));
            }

            match &outcome {
                ParseOutcome::Succeeded(snapshot) => {
                    self.merger
                        .merge(&mut client, snapshot.clone(), Utc::now())?
                }
                ParseOutcome::Failed(reason) => client.cas.on_parse_failed(reason)?,
            }

            match self.repository.save(client).await {
                Ok(saved) => return Ok(saved.cas.status_view()),
                Err(Error::Conflict(message)) => {
                    debug!(
                        "Version conflict recording CAS outcome for client {} (attempt {}): {}",
                        client_id, attempt, message
                    );
                    last_conflict = Some(message);
                }
                Err(e) => {
                    error!(
                        "Failed to record CAS parse outcome for client {}: {}. \
                         The record stays in parsing until POST /clients/{}/cas/reset is called",
                        client_id, e, client_id
                    );
                    return Err(e);
                }
            }
        }
        Err(Error::Conflict(last_conflict.unwrap_or_else(|| {
            format!("Could not record CAS outcome for client {}", client_id)
        })))
    }
}

#[async_trait::async_trait]
impl CasServiceTrait for CasService {
    async fn upload_cas(&self, upload: CasUpload) -> Result<CasStatusView> {
        validate_cas_upload(
            &upload.bytes,
            &upload.file_name,
            upload.content_type.as_deref(),
        )?;

        let client = self.repository.get_by_id(&upload.client_id)?;
        client.cas.ensure_not_parsing()?;

        let encrypted_password = match upload.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(self.vault.encrypt(password)?),
            None => None,
        };

        let existing_path = client.cas.file().map(|file| file.storage_path.clone());
        let client_id = client.id.clone();
        let file_name = upload.file_name.trim().to_string();
        let repository = &self.repository;

        let saved = self
            .stager
            .replace(
                existing_path.as_deref(),
                &client_id,
                &upload.bytes,
                &upload.file_name,
                |staged| async move {
                    let mut client = client;
                    client.cas.on_upload(CasFile {
                        name: file_name,
                        storage_path: staged.storage_path,
                        size: staged.size,
                        uploaded_at: Utc::now(),
                        encrypted_password,
                    })?;
                    repository.save(client).await
                },
            )
            .await?;

        info!(
            "CAS uploaded for client {} ({} bytes)",
            saved.id,
            upload.bytes.len()
        );
        Ok(saved.cas.status_view())
    }

    async fn request_parse(&self, client_id: &str) -> Result<CasStatusView> {
        let (ticket, view) = self.begin_parse(client_id).await?;
        let service = self.clone();
        tokio::spawn(async move {
            let client_id = ticket.client_id.clone();
            if let Err(e) = service.run_parse(ticket).await {
                debug!("Background CAS parse for client {} ended with: {}", client_id, e);
            }
        });
        Ok(view)
    }

    fn get_cas_status(&self, client_id: &str) -> Result<CasStatusView> {
        Ok(self.repository.get_by_id(client_id)?.cas.status_view())
    }

    fn get_cas_data(&self, client_id: &str) -> Result<CasDataView> {
        Ok(self.repository.get_by_id(client_id)?.cas.data_view())
    }

    async fn delete_cas(&self, client_id: &str) -> Result<CasStatusView> {
        let mut client = self.repository.get_by_id(client_id)?;
        let removed = client.cas.on_delete()?;
        let saved = self.repository.save(client).await?;
        if let Some(file) = removed {
            self.stager.delete(&file.storage_path)?;
        }
        info!("CAS deleted for client {}", client_id);
        Ok(saved.cas.status_view())
    }

    async fn reset_cas_parse(&self, client_id: &str) -> Result<CasStatusView> {
        let mut client = self.repository.get_by_id(client_id)?;
        client.cas.on_parse_reset()?;
        let saved = self.repository.save(client).await?;
        warn!("Stuck CAS parse reset for client {}", client_id);
        Ok(saved.cas.status_view())
    }
}
