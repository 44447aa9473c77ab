//! Transitions of the per-client CAS record.
//!
//! Each transition inspects the current [`CasStatus`] exhaustively and either
//! applies the whole change or returns an error without touching the record.
//!
//! ```text
//! upload:  any state except Parsing  -> Uploaded
//! parse:   Uploaded | Error          -> Parsing
//! outcome: Parsing                   -> Parsed | Error
//! reset:   Parsing                   -> Error
//! delete:  any state except Parsing  -> NotUploaded
//! ```

use chrono::{DateTime, Utc};

use super::cas_model::{CasFile, CasRecord, CasStatus, PortfolioSnapshot};
use crate::constants::{PARSE_INTERRUPTED_MESSAGE, UNKNOWN_PARSE_FAILURE_MESSAGE};
use crate::errors::{Error, Result};

impl CasRecord {
    /// Fails with `Conflict` while a parse is in flight.
    pub fn ensure_not_parsing(&self) -> Result<()> {
        match self.status {
            CasStatus::Parsing => Err(Error::Conflict(
                "CAS parsing is in progress. Wait for it to finish before changing the file."
                    .to_string(),
            )),
            CasStatus::NotUploaded | CasStatus::Uploaded | CasStatus::Parsed | CasStatus::Error => {
                Ok(())
            }
        }
    }

    /// Attaches a newly staged file and returns the file it replaced.
    pub fn on_upload(&mut self, file: CasFile) -> Result<Option<CasFile>> {
        self.ensure_not_parsing()?;
        let previous = self.file.replace(file);
        self.status = CasStatus::Uploaded;
        self.parse_error = None;
        self.parsed_data = None;
        self.last_parsed_at = None;
        Ok(previous)
    }

    /// Moves the record to `Parsing` and returns the file to parse.
    pub fn on_parse_requested(&mut self) -> Result<CasFile> {
        match self.status {
            CasStatus::Uploaded | CasStatus::Error => {
                let file = self.file.clone().ok_or_else(|| {
                    Error::NotFound("No CAS file has been uploaded for this client".to_string())
                })?;
                self.status = CasStatus::Parsing;
                Ok(file)
            }
            CasStatus::Parsing => Err(Error::Conflict(
                "CAS parsing is already in progress".to_string(),
            )),
            CasStatus::NotUploaded => Err(Error::NotFound(
                "No CAS file has been uploaded for this client".to_string(),
            )),
            CasStatus::Parsed => Err(Error::Conflict(
                "CAS has already been parsed. Upload the file again to re-parse it.".to_string(),
            )),
        }
    }

    pub fn on_parse_succeeded(
        &mut self,
        snapshot: PortfolioSnapshot,
        parsed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_parsing("record a parse result")?;
        self.status = CasStatus::Parsed;
        self.parsed_data = Some(snapshot);
        self.parse_error = None;
        self.last_parsed_at = Some(parsed_at);
        Ok(())
    }

    /// Records a failed parse. A snapshot from an earlier success is kept.
    pub fn on_parse_failed(&mut self, reason: &str) -> Result<()> {
        self.ensure_parsing("record a parse failure")?;
        let reason = reason.trim();
        self.status = CasStatus::Error;
        self.parse_error = Some(if reason.is_empty() {
            UNKNOWN_PARSE_FAILURE_MESSAGE.to_string()
        } else {
            reason.to_string()
        });
        Ok(())
    }

    /// Releases a record stuck in `Parsing` after an interrupted run.
    pub fn on_parse_reset(&mut self) -> Result<()> {
        self.ensure_parsing("reset")?;
        self.status = CasStatus::Error;
        self.parse_error = Some(PARSE_INTERRUPTED_MESSAGE.to_string());
        Ok(())
    }

    /// Resets the record and returns the file that must be removed from storage.
    pub fn on_delete(&mut self) -> Result<Option<CasFile>> {
        self.ensure_not_parsing()?;
        let previous = self.file.take();
        *self = CasRecord::new();
        Ok(previous)
    }

    pub(crate) fn ensure_parsing(&self, action: &str) -> Result<()> {
        match self.status {
            CasStatus::Parsing => Ok(()),
            CasStatus::NotUploaded | CasStatus::Uploaded | CasStatus::Parsed | CasStatus::Error => {
                Err(Error::Conflict(format!(
                    "Cannot {} while CAS status is '{}'",
                    action, self.status
                )))
            }
        }
    }
}
