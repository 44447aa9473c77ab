//! Durable storage for uploaded CAS documents.

use std::fs;
use std::future::Future;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};

use crate::constants::{CAS_CONTENT_TYPE, CAS_FILE_EXTENSION, MAX_CAS_FILE_SIZE, PDF_MAGIC};
use crate::errors::{Error, Result, ValidationError};

/// Location and size of a document written by [`FileStager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub storage_path: String,
    pub size: u64,
}

/// Checks an upload before any encryption or disk work happens.
pub fn validate_cas_upload(bytes: &[u8], file_name: &str, content_type: Option<&str>) -> Result<()> {
    if file_name.trim().is_empty() {
        return Err(ValidationError::MissingField("fileName".to_string()).into());
    }
    if bytes.is_empty() {
        return Err(ValidationError::InvalidInput("CAS file is empty".to_string()).into());
    }
    if bytes.len() > MAX_CAS_FILE_SIZE {
        return Err(ValidationError::FileTooLarge {
            size: bytes.len(),
            max: MAX_CAS_FILE_SIZE,
        }
        .into());
    }

    let has_pdf_extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CAS_FILE_EXTENSION));
    if !has_pdf_extension {
        return Err(ValidationError::UnsupportedFileType(format!(
            "'{}' is not a PDF document",
            file_name
        ))
        .into());
    }

    if let Some(content_type) = content_type {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        if !essence.is_empty()
            && !essence.eq_ignore_ascii_case(CAS_CONTENT_TYPE)
            && !essence.eq_ignore_ascii_case("application/octet-stream")
        {
            return Err(ValidationError::UnsupportedFileType(format!(
                "content type '{}' is not accepted, expected {}",
                essence, CAS_CONTENT_TYPE
            ))
            .into());
        }
    }

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ValidationError::UnsupportedFileType(
            "file content is not a PDF document".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim_matches('.').is_empty() {
        "cas.pdf".to_string()
    } else {
        sanitized
    }
}

/// Writes CAS documents under a single root directory.
///
/// Storage paths handed out and accepted by this type are bare file names,
/// always resolved inside the root.
#[derive(Debug, Clone)]
pub struct FileStager {
    root: PathBuf,
}

impl FileStager {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::Io(format!(
                "Failed to create CAS storage directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored document.
    pub fn resolve(&self, storage_path: &str) -> Result<PathBuf> {
        let file_name = Path::new(storage_path)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| *n == storage_path)
            .ok_or_else(|| Error::Io(format!("Invalid CAS storage path '{}'", storage_path)))?;
        Ok(self.root.join(file_name))
    }

    pub fn store(&self, client_id: &str, bytes: &[u8], original_name: &str) -> Result<StagedFile> {
        let client = sanitize_file_name(client_id);
        let name = sanitize_file_name(original_name);
        let mut stamp = Utc::now().timestamp_millis();
        let (storage_path, target) = loop {
            let candidate = format!("{}_{}_{}", client, stamp, name);
            let target = self.resolve(&candidate)?;
            if !target.exists() {
                break (candidate, target);
            }
            stamp += 1;
        };
        fs::write(&target, bytes).map_err(|e| {
            Error::Io(format!("Failed to write CAS file {}: {}", target.display(), e))
        })?;
        debug!("Stored CAS file {} ({} bytes)", storage_path, bytes.len());
        Ok(StagedFile {
            storage_path,
            size: bytes.len() as u64,
        })
    }

    /// Swaps the stored document for a new one.
    ///
    /// The new file is written first and handed to `commit`. The prior file is
    /// removed only once `commit` succeeds; otherwise the new file is removed
    /// and the prior one is left in place.
    pub async fn replace<F, Fut, T>(
        &self,
        existing_path: Option<&str>,
        client_id: &str,
        bytes: &[u8],
        original_name: &str,
        commit: F,
    ) -> Result<T>
    where
        F: FnOnce(StagedFile) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let staged = self.store(client_id, bytes, original_name)?;
        let new_path = staged.storage_path.clone();

        match commit(staged).await {
            Ok(value) => {
                if let Some(existing) = existing_path {
                    if let Err(e) = self.delete(existing) {
                        warn!("Failed to remove replaced CAS file {}: {}", existing, e);
                    }
                }
                Ok(value)
            }
            Err(e) => {
                if let Err(cleanup) = self.delete(&new_path) {
                    warn!(
                        "Failed to remove unreferenced CAS file {}: {}",
                        new_path, cleanup
                    );
                }
                Err(e)
            }
        }
    }

    /// Deletes a stored document. A missing file is not an error.
    pub fn delete(&self, storage_path: &str) -> Result<()> {
        let target = self.resolve(storage_path)?;
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!("Deleted CAS file {}", storage_path);
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                warn!("CAS file {} was already absent", storage_path);
                Ok(())
            }
            Err(e) => Err(Error::Io(format!(
                "Failed to delete CAS file {}: {}",
                target.display(),
                e
            ))),
        }
    }

    pub fn exists(&self, storage_path: &str) -> bool {
        self.resolve(storage_path)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }
}
