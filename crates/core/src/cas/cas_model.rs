//! CAS domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ingestion status of a client's CAS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CasStatus {
    #[default]
    NotUploaded,
    Uploaded,
    Parsing,
    Parsed,
    Error,
}

impl CasStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasStatus::NotUploaded => "not_uploaded",
            CasStatus::Uploaded => "uploaded",
            CasStatus::Parsing => "parsing",
            CasStatus::Parsed => "parsed",
            CasStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for CasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A password encrypted at rest. The plaintext is never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSecret {
    pub ciphertext_hex: String,
    pub iv_hex: String,
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("iv_hex", &self.iv_hex)
            .finish_non_exhaustive()
    }
}

/// The staged CAS document. Replaced as a whole on every upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasFile {
    pub name: String,
    pub storage_path: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_password: Option<EncryptedSecret>,
}

/// Per-client CAS ingestion record, embedded in the client aggregate.
///
/// Fields are only changed through the transitions in `cas_state_machine`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasRecord {
    pub(crate) status: CasStatus,
    #[serde(default)]
    pub(crate) file: Option<CasFile>,
    #[serde(default)]
    pub(crate) parse_error: Option<String>,
    #[serde(default)]
    pub(crate) last_parsed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) parsed_data: Option<PortfolioSnapshot>,
}

impl CasRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CasStatus {
        self.status
    }

    pub fn file(&self) -> Option<&CasFile> {
        self.file.as_ref()
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn last_parsed_at(&self) -> Option<DateTime<Utc>> {
        self.last_parsed_at
    }

    pub fn parsed_data(&self) -> Option<&PortfolioSnapshot> {
        self.parsed_data.as_ref()
    }

    pub fn file_meta(&self) -> Option<CasFileMeta> {
        self.file.as_ref().map(CasFileMeta::from)
    }

    pub fn status_view(&self) -> CasStatusView {
        CasStatusView {
            status: self.status,
            parse_error: self.parse_error.clone(),
            last_parsed_at: self.last_parsed_at,
            file_meta: self.file_meta(),
        }
    }

    pub fn data_view(&self) -> CasDataView {
        CasDataView {
            status: self.status_view(),
            parsed_data: self.parsed_data.clone(),
        }
    }
}

/// File metadata safe to return to callers (no storage path, no ciphertext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasFileMeta {
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub password_protected: bool,
}

impl From<&CasFile> for CasFileMeta {
    fn from(file: &CasFile) -> Self {
        Self {
            name: file.name.clone(),
            size: file.size,
            uploaded_at: file.uploaded_at,
            password_protected: file.encrypted_password.is_some(),
        }
    }
}

/// Lightweight view for listings and dashboards. Never includes parsed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasStatusView {
    pub status: CasStatus,
    pub parse_error: Option<String>,
    pub last_parsed_at: Option<DateTime<Utc>>,
    pub file_meta: Option<CasFileMeta>,
}

/// Full view of the record including the parsed snapshot.
///
/// `parsed_data` may be left over from an earlier successful parse while the
/// status is `Error`; only `status` says whether it is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasDataView {
    #[serde(flatten)]
    pub status: CasStatusView,
    pub parsed_data: Option<PortfolioSnapshot>,
}

/// Input for a CAS upload.
#[derive(Clone)]
pub struct CasUpload {
    pub client_id: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CasUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasUpload")
            .field("client_id", &self.client_id)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

/// Statement family the snapshot was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CasFormat {
    Nsdl,
    Cdsl,
    Cams,
    Kfintech,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Structured holdings extracted from a CAS document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub investor: InvestorInfo,
    #[serde(default)]
    pub demat_accounts: Vec<DematAccount>,
    #[serde(default)]
    pub mutual_funds: Vec<MutualFundHolding>,
    pub summary: SnapshotSummary,
    #[serde(default)]
    pub format: CasFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorInfo {
    pub name: String,
    #[serde(default)]
    pub identity_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DematAccount {
    /// Depository holding the account, e.g. `NSDL` or `CDSL`.
    pub depository: String,
    pub dp_id: String,
    pub client_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub value: Decimal,
    #[serde(default)]
    pub holdings: Vec<DematHolding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DematHolding {
    pub isin: String,
    pub name: String,
    pub units: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualFundHolding {
    pub folio: String,
    pub amc: String,
    pub scheme: String,
    #[serde(default)]
    pub isin: Option<String>,
    pub units: Decimal,
    pub nav: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub total_value: Decimal,
    #[serde(default)]
    pub demat_value: Decimal,
    #[serde(default)]
    pub mutual_fund_value: Decimal,
    #[serde(default)]
    pub account_count: u32,
}
