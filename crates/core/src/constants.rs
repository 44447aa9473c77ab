/// Largest CAS document accepted for upload (10 MiB).
pub const MAX_CAS_FILE_SIZE: usize = 10 * 1024 * 1024;

/// The only document type accepted for CAS uploads.
pub const CAS_CONTENT_TYPE: &str = "application/pdf";

pub const CAS_FILE_EXTENSION: &str = "pdf";

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Length of the AES-256 key used by the credential vault.
pub const VAULT_KEY_LEN: usize = 32;

/// Length of the CBC initialisation vector.
pub const VAULT_IV_LEN: usize = 16;

pub const DECRYPTION_FAILED_MESSAGE: &str =
    "Failed to decrypt the stored CAS password. Please re-upload the CAS file with its password.";

pub const PARSE_INTERRUPTED_MESSAGE: &str =
    "CAS parsing was interrupted. Please request a new parse.";

pub const UNKNOWN_PARSE_FAILURE_MESSAGE: &str = "CAS parsing failed for an unknown reason.";

/// How many times a finished parse re-applies its outcome after a version conflict.
pub const PARSE_OUTCOME_SAVE_ATTEMPTS: usize = 3;
