use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Directory holding uploaded CAS documents.
    pub cas_storage_dir: PathBuf,
    /// Key for encrypting CAS passwords at rest. Password uploads fail without it.
    pub cas_encryption_key: Option<String>,
    pub cas_parser_cmd: String,
    pub cas_parser_args: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("ADV_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid ADV_LISTEN_ADDR")?;
        let db_path = std::env::var("ADV_DB_PATH").unwrap_or_else(|_| "./db/app.db".into());
        let cors_allow = std::env::var("ADV_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("ADV_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let cas_storage_dir = std::env::var("ADV_CAS_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cas_storage_dir(&db_path));
        let cas_encryption_key = std::env::var("ADV_CAS_ENCRYPTION_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let cas_parser_cmd =
            std::env::var("ADV_CAS_PARSER_CMD").unwrap_or_else(|_| "casparser-json".into());
        let cas_parser_args = std::env::var("ADV_CAS_PARSER_ARGS")
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            cas_storage_dir,
            cas_encryption_key,
            cas_parser_cmd,
            cas_parser_args,
        })
    }
}

/// `cas/` next to the database file.
pub fn default_cas_storage_dir(db_path: &str) -> PathBuf {
    std::path::Path::new(db_path)
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("cas")
}
