//! Boundary to the document-parsing engine that turns a CAS into a snapshot.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::cas_model::PortfolioSnapshot;
use crate::errors::ParserError;

/// Exit codes understood by [`CommandParserGateway`].
pub const EXIT_WRONG_PASSWORD: i32 = 2;
pub const EXIT_CORRUPT_FILE: i32 = 3;
pub const EXIT_UNSUPPORTED_FORMAT: i32 = 4;

/// Extracts holdings from a stored CAS document.
///
/// Implementations may take seconds. Password failures must be reported as
/// [`ParserError::WrongPassword`] and nothing else.
#[async_trait]
pub trait ParserGatewayTrait: Send + Sync {
    async fn parse(
        &self,
        file_path: &Path,
        password: Option<&str>,
    ) -> std::result::Result<PortfolioSnapshot, ParserError>;
}

/// Runs an external parsing engine as a child process.
///
/// The command is invoked as `<program> <args...> <file>`, the password is
/// written to stdin and the snapshot is read as JSON from stdout.
#[derive(Debug, Clone)]
pub struct CommandParserGateway {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandParserGateway {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl ParserGatewayTrait for CommandParserGateway {
    async fn parse(
        &self,
        file_path: &Path,
        password: Option<&str>,
    ) -> std::result::Result<PortfolioSnapshot, ParserError> {
        debug!(
            "Running CAS parser {} on {}",
            self.program.display(),
            file_path.display()
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(file_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ParserError::Unknown(format!(
                    "could not start parser '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let secret = password.unwrap_or_default();
            if let Err(e) = stdin.write_all(secret.as_bytes()).await {
                // The engine may exit before reading stdin for unprotected files.
                warn!("CAS parser closed stdin early: {}", e);
            }
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ParserError::Unknown(format!("parser did not complete: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(classify_failure(output.status.code(), &stderr));
        }

        serde_json::from_slice::<PortfolioSnapshot>(&output.stdout)
            .map_err(|e| ParserError::Unknown(format!("parser returned unreadable output: {}", e)))
    }
}

/// Maps an unsuccessful engine run onto the parser error classes.
pub fn classify_failure(exit_code: Option<i32>, stderr: &str) -> ParserError {
    let detail = if stderr.is_empty() {
        match exit_code {
            Some(code) => format!("parser exited with status {}", code),
            None => "parser was terminated by a signal".to_string(),
        }
    } else {
        stderr.to_string()
    };

    match exit_code {
        Some(EXIT_WRONG_PASSWORD) => ParserError::WrongPassword,
        Some(EXIT_CORRUPT_FILE) => ParserError::CorruptFile(detail),
        Some(EXIT_UNSUPPORTED_FORMAT) => ParserError::UnsupportedFormat(detail),
        _ if stderr.to_ascii_lowercase().contains("password") => ParserError::WrongPassword,
        _ => ParserError::Unknown(detail),
    }
}
