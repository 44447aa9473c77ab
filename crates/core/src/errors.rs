//! Core error types for AdvisorDesk.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use serde::Serialize;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the application.
///
/// Every variant keeps the human-readable message as data; callers that need
/// to branch on the failure use [`Error::kind`] instead of matching on text.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Decryption(String),

    #[error("{0}")]
    Parser(#[from] ParserError),

    #[error("File storage failed: {0}")]
    Io(String),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Closed classification of [`Error`], used by the API layer for status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Config,
    Validation,
    NotFound,
    Conflict,
    Decryption,
    WrongPassword,
    CorruptFile,
    UnsupportedFormat,
    UnknownParserError,
    Io,
    Database,
    Unexpected,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Database(DatabaseError::NotFound(_)) => ErrorKind::NotFound,
            Error::Database(DatabaseError::UniqueViolation(_)) => ErrorKind::Conflict,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Decryption(_) => ErrorKind::Decryption,
            Error::Parser(e) => e.kind(),
            Error::Io(_) => ErrorKind::Io,
            Error::Database(_) => ErrorKind::Database,
            Error::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("File is too large: {size} bytes (maximum is {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
}

/// Classified failures reported by a parser gateway.
///
/// `WrongPassword` carries no detail so its message is always the same
/// user-facing text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Incorrect CAS password. Please check and try again.")]
    WrongPassword,

    #[error("The CAS file is corrupted or unreadable: {0}")]
    CorruptFile(String),

    #[error("Unsupported CAS format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse CAS: {0}")]
    Unknown(String),
}

impl ParserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParserError::WrongPassword => ErrorKind::WrongPassword,
            ParserError::CorruptFile(_) => ErrorKind::CorruptFile,
            ParserError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ParserError::Unknown(_) => ErrorKind::UnknownParserError,
        }
    }
}

// === From implementations for common error types ===

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
