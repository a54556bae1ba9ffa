//! Document error types
//!
//! Error taxonomy shared by loaders, decryption gateways and the cache-facing
//! service. Cache bookkeeping itself never fails: a refused `put` or an empty
//! eviction are boolean outcomes, not errors.

use thiserror::Error;

use super::types::DocumentType;
use crate::password::PatternError;

/// Unified document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Path does not exist (or is not a regular file) at load time
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No loader or decryption path handles this document
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Wrong or missing password for an encrypted document
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    /// Caller supplied a password for a document that is not encrypted
    #[error("Document is not encrypted: {0}")]
    NotEncrypted(String),

    /// Encryption scheme not recognized by the gateway
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// Underlying parsing library could not interpret the content
    #[error("Parse error: {0}")]
    ParseFailure(String),

    /// Document is not present in the cache
    #[error("Document not loaded: {0}")]
    NotLoaded(String),

    /// Loader was handed a document of another family
    #[error("Document handle mismatch: expected {expected}, found {found}")]
    HandleMismatch {
        expected: DocumentType,
        found: DocumentType,
    },

    /// Load did not finish in time
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Glob pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Blocking task failed to join
    #[error("Task error: {0}")]
    TaskError(String),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ParseFailure(err.to_string())
    }
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        DocumentError::ParseFailure(format!("invalid OOXML package: {}", err))
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        DocumentError::ParseFailure(format!("malformed XML part: {}", err))
    }
}

impl DocumentError {
    /// Stable machine-readable kind, used in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "file_not_found",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::InvalidPassword(_) => "invalid_password",
            Self::NotEncrypted(_) => "not_encrypted",
            Self::UnsupportedEncryption(_) => "unsupported_encryption",
            Self::ParseFailure(_) => "parse_failure",
            Self::NotLoaded(_) => "not_loaded",
            Self::HandleMismatch { .. } => "handle_mismatch",
            Self::Timeout(_) => "timeout",
            Self::Pattern(_) => "invalid_pattern",
            Self::IoError(_) => "io_error",
            Self::TaskError(_) => "task_error",
        }
    }
}
