//! Error types for the Obsidian engine.

use crate::RecordId;
use thiserror::Error;

/// All possible errors from the Obsidian engine.
///
/// Parsing and evaluation never fail; only the I/O boundaries (loading a
/// snapshot, writing to the remote store) produce these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Load errors
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("malformed record at row {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    // Lookup errors
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    // Apply errors
    #[error("write failed for record {id}: {cause}")]
    WriteError { id: RecordId, cause: String },
}

impl Error {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Error::RecordNotFound(_) => ErrorKind::NotFound,
            Error::WriteError { .. } => ErrorKind::WriteError,
        }
    }

    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}

/// Error kind without payload, as reported in sync failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    SourceUnavailable,
    MalformedRecord,
    NotFound,
    WriteError,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
