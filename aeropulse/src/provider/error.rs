//! Error types for measurement providers.

use thiserror::Error;

/// Errors that can occur while fetching from a provider.
///
/// All variants are recoverable from the caller's point of view: the
/// Source Manager fails over to the other source and the sync engine
/// counts the failure and retries on its next cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP transport failure (connect, timeout, non-success status).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Snapshot file could not be read.
    #[error("snapshot I/O error: {0}")]
    Io(String),

    /// Snapshot file could not be parsed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotParseError),
}

/// Structural errors in a snapshot file.
///
/// Row-level problems (a garbled value, a missing timestamp) are not
/// errors - those rows are skipped with a warning. These variants mean
/// the file as a whole is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotParseError {
    /// The file is empty or has no header row.
    #[error("snapshot file has no header row")]
    MissingHeader,

    /// The header row lacks a required column.
    #[error("snapshot header is missing required column `{0}`")]
    MissingColumn(&'static str),
}
