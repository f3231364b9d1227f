//! # Benchlog Error Types
//!
//! Every fallible operation of the event logger returns [`BenchlogError`].
//! Hook entry points never surface these to the host: they are caught at the
//! outermost level and masked by the acknowledgment. The report command
//! propagates them as ordinary CLI failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for all logger operations.
pub type BenchlogResult<T> = Result<T, BenchlogError>;

#[derive(Debug, Error)]
pub enum BenchlogError {
    /// E_INVALID_PAYLOAD - stdin did not hold a usable JSON document
    #[error("invalid hook payload: {reason}")]
    InvalidPayload {
        /// Parser message or read failure
        reason: String,
    },

    /// E_STORAGE_UNAVAILABLE - the reserved log directory could not be created
    #[error("log directory '{}' unavailable: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// E_APPEND_FAILED - opening or writing the session log failed
    #[error("failed to append to '{}': {source}", path.display())]
    AppendFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// E_INVALID_SESSION - identifier would resolve outside the log directory
    #[error("session id '{session_id}' cannot be used as a log file name")]
    InvalidSessionId { session_id: String },

    /// E_ENCODE - record serialization failed
    #[error("failed to encode event record: {0}")]
    Encode(#[from] serde_json::Error),

    /// E_CONFIG - configuration file unreadable or malformed
    #[error("invalid configuration '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// E_READ_FAILED - a session log or session list could not be read back
    #[error("failed to read '{}': {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchlogError {
    /// Builds a payload error from a message.
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        BenchlogError::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Stable identifier, used as a structured field in traces.
    pub fn error_code(&self) -> &'static str {
        match self {
            BenchlogError::InvalidPayload { .. } => "E_INVALID_PAYLOAD",
            BenchlogError::StorageUnavailable { .. } => "E_STORAGE_UNAVAILABLE",
            BenchlogError::AppendFailed { .. } => "E_APPEND_FAILED",
            BenchlogError::InvalidSessionId { .. } => "E_INVALID_SESSION",
            BenchlogError::Encode(_) => "E_ENCODE",
            BenchlogError::Config { .. } => "E_CONFIG",
            BenchlogError::ReadFailed { .. } => "E_READ_FAILED",
        }
    }
}
