//! Error types for the mapping stages and the mapping store.

use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to a mapping oracle.
///
/// These never leave the analyzer or the judge; both degrade to their local
/// rules instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("oracle request timed out")]
    Timeout,

    #[error("oracle returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error)
        }
    }
}

/// Failures reading or writing persisted mapping records.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("atomic write failed: could not rename {temp_path} to {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt mapping record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode mapping record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("mapping store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
