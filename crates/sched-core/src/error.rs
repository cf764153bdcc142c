//! Error types for the conversion pipeline.

use sched_ingest::IngestError;
use sched_map::StoreError;
use sched_model::ModelError;
use thiserror::Error;

/// Errors returned to callers of the converter.
///
/// Malformed input is not among them for `convert`: that is reported as an
/// unsuccessful [`crate::ConversionResult`]. Store failures during a
/// conversion are logged and never surface here.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Unsupported file type or unknown target format in a request.
    #[error(transparent)]
    Request(#[from] ModelError),

    /// Input could not be parsed (structure analysis only).
    #[error("malformed input: {0}")]
    MalformedInput(#[from] IngestError),

    /// Cache maintenance failed.
    #[error("mapping store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to encode output document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for converter operations.
pub type Result<T> = std::result::Result<T, ConvertError>;
