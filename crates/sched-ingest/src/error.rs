//! Error types for schedule ingestion.

use thiserror::Error;

/// Errors raised while turning raw content into a [`sched_model::ParsedInput`].
///
/// All of these describe malformed input; the converter reports them as an
/// unsuccessful conversion rather than propagating them.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV content could not be tokenized.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// JSON content is not valid JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed but is not an object or an array of objects.
    #[error("unexpected JSON layout: {reason}")]
    JsonLayout { reason: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
