use thiserror::Error;

/// Caller errors raised while interpreting request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("unknown target format: {0}")]
    UnknownTargetFormat(String),
    #[error("unknown canonical field: {0}")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
