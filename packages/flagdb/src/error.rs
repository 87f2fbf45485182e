//! Error types for flagdb stores

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlagError>;

#[derive(Error, Debug)]
pub enum FlagError {
    #[error("Key not found: {0}")]
    NotFound(i64),

    #[error("Invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidPayload { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File length is not a whole number of records.
    #[error("Corrupted file: {size} bytes is not a multiple of record size {record_size}")]
    Corrupted { size: u64, record_size: u64 },

    #[error("Operation not allowed in read-only mode")]
    ReadOnly,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FlagError {
    /// Stable identifier for the error kind, used by the CLI exit report
    pub fn code(&self) -> &'static str {
        match self {
            FlagError::NotFound(_) => "NOT_FOUND",
            FlagError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            FlagError::Io(_) => "IO_ERROR",
            FlagError::Json(_) => "CONFIG_PARSE_ERROR",
            FlagError::Corrupted { .. } => "CORRUPTED",
            FlagError::ReadOnly => "READ_ONLY_MODE",
            FlagError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// `NotFound` is an expected outcome, not a failure of the store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FlagError::NotFound(_))
    }
}
